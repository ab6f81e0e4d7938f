//! Line-oriented indentation rules
//!
//! Indentation-sensitive markup replaces character patterns at line starts
//! with one measurement: how wide is the leading whitespace, and how does
//! that compare to the open blocks? [`line_rule`] packages that as a
//! callback rule for a table's `root` state. Open block levels are kept as
//! `indent:<width>` entries on the run's auxiliary mode stack, so the rule
//! is just the usual push/pop discipline keyed on indent depth instead of
//! bracket characters.
//!
//! Expected table shape (the line-content state returns to `root` on
//! `\n`):
//!
//! ```rust
//! use relex::{indent, rule, rule_to, TableBuilder, TokenKind, Transition};
//!
//! let table = TableBuilder::new()
//!     .state("root", vec![
//!         rule(r"[ \t]*\n", TokenKind::Whitespace),
//!         indent::line_rule("line"),
//!     ])
//!     .state("line", vec![
//!         rule_to(r"\n", TokenKind::Whitespace, Transition::replace(["root"])),
//!         rule(r"[^\n]+", TokenKind::Text),
//!     ])
//!     .build();
//! ```

use crate::kind::TokenKind;
use crate::rule::{callback, RuleDecl};

const MODE_PREFIX: &str = "indent:";

/// Tab stop width used by [`measure`].
pub const TAB_WIDTH: usize = 8;

/// Display width of a run of leading whitespace: spaces count one column,
/// tabs advance to the next multiple of [`TAB_WIDTH`].
pub fn measure(ws: &str) -> usize {
    let mut col = 0;
    for ch in ws.chars() {
        match ch {
            '\t' => col = (col / TAB_WIDTH + 1) * TAB_WIDTH,
            _ => col += 1,
        }
    }
    col
}

/// Nesting depth recorded on a mode stack by [`line_rule`].
pub fn depth(modes: &[String]) -> usize {
    modes.iter().filter(|m| m.starts_with(MODE_PREFIX)).count()
}

fn top_level(modes: &[String]) -> Option<usize> {
    modes
        .last()
        .and_then(|m| m.strip_prefix(MODE_PREFIX))
        .and_then(|s| s.parse().ok())
}

/// A `root`-state rule that measures the current line's indentation,
/// emits it as `Whitespace`, closes blocks that the line dedents out of,
/// opens a block when it indents deeper, and enters `content_state` for
/// the rest of the line.
pub fn line_rule(content_state: &str) -> RuleDecl {
    let content_state = content_state.to_string();
    callback(r"[ \t]*", move |scope| {
        let width = measure(scope.text());
        scope.emit_match(TokenKind::Whitespace);

        // Close every block deeper than this line. Only our own entries
        // are popped; anything else on the mode stack stays put.
        loop {
            match top_level(scope.modes()) {
                Some(level) if level > width => {
                    scope.pop_mode();
                }
                _ => break,
            }
        }
        // Deeper than the innermost open block: a new block starts here.
        if width > top_level(scope.modes()).unwrap_or(0) {
            scope.push_mode(&format!("{MODE_PREFIX}{width}"));
        }
        scope.push_state(&content_state);
    })
}
