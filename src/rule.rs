//! Rule declarations: pattern + action + transition
//!
//! A state is an ordered list of rule declarations. Each declaration pairs
//! a pattern source with an action (what to emit) and a transition (where
//! the state stack goes next). Declaration order is load-bearing: the
//! engine applies the first rule that matches at the cursor, so more
//! specific patterns must be declared before general ones.
//!
//! Besides plain match rules a state may `include` another state's rules
//! (flattened once at table construction) and may declare one `fallback`
//! transition that fires when nothing matches, consuming no input.

use crate::context::Context;
use crate::fragment::Fragment;
use crate::kind::TokenKind;
use crate::table::StateTable;
use std::collections::VecDeque;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// State-stack transition attached to a rule or a state's fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Leave the stack alone.
    None,
    /// Push one or more states, left to right.
    Push(Vec<String>),
    /// Push the current state again (nested constructs such as `(: (: :) :)`
    /// comments).
    PushAgain,
    /// Pop `n` states (`n >= 1`). Popping past the bottom stops at the
    /// root entry.
    Pop(usize),
    /// Replace the entire stack.
    Replace(Vec<String>),
}

impl Transition {
    pub fn push(name: &str) -> Self {
        Transition::Push(vec![name.to_string()])
    }

    pub fn push_all<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Transition::Push(names.into_iter().map(str::to_string).collect())
    }

    pub fn pop(n: usize) -> Self {
        Transition::Pop(n.max(1))
    }

    pub fn replace<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Transition::Replace(names.into_iter().map(str::to_string).collect())
    }
}

/// Per-capture-group action used by [`Action::ByGroups`].
#[derive(Clone)]
pub enum GroupOp {
    /// Emit the group's text under this kind.
    Emit(TokenKind),
    /// Emit nothing for this group (used for an outer group whose text is
    /// already covered by inner groups).
    Skip,
    /// Re-tokenize the group's text with a nested table and splice the
    /// offset-corrected fragments in.
    Using(Arc<StateTable>),
}

impl GroupOp {
    pub fn using(table: &Arc<StateTable>) -> Self {
        GroupOp::Using(Arc::clone(table))
    }
}

impl fmt::Debug for GroupOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupOp::Emit(kind) => write!(f, "Emit({kind})"),
            GroupOp::Skip => write!(f, "Skip"),
            GroupOp::Using(_) => write!(f, "Using(..)"),
        }
    }
}

/// A callback rule's body. Invoked with a scope giving access to the match
/// and the run's context; see [`CallbackScope`] for the contract.
pub type CallbackFn = Arc<dyn Fn(&mut CallbackScope<'_, '_>) + Send + Sync>;

/// What a matched rule does.
#[derive(Clone)]
pub enum Action {
    /// Emit the whole match as one fragment of this kind.
    Emit(TokenKind),
    /// Emit one fragment per capture group, in group order. The groups
    /// must tile the whole match; group count is checked at table
    /// construction.
    ByGroups(Vec<GroupOp>),
    /// Hand the matched substring to a nested table and splice its
    /// fragments in with offsets shifted by the match start.
    Delegate(Arc<StateTable>),
    /// Escape hatch: the callback owns emission, the cursor, and both
    /// stacks.
    Callback(CallbackFn),
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Emit(kind) => write!(f, "Emit({kind})"),
            Action::ByGroups(ops) => write!(f, "ByGroups({ops:?})"),
            Action::Delegate(_) => write!(f, "Delegate(..)"),
            Action::Callback(_) => write!(f, "Callback(..)"),
        }
    }
}

/// One entry in a state's declaration list.
#[derive(Debug, Clone)]
pub enum RuleDecl {
    /// Ordinary pattern rule.
    Match {
        pattern: String,
        action: Action,
        transition: Transition,
    },
    /// Splice another state's rules in at this position (flattened at
    /// table construction).
    Include(String),
    /// Fallback transition taken when no rule in the state matches,
    /// without consuming input. At most one per state.
    Fallback(Transition),
}

/// Emit the whole match as `kind`.
pub fn rule(pattern: &str, kind: TokenKind) -> RuleDecl {
    rule_to(pattern, kind, Transition::None)
}

/// Emit the whole match as `kind`, then apply `transition`.
pub fn rule_to(pattern: &str, kind: TokenKind, transition: Transition) -> RuleDecl {
    RuleDecl::Match {
        pattern: pattern.to_string(),
        action: Action::Emit(kind),
        transition,
    }
}

/// Emit one fragment per capture group.
pub fn groups(pattern: &str, ops: Vec<GroupOp>) -> RuleDecl {
    groups_to(pattern, ops, Transition::None)
}

/// Emit one fragment per capture group, then apply `transition`.
pub fn groups_to(pattern: &str, ops: Vec<GroupOp>, transition: Transition) -> RuleDecl {
    RuleDecl::Match {
        pattern: pattern.to_string(),
        action: Action::ByGroups(ops),
        transition,
    }
}

/// Re-tokenize the whole match with a nested table.
pub fn delegate(pattern: &str, table: &Arc<StateTable>) -> RuleDecl {
    delegate_to(pattern, table, Transition::None)
}

/// Re-tokenize the whole match with a nested table, then apply
/// `transition` to the outer stack.
pub fn delegate_to(pattern: &str, table: &Arc<StateTable>, transition: Transition) -> RuleDecl {
    RuleDecl::Match {
        pattern: pattern.to_string(),
        action: Action::Delegate(Arc::clone(table)),
        transition,
    }
}

/// Run `f` on every match of `pattern`; the callback owns emission and the
/// context.
pub fn callback<F>(pattern: &str, f: F) -> RuleDecl
where
    F: Fn(&mut CallbackScope<'_, '_>) + Send + Sync + 'static,
{
    RuleDecl::Match {
        pattern: pattern.to_string(),
        action: Action::Callback(Arc::new(f)),
        transition: Transition::None,
    }
}

/// Like [`callback`], with a declared transition applied after the
/// callback returns.
pub fn callback_to<F>(pattern: &str, f: F, transition: Transition) -> RuleDecl
where
    F: Fn(&mut CallbackScope<'_, '_>) + Send + Sync + 'static,
{
    RuleDecl::Match {
        pattern: pattern.to_string(),
        action: Action::Callback(Arc::new(f)),
        transition,
    }
}

/// Splice the named state's rules in at this position.
pub fn include(state: &str) -> RuleDecl {
    RuleDecl::Include(state.to_string())
}

/// Declare the state's fallback transition.
pub fn fallback(transition: Transition) -> RuleDecl {
    RuleDecl::Fallback(transition)
}

/// The view a callback gets of its match and the run.
///
/// Contract: emitted fragments must be non-decreasing in start offset and
/// must tile the consumed span; the cursor may only move to offsets at or
/// after the match start. A callback that never calls [`set_pos`] has the
/// cursor advanced to the match end by the engine.
///
/// [`set_pos`]: CallbackScope::set_pos
pub struct CallbackScope<'a, 'r> {
    input: &'a str,
    caps: &'r regex::Captures<'a>,
    ctx: &'r mut Context,
    out: &'r mut VecDeque<Fragment<'a>>,
    pos_set: bool,
    last_emit: usize,
}

impl<'a, 'r> CallbackScope<'a, 'r> {
    pub(crate) fn new(
        input: &'a str,
        caps: &'r regex::Captures<'a>,
        ctx: &'r mut Context,
        out: &'r mut VecDeque<Fragment<'a>>,
    ) -> Self {
        let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
        Self {
            input,
            caps,
            ctx,
            out,
            pos_set: false,
            last_emit: start,
        }
    }

    pub(crate) fn pos_was_set(&self) -> bool {
        self.pos_set
    }

    /// Byte offset where the match starts.
    pub fn start(&self) -> usize {
        self.caps.get(0).map(|m| m.start()).unwrap_or(0)
    }

    /// Byte offset one past the match end.
    pub fn end(&self) -> usize {
        self.caps.get(0).map(|m| m.end()).unwrap_or(0)
    }

    /// The full matched text.
    pub fn text(&self) -> &'a str {
        self.caps.get(0).map(|m| m.as_str()).unwrap_or("")
    }

    /// Text of capture group `i` (1-based, as in the pattern), if it
    /// participated in the match.
    pub fn group(&self, i: usize) -> Option<&'a str> {
        self.caps.get(i).map(|m| m.as_str())
    }

    /// Byte span of capture group `i`, if it participated in the match.
    pub fn group_span(&self, i: usize) -> Option<Range<usize>> {
        self.caps.get(i).map(|m| m.range())
    }

    /// Emit a fragment covering `span` of the input.
    pub fn emit(&mut self, kind: TokenKind, span: Range<usize>) {
        debug_assert!(span.start >= self.last_emit, "emission order went backwards");
        self.last_emit = span.start;
        self.out
            .push_back(Fragment::new(span.start, kind, &self.input[span]));
    }

    /// Emit capture group `i` as one fragment. Absent or empty groups emit
    /// nothing.
    pub fn emit_group(&mut self, kind: TokenKind, i: usize) {
        if let Some(span) = self.group_span(i) {
            if !span.is_empty() {
                self.emit(kind, span);
            }
        }
    }

    /// Emit the whole match as one fragment.
    pub fn emit_match(&mut self, kind: TokenKind) {
        let span = self.start()..self.end();
        if !span.is_empty() {
            self.emit(kind, span);
        }
    }

    /// Current cursor position.
    pub fn pos(&self) -> usize {
        self.ctx.pos()
    }

    /// Move the cursor. `pos` must be at or after the match start.
    pub fn set_pos(&mut self, pos: usize) {
        debug_assert!(pos >= self.start(), "callback moved cursor before the match");
        self.ctx.set_pos(pos);
        self.pos_set = true;
    }

    /// Name of the current state.
    pub fn state(&self) -> &str {
        self.ctx.state()
    }

    pub fn push_state(&mut self, name: &str) {
        self.ctx.push_state(name);
    }

    pub fn pop_states(&mut self, n: usize) {
        self.ctx.pop_states(n);
    }

    pub fn replace_stack(&mut self, names: &[&str]) {
        self.ctx.replace_stack(names);
    }

    /// Push a mode name onto the auxiliary mode stack.
    pub fn push_mode(&mut self, name: &str) {
        self.ctx.push_mode(name);
    }

    /// Pop the auxiliary mode stack.
    pub fn pop_mode(&mut self) -> Option<String> {
        self.ctx.pop_mode()
    }

    /// The auxiliary mode stack, bottom first.
    pub fn modes(&self) -> &[String] {
        self.ctx.modes()
    }
}
