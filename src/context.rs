//! Per-run tokenization context
//!
//! A `Context` is created fresh for every run and dropped when the run
//! ends; it never lives on the lexer itself, so concurrent or interleaved
//! runs over one shared table cannot corrupt each other.
//!
//! Two stacks live here. The state stack records nested lexical contexts
//! (bracketed regions, embedded languages) and is driven by rule
//! transitions. The mode stack is a second, callback-managed stack for
//! grammars whose "where do I return to" history cannot ride on the state
//! stack because push/pop there is already spoken for: the bracketed
//! sub-expression problem. Table-driven rules never touch the mode stack.

use crate::rule::Transition;

/// Mutable cursor and stack state for one tokenization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pos: usize,
    stack: Vec<String>,
    modes: Vec<String>,
}

impl Context {
    /// A fresh context positioned at the start of the input, with `root`
    /// as the only stack entry.
    pub(crate) fn new(root: &str) -> Self {
        Self {
            pos: 0,
            stack: vec![root.to_string()],
            modes: Vec::new(),
        }
    }

    /// Current cursor position (byte offset into the input).
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Name of the current state (top of the state stack).
    pub fn state(&self) -> &str {
        // The stack is never empty while a run is live.
        self.stack.last().map(String::as_str).unwrap_or("root")
    }

    /// Depth of the state stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn push_state(&mut self, name: &str) {
        self.stack.push(name.to_string());
    }

    /// Pop `n` states. Popping deeper than the stack truncates to the
    /// bottom (root) entry instead of underflowing.
    pub fn pop_states(&mut self, n: usize) {
        let keep = self.stack.len().saturating_sub(n).max(1);
        self.stack.truncate(keep);
    }

    /// Replace the entire state stack. An empty replacement resets to the
    /// current bottom entry.
    pub fn replace_stack(&mut self, names: &[&str]) {
        if names.is_empty() {
            self.stack.truncate(1);
        } else {
            self.stack = names.iter().map(|s| s.to_string()).collect();
        }
    }

    /// Drop everything above the bottom (root) entry.
    pub(crate) fn reset_to_root(&mut self) {
        self.stack.truncate(1);
    }

    /// Push a mode name onto the auxiliary mode stack.
    pub fn push_mode(&mut self, name: &str) {
        self.modes.push(name.to_string());
    }

    /// Pop the most recently pushed mode, if any.
    pub fn pop_mode(&mut self) -> Option<String> {
        self.modes.pop()
    }

    /// The auxiliary mode stack, bottom first.
    pub fn modes(&self) -> &[String] {
        &self.modes
    }

    /// Apply a table-declared transition.
    pub(crate) fn apply(&mut self, transition: &Transition) {
        match transition {
            Transition::None => {}
            Transition::Push(names) => {
                for name in names {
                    self.stack.push(name.clone());
                }
            }
            Transition::PushAgain => {
                let top = self.state().to_string();
                self.stack.push(top);
            }
            Transition::Pop(n) => self.pop_states(*n),
            Transition::Replace(names) => {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                self.replace_stack(&names);
            }
        }
    }
}
