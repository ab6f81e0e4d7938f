//! The driver loop
//!
//! [`Lexer::tokenize`] turns a state table plus an input into a lazy
//! stream of [`Fragment`]s. Per step: take the current state from the
//! context's stack, scan its rules in declaration order, and apply the
//! first one that matches at the cursor. First match wins, not longest
//! match, so tables order specific patterns before general ones. When
//! nothing matches, the state's fallback transition (if any) is applied
//! and the scan retried without consuming; otherwise one character is
//! emitted as `Error` and the cursor moves past it. The stream therefore
//! always covers the whole input and always terminates.
//!
//! Each call to `tokenize` builds a fresh context, so a `Lexer` can be
//! shared and re-run freely; a single `Fragments` iterator owns its
//! context exclusively.

use crate::context::Context;
use crate::fragment::Fragment;
use crate::kind::TokenKind;
use crate::rule::{Action, CallbackScope, GroupOp};
use crate::table::{Rule, StateTable};
use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::ops::Range;
use std::sync::Arc;

/// A tokenizer: an immutable state table ready to run over inputs.
#[derive(Debug, Clone)]
pub struct Lexer {
    table: Arc<StateTable>,
}

impl Lexer {
    pub fn new(table: StateTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    /// Build a lexer sharing an already-wrapped table (delegation targets
    /// are shared the same way).
    pub fn from_shared(table: Arc<StateTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &Arc<StateTable> {
        &self.table
    }

    /// Tokenize `input` lazily. Every call starts a fresh run with its own
    /// context; pulling fragments drives the engine, and dropping the
    /// iterator early is free.
    pub fn tokenize<'a>(&self, input: &'a str) -> Fragments<'a> {
        Fragments::new(Arc::clone(&self.table), input)
    }
}

/// Lazy fragment stream for one run. See [`Lexer::tokenize`].
pub struct Fragments<'a> {
    table: Arc<StateTable>,
    input: &'a str,
    ctx: Context,
    queue: VecDeque<Fragment<'a>>,
    stalls: usize,
}

impl<'a> Fragments<'a> {
    pub(crate) fn new(table: Arc<StateTable>, input: &'a str) -> Self {
        Self {
            table,
            input,
            ctx: Context::new("root"),
            queue: VecDeque::new(),
            stalls: 0,
        }
    }

    /// Consecutive no-consumption steps tolerated at one position before
    /// the engine forces progress with an `Error` fragment. Static
    /// fallback cycles are rejected at table construction; this bound
    /// cuts the data-dependent ones.
    fn stall_limit(&self) -> usize {
        self.table.state_count() * 2 + 8
    }

    fn refill(&mut self) {
        let table = Arc::clone(&self.table);
        while self.queue.is_empty() && self.ctx.pos() < self.input.len() {
            self.step(&table);
        }
    }

    fn step(&mut self, table: &StateTable) {
        let pos = self.ctx.pos();
        let state_name = self.ctx.state().to_string();
        let Some(state) = table.state(&state_name) else {
            // A callback pushed a name the table does not define; recover
            // the same way as stack underflow.
            self.ctx.reset_to_root();
            self.bump_stall(pos);
            return;
        };

        for rule in state.rules() {
            let Some(caps) = rule.match_at(self.input, pos) else {
                continue;
            };
            let Some(m0) = caps.get(0) else { continue };
            let span = m0.range();
            if span.is_empty() && !rule.allows_empty() {
                continue;
            }
            self.apply_rule(rule, &caps, span);
            return;
        }

        if let Some(transition) = state.fallback() {
            self.stalls += 1;
            if self.stalls > self.stall_limit() {
                self.emit_error_at(pos);
            } else {
                self.ctx.apply(transition);
            }
            return;
        }

        self.emit_error_at(pos);
    }

    fn apply_rule(&mut self, rule: &Rule, caps: &regex::Captures<'a>, span: Range<usize>) {
        let pos_before = span.start;
        match rule.action() {
            Action::Emit(kind) => {
                if !span.is_empty() {
                    self.queue
                        .push_back(Fragment::new(span.start, *kind, &self.input[span.clone()]));
                }
                self.ctx.set_pos(span.end);
                self.ctx.apply(rule.transition());
            }
            Action::ByGroups(ops) => {
                for (i, op) in ops.iter().enumerate() {
                    let Some(group) = caps.get(i + 1) else { continue };
                    if group.as_str().is_empty() {
                        continue;
                    }
                    match op {
                        GroupOp::Emit(kind) => self.queue.push_back(Fragment::new(
                            group.start(),
                            *kind,
                            group.as_str(),
                        )),
                        GroupOp::Skip => {}
                        GroupOp::Using(nested) => {
                            let nested = Arc::clone(nested);
                            self.splice(&nested, group.range());
                        }
                    }
                }
                self.ctx.set_pos(span.end);
                self.ctx.apply(rule.transition());
            }
            Action::Delegate(nested) => {
                let nested = Arc::clone(nested);
                self.splice(&nested, span.clone());
                self.ctx.set_pos(span.end);
                self.ctx.apply(rule.transition());
            }
            Action::Callback(f) => {
                let mut scope =
                    CallbackScope::new(self.input, caps, &mut self.ctx, &mut self.queue);
                f(&mut scope);
                let moved = scope.pos_was_set();
                if !moved {
                    // Callbacks that do not reposition get the ordinary
                    // advance to the match end.
                    self.ctx.set_pos(span.end);
                }
                debug_assert!(
                    self.ctx.pos() >= pos_before,
                    "callback left the cursor before the match start"
                );
                self.ctx.apply(rule.transition());
            }
        }

        if self.ctx.pos() > pos_before {
            self.stalls = 0;
        } else {
            self.bump_stall(self.ctx.pos());
        }
    }

    /// Run a nested table over `span` of the input and splice its
    /// fragments in, shifted by the span's start. The nested run gets its
    /// own context; this run's stack is untouched.
    fn splice(&mut self, table: &Arc<StateTable>, span: Range<usize>) {
        let base = span.start;
        let nested = Fragments::new(Arc::clone(table), &self.input[span]);
        for frag in nested {
            self.queue
                .push_back(Fragment::new(base + frag.start, frag.kind, frag.text));
        }
    }

    fn bump_stall(&mut self, pos: usize) {
        self.stalls += 1;
        if self.stalls > self.stall_limit() {
            self.emit_error_at(pos);
        }
    }

    /// Unrecognized input: emit exactly one character as `Error` and move
    /// past it, so tokenization always completes.
    fn emit_error_at(&mut self, pos: usize) {
        let len = self.input[pos..]
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(1);
        let end = pos + len;
        self.queue
            .push_back(Fragment::new(pos, TokenKind::Error, &self.input[pos..end]));
        self.ctx.set_pos(end);
        self.stalls = 0;
    }
}

impl<'a> Iterator for Fragments<'a> {
    type Item = Fragment<'a>;

    fn next(&mut self) -> Option<Fragment<'a>> {
        if self.queue.is_empty() {
            self.refill();
        }
        self.queue.pop_front()
    }
}

impl<'a> FusedIterator for Fragments<'a> {}
