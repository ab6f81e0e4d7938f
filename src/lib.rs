//! # relex
//!
//! A regex-driven, state-stack tokenizer engine: an ordered table of
//! pattern rules per state, a push/pop stack of state names, and a lazy
//! stream of classified fragments that always covers the whole input.
//!
//! Language definitions are plain data: build a [`StateTable`] with
//! [`TableBuilder`], wrap it in a [`Lexer`], and pull [`Fragment`]s.
//!
//! ```rust
//! use relex::{rule, rule_to, Lexer, TableBuilder, TokenKind, Transition};
//!
//! let table = TableBuilder::new()
//!     .state("root", vec![
//!         rule_to(r#"""#, TokenKind::String, Transition::push("str")),
//!         rule(r"\s+", TokenKind::Whitespace),
//!         rule(r#"[^\s"]+"#, TokenKind::Text),
//!     ])
//!     .state("str", vec![
//!         rule_to(r#"""#, TokenKind::String, Transition::pop(1)),
//!         rule(r#"[^"]+"#, TokenKind::String),
//!     ])
//!     .build()
//!     .unwrap();
//!
//! let lexer = Lexer::new(table);
//! let rebuilt: String = lexer.tokenize("say \"hi\"").map(|f| f.text).collect();
//! assert_eq!(rebuilt, "say \"hi\"");
//! ```
//!
//! Beyond plain rules the table supports per-capture-group emission
//! ([`groups`]), re-tokenizing a matched region with another table
//! ([`delegate`]), fallback transitions that fire when nothing matches
//! ([`fallback`]), and callback rules ([`callback`]) for grammars whose
//! transitions depend on more history than one stack can hold.

pub mod context;
pub mod engine;
pub mod fragment;
pub mod indent;
pub mod kind;
pub mod rule;
pub mod table;

pub use context::Context;
pub use engine::{Fragments, Lexer};
pub use fragment::Fragment;
pub use kind::TokenKind;
pub use rule::{
    callback, callback_to, delegate, delegate_to, fallback, groups, groups_to, include, rule,
    rule_to, Action, CallbackFn, CallbackScope, GroupOp, RuleDecl, Transition,
};
pub use table::{MatchFlags, StateTable, TableBuilder, TableError};
