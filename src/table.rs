//! State table construction and validation
//!
//! A [`TableBuilder`] collects named sub-patterns, table-level matching
//! flags, and ordered states of rule declarations, then [`build`]s them
//! into an immutable [`StateTable`]: sub-pattern references are expanded,
//! `include`s are flattened in declaration order, every pattern is
//! compiled once, and the configuration is validated. Anything malformed
//! is rejected here; a built table never fails mid-run.
//!
//! [`build`]: TableBuilder::build

use crate::rule::{Action, RuleDecl, Transition};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Table-level matching flags, applied to every pattern in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchFlags {
    /// Letters match case-insensitively.
    pub case_insensitive: bool,
    /// `.` also matches line breaks.
    pub dot_matches_new_line: bool,
    /// `^`/`$` match at line boundaries, not just input boundaries.
    pub multi_line: bool,
    /// Unicode-aware character classes and case folding.
    pub unicode: bool,
}

impl Default for MatchFlags {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            dot_matches_new_line: false,
            multi_line: false,
            unicode: true,
        }
    }
}

/// Configuration defect found while building a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A pattern failed to compile.
    Pattern {
        state: String,
        pattern: String,
        message: String,
    },
    /// A transition or include references a state the table does not
    /// define.
    UnknownState { state: String, target: String },
    /// No `root` state was declared.
    MissingRoot,
    /// The same state was declared twice.
    DuplicateState(String),
    /// `include` chains form a cycle.
    IncludeCycle(String),
    /// A state declared more than one fallback transition.
    DuplicateFallback(String),
    /// A `%{name}` reference names an undefined sub-pattern.
    UnknownSubPattern { state: String, name: String },
    /// Sub-pattern references never stop expanding.
    SubPatternCycle { state: String, pattern: String },
    /// A by-groups action's kind list does not match the pattern's
    /// capture-group count.
    GroupCountMismatch {
        state: String,
        pattern: String,
        groups: usize,
        ops: usize,
    },
    /// A pop transition with count zero.
    ZeroPop { state: String },
    /// Fallback transitions cycle through states that can never consume
    /// input.
    FallbackLoop(String),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::Pattern {
                state,
                pattern,
                message,
            } => write!(
                f,
                "invalid pattern {pattern:?} in state {state:?}: {message}"
            ),
            TableError::UnknownState { state, target } => {
                write!(f, "state {state:?} references unknown state {target:?}")
            }
            TableError::MissingRoot => write!(f, "table has no \"root\" state"),
            TableError::DuplicateState(name) => {
                write!(f, "state {name:?} declared more than once")
            }
            TableError::IncludeCycle(name) => {
                write!(f, "include cycle through state {name:?}")
            }
            TableError::DuplicateFallback(name) => {
                write!(f, "state {name:?} declares more than one fallback")
            }
            TableError::UnknownSubPattern { state, name } => {
                write!(f, "state {state:?} references unknown sub-pattern %{{{name}}}")
            }
            TableError::SubPatternCycle { state, pattern } => write!(
                f,
                "sub-pattern expansion does not terminate for {pattern:?} in state {state:?}"
            ),
            TableError::GroupCountMismatch {
                state,
                pattern,
                groups,
                ops,
            } => write!(
                f,
                "pattern {pattern:?} in state {state:?} has {groups} capture groups but {ops} group actions"
            ),
            TableError::ZeroPop { state } => {
                write!(f, "state {state:?} declares pop(0); pop count must be at least 1")
            }
            TableError::FallbackLoop(name) => write!(
                f,
                "fallback transitions loop without consuming input (via state {name:?})"
            ),
        }
    }
}

impl std::error::Error for TableError {}

/// A compiled rule: pattern anchored to the cursor, action, transition.
pub(crate) struct Rule {
    regex: Regex,
    action: Action,
    transition: Transition,
}

impl Rule {
    /// Match this rule at exactly `pos`. `^`/`$` keep whole-input
    /// semantics because matching runs over the full haystack with a
    /// start-position check rather than over a slice.
    pub(crate) fn match_at<'h>(&self, haystack: &'h str, pos: usize) -> Option<regex::Captures<'h>> {
        let caps = self.regex.captures_at(haystack, pos)?;
        if caps.get(0)?.start() != pos {
            return None;
        }
        Some(caps)
    }

    pub(crate) fn action(&self) -> &Action {
        &self.action
    }

    pub(crate) fn transition(&self) -> &Transition {
        &self.transition
    }

    /// Whether a zero-width match of this rule can still make progress.
    pub(crate) fn allows_empty(&self) -> bool {
        !matches!(self.transition, Transition::None)
            || matches!(self.action, Action::Callback(_))
    }
}

pub(crate) struct State {
    rules: Vec<Rule>,
    fallback: Option<Transition>,
}

impl State {
    pub(crate) fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub(crate) fn fallback(&self) -> Option<&Transition> {
        self.fallback.as_ref()
    }
}

/// An immutable, validated mapping from state name to compiled rules.
///
/// Built once, then shared freely (wrap in [`Arc`]) across any number of
/// concurrent runs; all per-run state lives in the run's context.
pub struct StateTable {
    states: HashMap<String, State>,
}

impl StateTable {
    pub(crate) fn state(&self, name: &str) -> Option<&State> {
        self.states.get(name)
    }

    /// Number of states in the table.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Declared state names, sorted.
    pub fn state_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.states.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for StateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateTable")
            .field("states", &self.state_names())
            .finish()
    }
}

static SUBPATTERN_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Expansion passes before a sub-pattern reference chain is declared
/// cyclic.
const MAX_SUBPATTERN_DEPTH: usize = 16;

/// Builder for a [`StateTable`].
///
/// States are declared in order with [`state`]; reusable pattern pieces
/// are declared with [`pattern`] and referenced as `%{name}` inside rule
/// patterns.
///
/// [`state`]: TableBuilder::state
/// [`pattern`]: TableBuilder::pattern
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    flags: MatchFlags,
    subpatterns: Vec<(String, String)>,
    states: Vec<(String, Vec<RuleDecl>)>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the table-level matching flags.
    pub fn flags(mut self, flags: MatchFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Define a reusable sub-pattern, referenced as `%{name}` in rule
    /// patterns (and in other sub-patterns). Expansion happens once at
    /// build time.
    pub fn pattern(mut self, name: &str, source: &str) -> Self {
        self.subpatterns.push((name.to_string(), source.to_string()));
        self
    }

    /// Declare a state with its ordered rule list.
    pub fn state(mut self, name: &str, rules: Vec<RuleDecl>) -> Self {
        self.states.push((name.to_string(), rules));
        self
    }

    /// Expand, flatten, compile, and validate.
    pub fn build(self) -> Result<StateTable, TableError> {
        let mut declared: HashSet<&str> = HashSet::new();
        for (name, _) in &self.states {
            if !declared.insert(name.as_str()) {
                return Err(TableError::DuplicateState(name.clone()));
            }
        }
        if !declared.contains("root") {
            return Err(TableError::MissingRoot);
        }

        let subpatterns: HashMap<&str, &str> = self
            .subpatterns
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let decls: HashMap<&str, &[RuleDecl]> = self
            .states
            .iter()
            .map(|(name, rules)| (name.as_str(), rules.as_slice()))
            .collect();

        let mut states = HashMap::new();
        for (name, _) in &self.states {
            let mut flat = Vec::new();
            let mut fallback = None;
            let mut visiting = Vec::new();
            flatten_state(name, &decls, &mut visiting, &mut flat, &mut fallback)?;

            let mut rules = Vec::new();
            for (pattern, action, transition) in flat {
                validate_transition(name, &transition, &declared)?;
                let expanded = expand_subpatterns(name, &pattern, &subpatterns)?;
                let regex = compile_pattern(name, &pattern, &expanded, self.flags)?;
                if let Action::ByGroups(ops) = &action {
                    let groups = regex.captures_len() - 1;
                    if groups != ops.len() {
                        return Err(TableError::GroupCountMismatch {
                            state: name.clone(),
                            pattern,
                            groups,
                            ops: ops.len(),
                        });
                    }
                }
                rules.push(Rule {
                    regex,
                    action,
                    transition,
                });
            }
            if let Some(t) = &fallback {
                validate_transition(name, t, &declared)?;
            }
            states.insert(name.clone(), State { rules, fallback });
        }

        check_fallback_loops(&states)?;
        Ok(StateTable { states })
    }
}

/// Flatten one state's declarations, expanding includes depth-first in
/// declaration order. The first fallback encountered wins; two fallbacks
/// declared directly in one state are rejected.
fn flatten_state(
    name: &str,
    decls: &HashMap<&str, &[RuleDecl]>,
    visiting: &mut Vec<String>,
    out: &mut Vec<(String, Action, Transition)>,
    fallback: &mut Option<Transition>,
) -> Result<(), TableError> {
    if visiting.iter().any(|n| n == name) {
        return Err(TableError::IncludeCycle(name.to_string()));
    }
    let Some(rules) = decls.get(name) else {
        let from = visiting.last().cloned().unwrap_or_else(|| name.to_string());
        return Err(TableError::UnknownState {
            state: from,
            target: name.to_string(),
        });
    };
    visiting.push(name.to_string());
    let mut own_fallbacks = 0usize;
    for decl in *rules {
        match decl {
            RuleDecl::Match {
                pattern,
                action,
                transition,
            } => out.push((pattern.clone(), action.clone(), transition.clone())),
            RuleDecl::Include(target) => {
                flatten_state(target, decls, visiting, out, fallback)?;
            }
            RuleDecl::Fallback(t) => {
                own_fallbacks += 1;
                if own_fallbacks > 1 && visiting.len() == 1 {
                    return Err(TableError::DuplicateFallback(name.to_string()));
                }
                if fallback.is_none() {
                    *fallback = Some(t.clone());
                }
            }
        }
    }
    visiting.pop();
    Ok(())
}

fn validate_transition(
    state: &str,
    transition: &Transition,
    declared: &HashSet<&str>,
) -> Result<(), TableError> {
    let targets: &[String] = match transition {
        Transition::Push(names) | Transition::Replace(names) => names,
        Transition::Pop(0) => {
            return Err(TableError::ZeroPop {
                state: state.to_string(),
            })
        }
        _ => return Ok(()),
    };
    for target in targets {
        if !declared.contains(target.as_str()) {
            return Err(TableError::UnknownState {
                state: state.to_string(),
                target: target.clone(),
            });
        }
    }
    Ok(())
}

fn expand_subpatterns(
    state: &str,
    pattern: &str,
    subpatterns: &HashMap<&str, &str>,
) -> Result<String, TableError> {
    let mut current = pattern.to_string();
    for _ in 0..MAX_SUBPATTERN_DEPTH {
        if !SUBPATTERN_REF.is_match(&current) {
            return Ok(current);
        }
        let mut unknown = None;
        let next = SUBPATTERN_REF
            .replace_all(&current, |caps: &regex::Captures| {
                let name = &caps[1];
                match subpatterns.get(name) {
                    Some(body) => format!("(?:{body})"),
                    None => {
                        unknown.get_or_insert_with(|| name.to_string());
                        String::new()
                    }
                }
            })
            .into_owned();
        if let Some(name) = unknown {
            return Err(TableError::UnknownSubPattern {
                state: state.to_string(),
                name,
            });
        }
        current = next;
    }
    Err(TableError::SubPatternCycle {
        state: state.to_string(),
        pattern: pattern.to_string(),
    })
}

fn compile_pattern(
    state: &str,
    original: &str,
    expanded: &str,
    flags: MatchFlags,
) -> Result<Regex, TableError> {
    RegexBuilder::new(expanded)
        .case_insensitive(flags.case_insensitive)
        .dot_matches_new_line(flags.dot_matches_new_line)
        .multi_line(flags.multi_line)
        .unicode(flags.unicode)
        .build()
        .map_err(|e| TableError::Pattern {
            state: state.to_string(),
            pattern: original.to_string(),
            message: e.to_string(),
        })
}

/// Reject fallback chains that provably never consume input: a cycle of
/// push/replace fallbacks through states that have no rules at all. A
/// self-push fallback on a rule-less state is the degenerate case.
/// Data-dependent stalls (rules exist but match nothing) are cut at run
/// time by the engine's retry bound.
fn check_fallback_loops(states: &HashMap<String, State>) -> Result<(), TableError> {
    // Edge: rule-less state -> state on top after its fallback fires.
    let mut edges: HashMap<&str, &str> = HashMap::new();
    for (name, state) in states {
        if !state.rules.is_empty() {
            continue;
        }
        match &state.fallback {
            Some(Transition::Push(names)) | Some(Transition::Replace(names)) => {
                if let Some(top) = names.last() {
                    edges.insert(name.as_str(), top.as_str());
                }
            }
            Some(Transition::PushAgain) => {
                return Err(TableError::FallbackLoop(name.clone()));
            }
            _ => {}
        }
    }
    for start in edges.keys() {
        let mut seen = HashSet::new();
        let mut cur = *start;
        while let Some(next) = edges.get(cur) {
            if !seen.insert(cur) {
                return Err(TableError::FallbackLoop(cur.to_string()));
            }
            cur = next;
        }
    }
    Ok(())
}
