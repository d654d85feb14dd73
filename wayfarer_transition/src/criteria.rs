// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Which transitions and states a hook applies to.
//!
//! A [`HookMatchCriteria`] holds an optional [`StateMatcher`] per path. The
//! `to` and `from` matchers only look at the last state of their path; the
//! others look at every node. An unset matcher (or [`StateMatcher::Any`])
//! accepts the whole path, even when it is empty. A set matcher must accept at
//! least one node, otherwise the hook does not apply.

use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

use wayfarer_state::{Glob, StateObject};

use crate::path::{PathNode, TreeChanges};
use crate::transition::Transition;
use crate::types::{HookScope, PathKind};

type Predicate = dyn Fn(&StateObject, &Transition) -> bool + Send + Sync;

/// Matches states by name or by predicate.
#[derive(Clone)]
pub enum StateMatcher {
    /// Every state.
    Any,
    /// States whose name matches a glob (exact names are globs too).
    Name(Glob),
    /// States the predicate accepts.
    Predicate(Arc<Predicate>),
}

impl fmt::Debug for StateMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Name(glob) => f.debug_tuple("Name").field(&glob.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl StateMatcher {
    /// Match names against `pattern`.
    pub fn name(pattern: impl Into<String>) -> Self {
        Self::Name(Glob::new(pattern))
    }

    /// Match with a predicate.
    pub fn predicate(f: impl Fn(&StateObject, &Transition) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    /// Whether `state` matches.
    pub fn matches(&self, state: &StateObject, transition: &Transition) -> bool {
        match self {
            Self::Any => true,
            Self::Name(glob) => glob.matches(state.name()),
            Self::Predicate(f) => f(state, transition),
        }
    }
}

impl From<&str> for StateMatcher {
    fn from(pattern: &str) -> Self {
        Self::name(pattern)
    }
}

impl From<String> for StateMatcher {
    fn from(pattern: String) -> Self {
        Self::name(pattern)
    }
}

/// Per-path matchers.
#[derive(Clone, Debug, Default)]
pub struct HookMatchCriteria {
    /// Target state.
    pub to: Option<StateMatcher>,
    /// Current state.
    pub from: Option<StateMatcher>,
    /// States being entered.
    pub entering: Option<StateMatcher>,
    /// States being exited.
    pub exiting: Option<StateMatcher>,
    /// States kept across the transition.
    pub retained: Option<StateMatcher>,
}

impl HookMatchCriteria {
    /// Criteria that accept every transition.
    pub fn any() -> Self {
        Self::default()
    }

    /// Set the `to` matcher.
    pub fn to(mut self, matcher: impl Into<StateMatcher>) -> Self {
        self.to = Some(matcher.into());
        self
    }

    /// Set the `from` matcher.
    pub fn from(mut self, matcher: impl Into<StateMatcher>) -> Self {
        self.from = Some(matcher.into());
        self
    }

    /// Set the `entering` matcher.
    pub fn entering(mut self, matcher: impl Into<StateMatcher>) -> Self {
        self.entering = Some(matcher.into());
        self
    }

    /// Set the `exiting` matcher.
    pub fn exiting(mut self, matcher: impl Into<StateMatcher>) -> Self {
        self.exiting = Some(matcher.into());
        self
    }

    /// Set the `retained` matcher.
    pub fn retained(mut self, matcher: impl Into<StateMatcher>) -> Self {
        self.retained = Some(matcher.into());
        self
    }

    /// The matcher for one path.
    pub fn matcher(&self, kind: PathKind) -> Option<&StateMatcher> {
        match kind {
            PathKind::To => self.to.as_ref(),
            PathKind::From => self.from.as_ref(),
            PathKind::Entering => self.entering.as_ref(),
            PathKind::Exiting => self.exiting.as_ref(),
            PathKind::Retained => self.retained.as_ref(),
        }
    }

    /// Match against `changes`, returning the accepted nodes of every path,
    /// or `None` if some set matcher accepts nothing.
    pub fn matches(&self, changes: &TreeChanges, transition: &Transition) -> Option<MatchedNodes> {
        let mut nodes = BTreeMap::new();
        for kind in PathKind::ALL {
            let path = changes.path(kind);
            let candidates = match kind.scope() {
                HookScope::Transition => path.last().into_iter().cloned().collect::<Vec<_>>(),
                HookScope::State => path.to_vec(),
            };
            let accepted = match self.matcher(kind) {
                None | Some(StateMatcher::Any) => candidates,
                Some(matcher) => {
                    let hits: Vec<PathNode> = candidates
                        .into_iter()
                        .filter(|n| matcher.matches(&n.state, transition))
                        .collect();
                    if hits.is_empty() {
                        return None;
                    }
                    hits
                }
            };
            nodes.insert(kind, accepted);
        }
        Some(MatchedNodes(nodes))
    }
}

/// Nodes accepted by a criteria match, per path.
#[derive(Clone, Debug, Default)]
pub struct MatchedNodes(BTreeMap<PathKind, Vec<PathNode>>);

impl MatchedNodes {
    /// Accepted nodes of one path.
    pub fn nodes(&self, kind: PathKind) -> &[PathNode] {
        self.0.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }
}
