// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! State paths and the minimal exit/enter diff between two of them.
//!
//! ## Usage
//!
//! Build a root→leaf path of [`PathNode`]s for the current location and for
//! the target, then call [`TreeChanges::compute`]. The common prefix (same
//! states, same non-dynamic own params) is retained; the rest of the old path
//! is exited inner→outer and the rest of the new path is entered outer→inner.

use std::sync::Arc;

use wayfarer_params::{Param, ParamValues};
use wayfarer_state::StateObject;

use crate::types::PathKind;

/// One state in a path together with the values of its own params.
#[derive(Clone, Debug)]
pub struct PathNode {
    /// The state.
    pub state: Arc<StateObject>,
    /// Values of `state.own_params()`, taken from the full param set.
    pub params: ParamValues,
}

impl PathNode {
    /// Node for `state`, picking its own params out of `all`.
    pub fn new(state: Arc<StateObject>, all: &ParamValues) -> Self {
        let params = state
            .own_params()
            .iter()
            .filter_map(|p| all.get(p.id()).map(|v| (p.id().to_owned(), v.clone())))
            .collect();
        Self { state, params }
    }

    /// State name.
    pub fn name(&self) -> &str {
        self.state.name()
    }

    /// Same state, and equal values for every non-dynamic own param.
    pub fn same_as(&self, other: &Self) -> bool {
        if self.state.name() != other.state.name() {
            return false;
        }
        let params: Vec<Param> = self.state.non_dynamic_params().cloned().collect();
        Param::values_equal(&params, &self.params, &other.params)
    }
}

/// Build the path root→`state` using `lookup` for ancestors.
pub fn build_path(
    state: &StateObject,
    params: &ParamValues,
    lookup: impl Fn(&str) -> Option<Arc<StateObject>>,
) -> Vec<PathNode> {
    state
        .path()
        .iter()
        .filter_map(|name| lookup(name))
        .map(|s| PathNode::new(s, params))
        .collect()
}

/// The diff between a `from` path and a `to` path.
#[derive(Clone, Debug, Default)]
pub struct TreeChanges {
    /// Current path, root first.
    pub from: Vec<PathNode>,
    /// Target path, root first.
    pub to: Vec<PathNode>,
    /// Common prefix, root first, with the target's param values.
    pub retained: Vec<PathNode>,
    /// Exited states, innermost first.
    pub exiting: Vec<PathNode>,
    /// Entered states, outermost first.
    pub entering: Vec<PathNode>,
}

impl TreeChanges {
    /// Diff `from` against `to`.
    ///
    /// `reload_at` caps the retained prefix: nodes at or below that index are
    /// exited and re-entered even when unchanged.
    pub fn compute(from: Vec<PathNode>, to: Vec<PathNode>, reload_at: Option<usize>) -> Self {
        let limit = reload_at.unwrap_or(usize::MAX);
        let mut keep = 0;
        while keep < from.len() && keep < to.len() && keep < limit && from[keep].same_as(&to[keep])
        {
            keep += 1;
        }
        let retained = to[..keep].to_vec();
        let exiting = from[keep..].iter().rev().cloned().collect();
        let entering = to[keep..].to_vec();
        Self {
            from,
            to,
            retained,
            exiting,
            entering,
        }
    }

    /// The nodes of one path.
    pub fn path(&self, kind: PathKind) -> &[PathNode] {
        match kind {
            PathKind::To => &self.to,
            PathKind::From => &self.from,
            PathKind::Exiting => &self.exiting,
            PathKind::Retained => &self.retained,
            PathKind::Entering => &self.entering,
        }
    }

    /// Target state; `None` only for an empty path.
    pub fn to_state(&self) -> Option<&Arc<StateObject>> {
        self.to.last().map(|n| &n.state)
    }

    /// Current state; `None` only for an empty path.
    pub fn from_state(&self) -> Option<&Arc<StateObject>> {
        self.from.last().map(|n| &n.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_params::{ParamDeclaration, ParamFactory, ParamValue, param_values};
    use wayfarer_state::{MatcherConfig, StateDeclaration, StateRegistry};

    fn registry() -> StateRegistry {
        let mut reg = StateRegistry::new(ParamFactory::default(), MatcherConfig::default())
            .expect("root builds");
        for decl in [
            StateDeclaration::new("x"),
            StateDeclaration::new("x.a"),
            StateDeclaration::new("x.b"),
            StateDeclaration::new("users").url("/users/{id:int}"),
            StateDeclaration::new("users.view")
                .url("/view?{q}")
                .param("q", ParamDeclaration::new().dynamic()),
        ] {
            reg.register(decl).expect("valid");
        }
        reg
    }

    fn path(reg: &StateRegistry, name: &str, params: &ParamValues) -> Vec<PathNode> {
        let state = reg.get(name).expect("registered");
        build_path(&state, params, |n| reg.get(n))
    }

    fn names(nodes: &[PathNode]) -> Vec<&str> {
        nodes.iter().map(PathNode::name).collect()
    }

    #[test]
    fn siblings_share_their_parent() {
        let reg = registry();
        let none = ParamValues::new();
        let c = TreeChanges::compute(path(&reg, "x.a", &none), path(&reg, "x.b", &none), None);
        assert_eq!(names(&c.retained), vec!["", "x"]);
        assert_eq!(names(&c.exiting), vec!["x.a"]);
        assert_eq!(names(&c.entering), vec!["x.b"]);
    }

    #[test]
    fn exiting_runs_inner_to_outer() {
        let reg = registry();
        let none = ParamValues::new();
        let from = path(&reg, "x.a", &none);
        let to = path(&reg, "users", &param_values([("id", ParamValue::Int(1))]));
        let c = TreeChanges::compute(from, to, None);
        assert_eq!(names(&c.retained), vec![""]);
        assert_eq!(names(&c.exiting), vec!["x.a", "x"]);
        assert_eq!(names(&c.entering), vec!["users"]);
    }

    #[test]
    fn changed_own_params_reenter_but_dynamic_ones_do_not() {
        let reg = registry();
        let one = param_values([("id", ParamValue::Int(1)), ("q", "a".into())]);
        let two = param_values([("id", ParamValue::Int(2)), ("q", "a".into())]);
        let c = TreeChanges::compute(
            path(&reg, "users.view", &one),
            path(&reg, "users.view", &two),
            None,
        );
        assert_eq!(names(&c.exiting), vec!["users.view", "users"]);
        assert_eq!(names(&c.entering), vec!["users", "users.view"]);

        let search = param_values([("id", ParamValue::Int(1)), ("q", "b".into())]);
        let c = TreeChanges::compute(
            path(&reg, "users.view", &one),
            path(&reg, "users.view", &search),
            None,
        );
        assert!(c.exiting.is_empty() && c.entering.is_empty());
        assert_eq!(c.retained[2].params["q"], ParamValue::from("b"));
    }

    #[test]
    fn reload_caps_the_retained_prefix() {
        let reg = registry();
        let none = ParamValues::new();
        let c = TreeChanges::compute(path(&reg, "x.a", &none), path(&reg, "x.a", &none), Some(1));
        assert_eq!(names(&c.retained), vec![""]);
        assert_eq!(names(&c.exiting), vec!["x.a", "x"]);
        assert_eq!(names(&c.entering), vec!["x", "x.a"]);
    }
}
