// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred registration: declarations wait here until their parent is built.

use std::collections::BTreeMap;
use std::sync::Arc;

use wayfarer_params::ParamFactory;

use crate::builder::StateBuilder;
use crate::declaration::{StateDeclaration, parent_name};
use crate::error::StateError;
use crate::object::StateObject;

/// Result of one [`StateQueueManager::flush`].
#[derive(Debug, Default)]
pub struct Flushed {
    /// States built by this flush, parents before children.
    pub built: Vec<Arc<StateObject>>,
    /// Declarations whose build failed; they were removed from the queue.
    pub failed: Vec<(String, StateError)>,
}

/// Pending declarations plus the built state table.
#[derive(Debug)]
pub struct StateQueueManager {
    builder: StateBuilder,
    queue: Vec<StateDeclaration>,
    states: BTreeMap<String, Arc<StateObject>>,
}

impl StateQueueManager {
    /// A manager holding only the root state.
    pub fn new(builder: StateBuilder) -> Result<Self, StateError> {
        let root = Arc::new(builder.root()?);
        let mut states = BTreeMap::new();
        states.insert(String::new(), root);
        Ok(Self {
            builder,
            queue: Vec::new(),
            states,
        })
    }

    /// The builder used for every state.
    pub fn builder(&self) -> &StateBuilder {
        &self.builder
    }

    /// Built states by name.
    pub fn states(&self) -> &BTreeMap<String, Arc<StateObject>> {
        &self.states
    }

    /// Declarations waiting for a parent.
    pub fn queued(&self) -> &[StateDeclaration] {
        &self.queue
    }

    /// Whether `name` is built or queued.
    pub fn contains(&self, name: &str) -> bool {
        self.states.contains_key(name) || self.queue.iter().any(|d| d.name == name)
    }

    /// Validate and queue `decl`. Call [`flush`](Self::flush) to build it.
    pub fn enqueue(&mut self, decl: StateDeclaration) -> Result<(), StateError> {
        decl.parent_name()?;
        if self.contains(&decl.name) {
            return Err(StateError::DuplicateState(decl.name));
        }
        tracing::debug!(state = %decl.name, "queued state declaration");
        self.queue.push(decl);
        Ok(())
    }

    /// Build every queued declaration whose parent exists, repeating until a
    /// pass makes no progress. Entries still waiting stay queued.
    ///
    /// Calling this again without new declarations changes nothing.
    pub fn flush(&mut self, factory: &mut ParamFactory) -> Flushed {
        let mut flushed = Flushed::default();
        loop {
            let mut progressed = false;
            let mut i = 0;
            while i < self.queue.len() {
                let parent = parent_name(&self.queue[i].name)
                    .and_then(|p| self.states.get(p))
                    .cloned();
                let Some(parent) = parent else {
                    i += 1;
                    continue;
                };
                let decl = self.queue.remove(i);
                progressed = true;
                match self.builder.build(&decl, &parent, factory) {
                    Ok(state) => {
                        let state = Arc::new(state);
                        self.states.insert(decl.name, state.clone());
                        flushed.built.push(state);
                    }
                    Err(err) => {
                        tracing::warn!(state = %decl.name, %err, "state failed to build");
                        flushed.failed.push((decl.name, err));
                    }
                }
            }
            if !progressed {
                break;
            }
        }
        flushed
    }

    /// Queued declarations, reported as unresolved-parent errors.
    pub fn unresolved(&self) -> Vec<StateError> {
        self.queue
            .iter()
            .map(|d| StateError::UnresolvedParent {
                name: d.name.clone(),
                parent: parent_name(&d.name).unwrap_or_default().to_owned(),
            })
            .collect()
    }

    /// Remove `name` and its descendants, built or queued.
    ///
    /// Returns the removed built states, deepest first.
    pub(crate) fn remove_subtree(&mut self, name: &str) -> Vec<Arc<StateObject>> {
        let prefix = format!("{name}.");
        let in_subtree = |n: &str| n == name || n.starts_with(&prefix);
        self.queue.retain(|d| !in_subtree(d.name.as_str()));
        let doomed: Vec<String> = self
            .states
            .keys()
            .filter(|n| in_subtree(n.as_str()))
            .cloned()
            .collect();
        let mut removed: Vec<Arc<StateObject>> = doomed
            .iter()
            .filter_map(|n| self.states.remove(n))
            .collect();
        removed.sort_by_key(|s| core::cmp::Reverse(s.depth()));
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(states: &[Arc<StateObject>]) -> Vec<&str> {
        states.iter().map(|s| s.name()).collect()
    }

    #[test]
    fn children_wait_for_their_parent() {
        let mut m = StateQueueManager::new(StateBuilder::default()).expect("root builds");
        let mut f = ParamFactory::default();
        m.enqueue(StateDeclaration::new("a.b.c")).expect("valid");
        m.enqueue(StateDeclaration::new("a.b")).expect("valid");
        assert!(m.flush(&mut f).built.is_empty());
        assert_eq!(m.unresolved().len(), 2);

        m.enqueue(StateDeclaration::new("a")).expect("valid");
        let flushed = m.flush(&mut f);
        assert_eq!(names(&flushed.built), vec!["a", "a.b", "a.b.c"]);
        assert!(m.queued().is_empty());
        assert_eq!(m.states()["a.b.c"].parent(), Some("a.b"));

        let again = m.flush(&mut f);
        assert!(again.built.is_empty() && again.failed.is_empty());
    }

    #[test]
    fn duplicates_are_rejected_built_or_queued() {
        let mut m = StateQueueManager::new(StateBuilder::default()).expect("root builds");
        let mut f = ParamFactory::default();
        m.enqueue(StateDeclaration::new("x.y")).expect("valid");
        assert!(matches!(
            m.enqueue(StateDeclaration::new("x.y")),
            Err(StateError::DuplicateState(n)) if n == "x.y"
        ));
        m.enqueue(StateDeclaration::new("x")).expect("valid");
        m.flush(&mut f);
        assert!(matches!(
            m.enqueue(StateDeclaration::new("x")),
            Err(StateError::DuplicateState(_))
        ));
    }

    #[test]
    fn failed_builds_leave_the_queue() {
        let mut m = StateQueueManager::new(StateBuilder::default()).expect("root builds");
        let mut f = ParamFactory::default();
        m.enqueue(StateDeclaration::new("bad").url("/{oops")).expect("valid name");
        let flushed = m.flush(&mut f);
        assert_eq!(flushed.failed.len(), 1);
        assert!(!m.contains("bad"));
    }

    #[test]
    fn remove_subtree_is_a_prefix_operation() {
        let mut m = StateQueueManager::new(StateBuilder::default()).expect("root builds");
        let mut f = ParamFactory::default();
        for name in ["app", "app.a", "app.a.x", "apple", "app.z.w"] {
            m.enqueue(StateDeclaration::new(name)).expect("valid");
        }
        m.flush(&mut f);
        let removed = m.remove_subtree("app");
        assert_eq!(names(&removed), vec!["app.a.x", "app.a", "app"]);
        assert!(m.contains("apple"));
        assert!(!m.contains("app.z.w"));
    }
}
