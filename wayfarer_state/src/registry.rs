// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The state registry: registration, lookup, routes, and change listeners.

use std::collections::BTreeMap;
use std::sync::Arc;

use wayfarer_params::{ParamFactory, ParamValues};

use crate::builder::StateBuilder;
use crate::declaration::{StateDeclaration, resolve_name, validate_name};
use crate::error::StateError;
use crate::object::StateObject;
use crate::queue_manager::{Flushed, StateQueueManager};
use crate::rules::{UrlMatch, UrlRules};
use crate::url::MatcherConfig;

/// What happened to the states passed to a listener.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RegistryEvent {
    /// The states were built and added.
    Registered,
    /// The states were removed.
    Deregistered,
}

/// Handle for removing a listener.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Box<dyn Fn(RegistryEvent, &[Arc<StateObject>]) + Send + Sync>;

/// Owns every built state, the pending queue, the param factory, and the route table.
pub struct StateRegistry {
    factory: ParamFactory,
    manager: StateQueueManager,
    root: Arc<StateObject>,
    rules: UrlRules,
    failed: BTreeMap<String, StateError>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl core::fmt::Debug for StateRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StateRegistry")
            .field("factory", &self.factory)
            .field("manager", &self.manager)
            .field("root", &self.root.name())
            .field("rules", &self.rules)
            .field("failed", &self.failed)
            .field("listeners", &self.listeners.len())
            .field("next_listener", &self.next_listener)
            .finish()
    }
}

impl StateRegistry {
    /// A registry holding only the implicit root.
    pub fn new(factory: ParamFactory, config: MatcherConfig) -> Result<Self, StateError> {
        let manager = StateQueueManager::new(StateBuilder::new(config))?;
        let root = manager
            .states()
            .get("")
            .cloned()
            .ok_or_else(|| StateError::NotFound(String::new()))?;
        Ok(Self {
            factory,
            manager,
            root,
            rules: UrlRules::new(),
            failed: BTreeMap::new(),
            listeners: Vec::new(),
            next_listener: 0,
        })
    }

    /// The param factory, and through it the type registry.
    pub fn param_factory(&self) -> &ParamFactory {
        &self.factory
    }

    /// Mutable access for registering param types.
    pub fn param_factory_mut(&mut self) -> &mut ParamFactory {
        &mut self.factory
    }

    /// The implicit root state `""`.
    pub fn root(&self) -> &Arc<StateObject> {
        &self.root
    }

    /// Register a declaration.
    ///
    /// Returns the built state, or `None` if it is queued waiting for its parent.
    ///
    /// Building `decl` may unblock queued descendants. If any of those fail to
    /// build, `decl` itself stays registered and the call returns
    /// [`StateError::QueuedBuildsFailed`]; the failures also remain listed in
    /// [`failures`](Self::failures).
    pub fn register(
        &mut self,
        decl: StateDeclaration,
    ) -> Result<Option<Arc<StateObject>>, StateError> {
        let name = decl.name.clone();
        self.manager.enqueue(decl)?;
        self.failed.remove(&name);
        let mut failed = self.flush_queue();
        if let Some(i) = failed.iter().position(|(n, _)| *n == name) {
            return Err(failed.swap_remove(i).1);
        }
        if !failed.is_empty() {
            self.record_failures(&failed);
            return Err(StateError::QueuedBuildsFailed(failed));
        }
        Ok(self.get(&name))
    }

    /// Build whatever can be built and return the state table.
    ///
    /// Fails with [`StateError::QueuedBuildsFailed`] when a queued declaration
    /// could not be built; the others are built regardless.
    pub fn flush(&mut self) -> Result<&BTreeMap<String, Arc<StateObject>>, StateError> {
        let failed = self.flush_queue();
        if !failed.is_empty() {
            self.record_failures(&failed);
            return Err(StateError::QueuedBuildsFailed(failed));
        }
        Ok(self.manager.states())
    }

    fn flush_queue(&mut self) -> Vec<(String, StateError)> {
        let Flushed { built, failed } = self.manager.flush(&mut self.factory);
        for state in &built {
            self.attach_route(state);
        }
        if !built.is_empty() {
            self.notify(RegistryEvent::Registered, &built);
        }
        failed
    }

    fn record_failures(&mut self, failed: &[(String, StateError)]) {
        self.failed
            .extend(failed.iter().map(|(n, e)| (n.clone(), e.clone())));
    }

    /// Queued declarations dropped because they failed to build after their
    /// parent arrived. Registering the name again clears its entry.
    pub fn failures(&self) -> &BTreeMap<String, StateError> {
        &self.failed
    }

    /// Link a built state's URL into the route table.
    pub fn attach_route(&mut self, state: &StateObject) -> bool {
        self.rules.attach(state)
    }

    /// Remove a state and all of its descendants, detaching their routes.
    ///
    /// Queued declarations under the same prefix are dropped too.
    pub fn deregister(&mut self, name: &str) -> Result<Vec<Arc<StateObject>>, StateError> {
        if name.is_empty() {
            return Err(StateError::RootState);
        }
        validate_name(name)?;
        if !self.manager.contains(name) {
            return Err(StateError::NotFound(name.to_owned()));
        }
        let removed = self.manager.remove_subtree(name);
        let prefix = format!("{name}.");
        self.failed
            .retain(|n, _| n != name && !n.starts_with(&prefix));
        for state in &removed {
            self.rules.detach(state.name());
        }
        tracing::debug!(state = %name, removed = removed.len(), "deregistered subtree");
        if !removed.is_empty() {
            self.notify(RegistryEvent::Deregistered, &removed);
        }
        Ok(removed)
    }

    /// A built state by exact name.
    pub fn get(&self, name: &str) -> Option<Arc<StateObject>> {
        self.manager.states().get(name).cloned()
    }

    /// A built state by possibly relative name (`^.sibling`, `.child`).
    pub fn find(&self, name: &str, base: Option<&str>) -> Result<Arc<StateObject>, StateError> {
        let absolute = resolve_name(name, base)?;
        self.get(&absolute).ok_or(StateError::NotFound(absolute))
    }

    /// Every built state by name, including the root.
    pub fn states(&self) -> &BTreeMap<String, Arc<StateObject>> {
        self.manager.states()
    }

    /// Declarations still waiting for a parent.
    pub fn unresolved(&self) -> Vec<StateError> {
        self.manager.unresolved()
    }

    /// Call `listener` after states are registered or deregistered.
    pub fn on_states_changed(
        &mut self,
        listener: impl Fn(RegistryEvent, &[Arc<StateObject>]) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener, returning whether it was present.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        before != self.listeners.len()
    }

    fn notify(&self, event: RegistryEvent, states: &[Arc<StateObject>]) {
        for (_, listener) in &self.listeners {
            listener(event, states);
        }
    }

    /// The route table.
    pub fn rules(&self) -> &UrlRules {
        &self.rules
    }

    /// Match a URL against the route table.
    pub fn match_url(&self, url: &str) -> Option<UrlMatch> {
        self.rules.match_url(url)
    }

    /// Format the URL representing `name` with `params`.
    ///
    /// Uses the nearest navigable ancestor for states without a URL.
    pub fn href(&self, name: &str, params: &ParamValues) -> Option<String> {
        let state = self.get(name)?;
        let navigable = self.get(state.navigable()?)?;
        navigable.url()?.format(params)
    }
}
