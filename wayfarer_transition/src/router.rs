// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The router: registries, hooks, and the current location in one place.
//!
//! A [`Router`] owns the param type registry, the state registry with its
//! route table, the event types and hooks, and the globals (current path and
//! params, in-flight transition, history). It is cheap to clone and can be
//! shared across tasks; every method takes `&self`.
//!
//! ```
//! use futures::executor::block_on;
//! use wayfarer_params::{ParamValue, param_values};
//! use wayfarer_state::StateDeclaration;
//! use wayfarer_transition::{HookMatchCriteria, HookOptions, Router};
//!
//! let router = Router::new().unwrap();
//! router.register(StateDeclaration::new("users").url("/users/{id:int}")).unwrap();
//! router.on_enter(HookMatchCriteria::any().entering("users"), |ctx| {
//!     assert_eq!(ctx.state.map(|s| s.name()), Some("users"));
//! }, HookOptions::default());
//!
//! let done = block_on(router.go("users", param_values([("id", ParamValue::Int(4))]))).unwrap();
//! assert_eq!(done.to().unwrap().name(), "users");
//! assert_eq!(router.href("users", router.current_params()).as_deref(), Some("/users/4"));
//! ```

use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use wayfarer_params::{ParamCodec, ParamError, ParamFactory, ParamTypes, ParamValues};
use wayfarer_state::{
    ListenerId, Queue, RegistryEvent, StateDeclaration, StateError, StateObject, StateRegistry,
    UrlMatch,
};

use crate::builtins;
use crate::config::RouterConfig;
use crate::criteria::HookMatchCriteria;
use crate::event_type::{TransitionEventType, builtin_event_types, names};
use crate::hook::{HookContext, HookId, HookOptions, HookRegistry, IntoHookResult};
use crate::path::{PathNode, build_path};
use crate::rejection::TransitionError;
use crate::transition::Transition;
use crate::types::{TargetState, TransitionHookPhase, TransitionOptions};

/// Errors from router setup and registration.
#[derive(Clone, Debug, thiserror::Error)]
pub enum RouterError {
    /// State registration failed.
    #[error(transparent)]
    State(#[from] StateError),
    /// Param type registration failed.
    #[error(transparent)]
    Param(#[from] ParamError),
    /// No event type with this name.
    #[error("no event type named `{0}`")]
    UnknownEvent(String),
    /// An event type with this name already exists.
    #[error("an event type named `{0}` is already defined")]
    DuplicateEvent(String),
    /// CREATE, SUCCESS and ERROR hooks run inline, so their event types must
    /// be synchronous.
    #[error("event type `{event}` must be synchronous in the {phase:?} phase")]
    AsynchronousEvent {
        /// The rejected event type.
        event: String,
        /// Its phase.
        phase: TransitionHookPhase,
    },
    /// BEFORE event types may not be ordered ahead of the built-in guards.
    #[error("event type `{event}` has hook order {order}, ahead of `{}` ({min})", names::ON_BEFORE)]
    OrderedBeforeGuards {
        /// The rejected event type.
        event: String,
        /// Its hook order.
        order: i32,
        /// The lowest allowed order.
        min: i32,
    },
}

pub(crate) struct Globals {
    pub(crate) current: Vec<PathNode>,
    pub(crate) params: ParamValues,
    pub(crate) active: Option<u64>,
    pub(crate) resolved: BTreeMap<String, BTreeMap<String, Value>>,
    pub(crate) history: Queue<Transition>,
    pub(crate) successful: Queue<Transition>,
}

pub(crate) struct RouterShared {
    pub(crate) config: RouterConfig,
    pub(crate) registry: RwLock<StateRegistry>,
    pub(crate) hooks: RwLock<HookRegistry>,
    pub(crate) event_types: RwLock<Vec<Arc<TransitionEventType>>>,
    pub(crate) globals: Mutex<Globals>,
    pub(crate) next_transition: AtomicU64,
}

/// Handle to a router. Clones share everything.
#[derive(Clone)]
pub struct Router {
    shared: Arc<RouterShared>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let globals = self.shared.globals.lock();
        f.debug_struct("Router")
            .field("config", &self.shared.config)
            .field("states", &self.shared.registry.read().states().len())
            .field("hooks", &self.shared.hooks.read().len())
            .field("current", &globals.current.last().map(PathNode::name))
            .field("active", &globals.active)
            .finish_non_exhaustive()
    }
}

impl Router {
    /// A router with the default configuration.
    pub fn new() -> Result<Self, RouterError> {
        Self::with_config(RouterConfig::default())
    }

    /// A router with `config`.
    pub fn with_config(config: RouterConfig) -> Result<Self, RouterError> {
        let factory = ParamFactory::new(ParamTypes::new(), config.default_squash_policy.clone());
        let registry = StateRegistry::new(factory, config.matcher_config())?;
        let root = PathNode::new(registry.root().clone(), &ParamValues::new());
        let mut hooks = HookRegistry::new();
        builtins::install(&mut hooks);
        let globals = Globals {
            current: vec![root],
            params: ParamValues::new(),
            active: None,
            resolved: BTreeMap::new(),
            history: Queue::new(Some(config.history_limit)),
            successful: Queue::new(Some(config.success_limit)),
        };
        let event_types = builtin_event_types().into_iter().map(Arc::new).collect();
        Ok(Self {
            shared: Arc::new(RouterShared {
                config,
                registry: RwLock::new(registry),
                hooks: RwLock::new(hooks),
                event_types: RwLock::new(event_types),
                globals: Mutex::new(globals),
                next_transition: AtomicU64::new(0),
            }),
        })
    }

    /// The configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.shared.config
    }

    // --- states ---

    /// Register a custom param type.
    pub fn register_type(
        &self,
        name: impl Into<String>,
        codec: impl ParamCodec + 'static,
    ) -> Result<(), RouterError> {
        let mut registry = self.shared.registry.write();
        registry.param_factory_mut().types_mut().register(name, codec)?;
        Ok(())
    }

    /// Register a state. `None` means it is waiting for its parent.
    pub fn register(&self, decl: StateDeclaration) -> Result<Option<Arc<StateObject>>, RouterError> {
        Ok(self.shared.registry.write().register(decl)?)
    }

    /// Remove a state and its descendants.
    pub fn deregister(&self, name: &str) -> Result<Vec<Arc<StateObject>>, RouterError> {
        Ok(self.shared.registry.write().deregister(name)?)
    }

    /// Build what can be built and return every state by name.
    ///
    /// Fails if a queued declaration could not be built; see
    /// [`StateRegistry::flush`].
    pub fn flush(&self) -> Result<BTreeMap<String, Arc<StateObject>>, RouterError> {
        Ok(self.shared.registry.write().flush()?.clone())
    }

    /// A registered state by exact name.
    pub fn state(&self, name: &str) -> Option<Arc<StateObject>> {
        self.shared.registry.read().get(name)
    }

    /// Declarations still waiting for a parent.
    pub fn unresolved(&self) -> Vec<StateError> {
        self.shared.registry.read().unresolved()
    }

    /// Queued declarations that failed to build once their parent arrived.
    pub fn failed_states(&self) -> BTreeMap<String, StateError> {
        self.shared.registry.read().failures().clone()
    }

    /// Call `listener` after states are registered or deregistered.
    ///
    /// The listener runs while the registry is locked and must not call back
    /// into the router.
    pub fn on_states_changed(
        &self,
        listener: impl Fn(RegistryEvent, &[Arc<StateObject>]) + Send + Sync + 'static,
    ) -> ListenerId {
        self.shared.registry.write().on_states_changed(listener)
    }

    /// Remove a states-changed listener.
    pub fn remove_states_listener(&self, id: ListenerId) -> bool {
        self.shared.registry.write().remove_listener(id)
    }

    /// The root→`name` path with `params` (defaults applied).
    pub fn path_for(&self, name: &str, params: &ParamValues) -> Vec<PathNode> {
        let registry = self.shared.registry.read();
        let Some(state) = registry.get(name) else {
            return vec![PathNode::new(registry.root().clone(), params)];
        };
        let params = state.param_values(params);
        build_path(&state, &params, |n| registry.get(n))
    }

    // --- hooks ---

    /// Add an event type.
    ///
    /// Event types of the CREATE, SUCCESS and ERROR phases must be
    /// [synchronous](TransitionEventType::synchronous). BEFORE event types may
    /// not order themselves ahead of `on_before`, whose built-in hooks reject
    /// invalid and ignored transitions.
    pub fn define_event(&self, event: TransitionEventType) -> Result<(), RouterError> {
        let mut types = self.shared.event_types.write();
        if types.iter().any(|t| t.name() == event.name()) {
            return Err(RouterError::DuplicateEvent(event.name().to_owned()));
        }
        let phase = event.phase();
        let inline = matches!(
            phase,
            TransitionHookPhase::Create | TransitionHookPhase::Success | TransitionHookPhase::Error
        );
        if inline && !event.is_synchronous() {
            return Err(RouterError::AsynchronousEvent {
                event: event.name().to_owned(),
                phase,
            });
        }
        if phase == TransitionHookPhase::Before {
            let guards = types.iter().find(|t| t.name() == names::ON_BEFORE);
            if let Some(min) = guards.map(|t| t.hook_order())
                && event.hook_order() < min
            {
                return Err(RouterError::OrderedBeforeGuards {
                    event: event.name().to_owned(),
                    order: event.hook_order(),
                    min,
                });
            }
        }
        tracing::debug!(event = event.name(), phase = ?event.phase(), order = event.hook_order(), "defined event type");
        types.push(Arc::new(event));
        Ok(())
    }

    /// Register a hook for any event type.
    pub fn on<F, R>(
        &self,
        event: &str,
        criteria: HookMatchCriteria,
        hook: F,
        options: HookOptions,
    ) -> Result<HookId, RouterError>
    where
        F: Fn(&HookContext<'_>) -> R + Send + Sync + 'static,
        R: IntoHookResult,
    {
        let name = {
            let types = self.shared.event_types.read();
            let found = types.iter().find(|t| t.name() == event);
            found
                .map(|t| Arc::<str>::from(t.name()))
                .ok_or_else(|| RouterError::UnknownEvent(event.to_owned()))?
        };
        Ok(self.add_hook(name, criteria, hook, options))
    }

    fn add_hook<F, R>(
        &self,
        event: Arc<str>,
        criteria: HookMatchCriteria,
        hook: F,
        options: HookOptions,
    ) -> HookId
    where
        F: Fn(&HookContext<'_>) -> R + Send + Sync + 'static,
        R: IntoHookResult,
    {
        let callback = Arc::new(move |ctx: &HookContext<'_>| hook(ctx).into_hook_result());
        self.shared
            .hooks
            .write()
            .add(event, criteria, callback, options)
    }

    /// Remove a hook.
    pub fn deregister_hook(&self, id: HookId) -> bool {
        self.shared.hooks.write().remove(id)
    }

    /// Register a creation hook. Runs synchronously; a failure marks the
    /// transition invalid.
    pub fn on_create<F, R>(&self, criteria: HookMatchCriteria, hook: F, options: HookOptions) -> HookId
    where
        F: Fn(&HookContext<'_>) -> R + Send + Sync + 'static,
        R: IntoHookResult,
    {
        self.add_hook(names::ON_CREATE.into(), criteria, hook, options)
    }

    /// Register a hook that runs before anything is exited or entered.
    pub fn on_before<F, R>(&self, criteria: HookMatchCriteria, hook: F, options: HookOptions) -> HookId
    where
        F: Fn(&HookContext<'_>) -> R + Send + Sync + 'static,
        R: IntoHookResult,
    {
        self.add_hook(names::ON_BEFORE.into(), criteria, hook, options)
    }

    /// Register a hook for the start of the RUN phase.
    pub fn on_start<F, R>(&self, criteria: HookMatchCriteria, hook: F, options: HookOptions) -> HookId
    where
        F: Fn(&HookContext<'_>) -> R + Send + Sync + 'static,
        R: IntoHookResult,
    {
        self.add_hook(names::ON_START.into(), criteria, hook, options)
    }

    /// Register a hook invoked once per exited state, deepest first.
    pub fn on_exit<F, R>(&self, criteria: HookMatchCriteria, hook: F, options: HookOptions) -> HookId
    where
        F: Fn(&HookContext<'_>) -> R + Send + Sync + 'static,
        R: IntoHookResult,
    {
        self.add_hook(names::ON_EXIT.into(), criteria, hook, options)
    }

    /// Register a hook invoked once per retained state.
    pub fn on_retain<F, R>(&self, criteria: HookMatchCriteria, hook: F, options: HookOptions) -> HookId
    where
        F: Fn(&HookContext<'_>) -> R + Send + Sync + 'static,
        R: IntoHookResult,
    {
        self.add_hook(names::ON_RETAIN.into(), criteria, hook, options)
    }

    /// Register a hook invoked once per entered state, outermost first.
    pub fn on_enter<F, R>(&self, criteria: HookMatchCriteria, hook: F, options: HookOptions) -> HookId
    where
        F: Fn(&HookContext<'_>) -> R + Send + Sync + 'static,
        R: IntoHookResult,
    {
        self.add_hook(names::ON_ENTER.into(), criteria, hook, options)
    }

    /// Register a hook for the end of the RUN phase.
    pub fn on_finish<F, R>(&self, criteria: HookMatchCriteria, hook: F, options: HookOptions) -> HookId
    where
        F: Fn(&HookContext<'_>) -> R + Send + Sync + 'static,
        R: IntoHookResult,
    {
        self.add_hook(names::ON_FINISH.into(), criteria, hook, options)
    }

    /// Register a hook that runs after a transition committed.
    pub fn on_success<F, R>(&self, criteria: HookMatchCriteria, hook: F, options: HookOptions) -> HookId
    where
        F: Fn(&HookContext<'_>) -> R + Send + Sync + 'static,
        R: IntoHookResult,
    {
        self.add_hook(names::ON_SUCCESS.into(), criteria, hook, options)
    }

    /// Register a hook that runs after a transition was rejected.
    ///
    /// Superseded and ignored transitions do not run these.
    pub fn on_error<F, R>(&self, criteria: HookMatchCriteria, hook: F, options: HookOptions) -> HookId
    where
        F: Fn(&HookContext<'_>) -> R + Send + Sync + 'static,
        R: IntoHookResult,
    {
        self.add_hook(names::ON_ERROR.into(), criteria, hook, options)
    }

    // --- transitions ---

    /// Create a transition between two explicit locations.
    pub fn create_transition(
        &self,
        from_state: &str,
        from_params: &ParamValues,
        to_state: &str,
        to_params: ParamValues,
    ) -> Transition {
        let from = self.path_for(from_state, from_params);
        self.create_transition_from(from, TargetState::new(to_state, to_params))
    }

    /// Create a transition from an explicit path.
    pub fn create_transition_from(&self, from: Vec<PathNode>, target: TargetState) -> Transition {
        Transition::create(&self.shared, from, target, None)
    }

    /// Create a transition from the current location.
    ///
    /// Relative target names resolve against the current state unless the
    /// target says otherwise.
    pub fn create_transition_to(&self, mut target: TargetState) -> Transition {
        let from = self.shared.globals.lock().current.clone();
        if target.relative_to.is_none() {
            target.relative_to = from.last().map(|n| n.name().to_owned());
        }
        self.create_transition_from(from, target)
    }

    /// Go to `state` with `params` and default options.
    pub async fn go(&self, state: &str, params: ParamValues) -> Result<Transition, TransitionError> {
        self.transition_to(TargetState::new(state, params)).await
    }

    /// Go to `state` with explicit options.
    pub async fn go_with(
        &self,
        state: &str,
        params: ParamValues,
        options: TransitionOptions,
    ) -> Result<Transition, TransitionError> {
        self.transition_to(TargetState::new(state, params).with_options(options))
            .await
    }

    /// Create and run a transition from the current location.
    pub async fn transition_to(&self, target: TargetState) -> Result<Transition, TransitionError> {
        self.create_transition_to(target).run().await
    }

    // --- globals ---

    /// The current state.
    pub fn current_state(&self) -> Arc<StateObject> {
        let globals = self.shared.globals.lock();
        match globals.current.last() {
            Some(node) => node.state.clone(),
            None => self.shared.registry.read().root().clone(),
        }
    }

    /// The current param values.
    pub fn current_params(&self) -> ParamValues {
        self.shared.globals.lock().params.clone()
    }

    /// The current path, root first.
    pub fn current_path(&self) -> Vec<PathNode> {
        self.shared.globals.lock().current.clone()
    }

    /// Whether a transition is running.
    pub fn transition_in_progress(&self) -> bool {
        self.shared.globals.lock().active.is_some()
    }

    /// The most recent successful transition.
    pub fn last_success(&self) -> Option<Transition> {
        self.shared.globals.lock().successful.peek_tail().cloned()
    }

    /// Recently started transitions, oldest first.
    pub fn transition_history(&self) -> Vec<Transition> {
        self.shared.globals.lock().history.to_vec()
    }

    /// Recently committed transitions, oldest first.
    pub fn successful_transitions(&self) -> Vec<Transition> {
        self.shared.globals.lock().successful.to_vec()
    }

    // --- urls ---

    /// Match a URL against the registered routes.
    pub fn match_url(&self, url: &str) -> Option<UrlMatch> {
        self.shared.registry.read().match_url(url)
    }

    /// The URL for `state` with `params`.
    pub fn href(&self, state: &str, params: ParamValues) -> Option<String> {
        self.shared.registry.read().href(state, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_type::ErrorPolicy;
    use crate::types::PathKind;
    use futures::executor::block_on;
    use std::sync::Mutex as StdMutex;
    use wayfarer_params::{ParamValue, param_values};

    #[test]
    fn unknown_and_duplicate_events() {
        let router = Router::new().expect("router");
        assert!(matches!(
            router.on("on_nope", HookMatchCriteria::any(), |_| (), HookOptions::default()),
            Err(RouterError::UnknownEvent(e)) if e == "on_nope"
        ));
        assert!(matches!(
            router.define_event(TransitionEventType::new(
                "on_start",
                TransitionHookPhase::Run,
                1,
                PathKind::To
            )),
            Err(RouterError::DuplicateEvent(_))
        ));
    }

    #[test]
    fn event_types_are_checked_against_their_phase() {
        let router = Router::new().expect("router");
        assert!(matches!(
            router.define_event(TransitionEventType::new(
                "on_done",
                TransitionHookPhase::Success,
                1,
                PathKind::To
            )),
            Err(RouterError::AsynchronousEvent { phase: TransitionHookPhase::Success, .. })
        ));
        router
            .define_event(
                TransitionEventType::new("on_done", TransitionHookPhase::Success, 1, PathKind::To)
                    .synchronous(),
            )
            .expect("synchronous is fine");

        assert!(matches!(
            router.define_event(TransitionEventType::new(
                "on_early",
                TransitionHookPhase::Before,
                -1,
                PathKind::To
            )),
            Err(RouterError::OrderedBeforeGuards { order: -1, min: 0, .. })
        ));
        router
            .define_event(TransitionEventType::new(
                "on_early",
                TransitionHookPhase::Before,
                0,
                PathKind::To,
            ))
            .expect("ties run after the guards");
    }

    #[test]
    fn invalid_transitions_stop_before_custom_before_events() {
        let router = Router::new().expect("router");
        router
            .define_event(TransitionEventType::new(
                "on_early",
                TransitionHookPhase::Before,
                0,
                PathKind::To,
            ))
            .expect("new event");
        let ran = Arc::new(StdMutex::new(false));
        let seen = ran.clone();
        router
            .on(
                "on_early",
                HookMatchCriteria::any(),
                move |_| *seen.lock().expect("not poisoned") = true,
                HookOptions::default(),
            )
            .expect("defined");
        assert!(matches!(
            block_on(router.go("missing", ParamValues::new())),
            Err(TransitionError::Invalid(_))
        ));
        assert!(!*ran.lock().expect("not poisoned"));
    }

    #[derive(Debug)]
    struct Slug;

    impl ParamCodec for Slug {
        fn encode(&self, value: &ParamValue) -> Option<String> {
            value.as_str().map(str::to_owned)
        }

        fn decode(&self, raw: &str) -> Option<ParamValue> {
            Some(ParamValue::from(raw))
        }

        fn is(&self, value: &ParamValue) -> bool {
            value.as_str().is_some()
        }

        fn pattern(&self) -> &str {
            "[a-z0-9-]+"
        }
    }

    #[test]
    fn custom_param_types_register_once() {
        let router = Router::new().expect("router");
        router.register_type("slug", Slug).expect("fresh name");
        assert!(matches!(
            router.register_type("slug", Slug),
            Err(RouterError::Param(ParamError::DuplicateType(n))) if n == "slug"
        ));
        assert!(matches!(
            router.register_type("int", Slug),
            Err(RouterError::Param(ParamError::DuplicateType(_)))
        ));
        router
            .register(StateDeclaration::new("post").url("/posts/{slug:slug}"))
            .expect("type is known");
        let hit = router.match_url("/posts/hello-world").expect("routed");
        assert_eq!(hit.params["slug"], ParamValue::from("hello-world"));
        assert!(router.match_url("/posts/Hello").is_none());
    }

    #[test]
    fn create_hook_errors_mark_the_transition_invalid() {
        let router = Router::new().expect("router");
        router.register(StateDeclaration::new("a")).expect("valid");
        router.on_create(
            HookMatchCriteria::any().to("a"),
            |_| Err::<(), _>(crate::hook::HookError::message("no")),
            HookOptions::default(),
        );
        let t = router.create_transition_to(TargetState::new("a", ParamValues::new()));
        assert!(!t.valid());
        assert!(matches!(t.error(), Some(TransitionError::HookThrew { .. })));
        assert!(matches!(block_on(t.run()), Err(TransitionError::HookThrew { .. })));
        assert_eq!(router.current_state().name(), "");
    }

    #[test]
    fn logged_errors_do_not_stop_the_pipeline() {
        let router = Router::new().expect("router");
        router.register(StateDeclaration::new("a")).expect("valid");
        router
            .define_event(
                TransitionEventType::new("on_audit", TransitionHookPhase::Run, 50, PathKind::To)
                    .with_error_policy(ErrorPolicy::Log),
            )
            .expect("new event");
        router
            .on(
                "on_audit",
                HookMatchCriteria::any(),
                |_| Err::<(), _>(crate::hook::HookError::message("audit down")),
                HookOptions::default(),
            )
            .expect("defined");
        assert!(block_on(router.go("a", ParamValues::new())).is_ok());
        assert_eq!(router.current_state().name(), "a");
    }

    #[test]
    fn invoke_limit_retires_hooks() {
        let router = Router::new().expect("router");
        for name in ["a", "b"] {
            router.register(StateDeclaration::new(name)).expect("valid");
        }
        let count = Arc::new(StdMutex::new(0));
        let seen = count.clone();
        router.on_success(
            HookMatchCriteria::any(),
            move |_| *seen.lock().expect("not poisoned") += 1,
            HookOptions::default().invoke_limit(1),
        );
        block_on(router.go("a", ParamValues::new())).expect("ok");
        block_on(router.go("b", ParamValues::new())).expect("ok");
        assert_eq!(*count.lock().expect("not poisoned"), 1);
    }

    #[test]
    fn history_queues_are_bounded() {
        let config = RouterConfig {
            history_limit: 2,
            success_limit: 2,
            ..RouterConfig::default()
        };
        let router = Router::with_config(config).expect("router");
        router.register(StateDeclaration::new("n").url("/n/{i:int}")).expect("valid");
        for i in 0..3 {
            block_on(router.go("n", param_values([("i", ParamValue::Int(i))]))).expect("ok");
        }
        let ids: Vec<u64> = router.successful_transitions().iter().map(Transition::id).collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(router.last_success().map(|t| t.id()), ids.last().copied());
        assert_eq!(router.transition_history().len(), 2);
        assert_eq!(router.match_url("/n/2").map(|m| m.state), Some("n".to_owned()));
    }

    #[test]
    fn path_for_unknown_state_is_the_root() {
        let router = Router::new().expect("router");
        let path = router.path_for("ghost", &ParamValues::new());
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].name(), "");
    }
}
