// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One attempt to move from the current state to a target.
//!
//! ## Lifecycle
//!
//! A [`Transition`] is created against a snapshot of the registry: the target
//! is resolved, params are inherited and validated, and the tree changes are
//! computed. Creation-phase hooks run synchronously; a failing one marks the
//! transition invalid. Nothing is observable on the router until
//! [`Transition::run`] is awaited.
//!
//! `run` makes the transition the active one and walks the BEFORE and RUN
//! phases one hook at a time. Before and after every hook it checks that it is
//! still active; once a newer transition has started it stops silently with
//! [`TransitionError::Superseded`]. When every hook passed, the router's
//! current path and params are replaced in one step and SUCCESS hooks run.
//! Any other rejection runs ERROR hooks instead, except for silent kinds.
//!
//! A hook may redirect. The redirect becomes a new transition from the same
//! starting point; `run` follows redirects up to the configured limit and
//! resolves with whichever transition finally committed.

use core::fmt;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::Instrument;
use wayfarer_params::{Param, ParamValues};
use wayfarer_state::{StateObject, StateRegistry};

use crate::event_type::{ErrorPolicy, ResultPolicy};
use crate::hook::{HookContext, HookError, HookOutcome, HookReturn};
use crate::hook_builder::{self, PlannedHook};
use crate::path::{PathNode, TreeChanges, build_path};
use crate::rejection::{InvalidReason, TransitionError};
use crate::router::RouterShared;
use crate::types::{PathKind, TargetState, TransitionFlags, TransitionHookPhase, TransitionOptions};

type Resolved = BTreeMap<String, BTreeMap<String, Value>>;

/// A transition between two paths of the state tree.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Transition {
    inner: Arc<TransitionInner>,
}

struct TransitionInner {
    id: u64,
    router: Weak<RouterShared>,
    target: TargetState,
    changes: TreeChanges,
    params: ParamValues,
    from_params: ParamValues,
    error: Mutex<Option<TransitionError>>,
    rejection: Mutex<Option<TransitionError>>,
    succeeded: AtomicBool,
    resolved: Mutex<Resolved>,
    redirected_from: Option<Transition>,
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("id", &self.inner.id)
            .field("from", &self.from().map(|s| s.name().to_owned()))
            .field("to", &self.inner.target.state)
            .field("params", &self.inner.params)
            .field("error", &*self.inner.error.lock())
            .field("rejection", &*self.inner.rejection.lock())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Transition {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

enum Step {
    Done(Result<Transition, TransitionError>),
    Redirect(TargetState),
}

impl Transition {
    pub(crate) fn create(
        shared: &Arc<RouterShared>,
        from: Vec<PathNode>,
        target: TargetState,
        redirected_from: Option<Self>,
    ) -> Self {
        let id = shared.next_transition.fetch_add(1, Ordering::Relaxed);
        let resolved_target = {
            let registry = shared.registry.read();
            resolve_target(&registry, &from, &target)
        };
        let (to, params, error) = match resolved_target {
            Ok((to, params)) => (to, params, None),
            Err(reason) => (
                Vec::new(),
                target.params.clone(),
                Some(TransitionError::Invalid(reason)),
            ),
        };
        let reload_at = match (&target.options.reload_state, target.options.has(TransitionFlags::RELOAD)) {
            (Some(name), _) => to.iter().position(|n| n.name() == name).map(|i| i.max(1)),
            (None, true) => Some(1),
            (None, false) => None,
        };
        let from_params: ParamValues = from
            .iter()
            .flat_map(|n| n.params.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect();
        let changes = TreeChanges::compute(from, to, reload_at);
        let resolved: Resolved = {
            let globals = shared.globals.lock();
            changes
                .retained
                .iter()
                .filter_map(|n| {
                    globals
                        .resolved
                        .get(n.name())
                        .map(|v| (n.name().to_owned(), v.clone()))
                })
                .collect()
        };
        if let Some(err) = &error {
            tracing::debug!(transition = id, target = %target.state, error = %err, "created invalid transition");
        } else {
            tracing::debug!(
                transition = id,
                target = %target.state,
                exiting = changes.exiting.len(),
                entering = changes.entering.len(),
                "created transition"
            );
        }
        let transition = Self {
            inner: Arc::new(TransitionInner {
                id,
                router: Arc::downgrade(shared),
                target,
                changes,
                params,
                from_params,
                error: Mutex::new(error),
                rejection: Mutex::new(None),
                succeeded: AtomicBool::new(false),
                resolved: Mutex::new(resolved),
                redirected_from,
            }),
        };
        if let Some(err) = transition.run_sync(shared, TransitionHookPhase::Create) {
            let mut slot = transition.inner.error.lock();
            if slot.is_none() {
                *slot = Some(err);
            }
        }
        transition
    }

    /// Run the transition to completion.
    ///
    /// Resolves with the transition that committed, which is a redirect target
    /// when hooks redirected, or with the rejection.
    pub async fn run(&self) -> Result<Self, TransitionError> {
        let Some(shared) = self.inner.router.upgrade() else {
            return Err(self.supersede());
        };
        let span = tracing::debug_span!("transition", id = self.id(), target = %self.inner.target.state);
        async move {
            let mut current = self.clone();
            loop {
                match current.attempt(&shared).await {
                    Step::Done(result) => return result,
                    Step::Redirect(target) => {
                        let limit = shared.config.max_redirects;
                        if current.redirect_count() >= limit {
                            return current.reject(&shared, TransitionError::TooManyRedirects(limit));
                        }
                        *current.inner.rejection.lock() =
                            Some(TransitionError::Redirected(target.state.clone()));
                        tracing::debug!(transition = current.id(), to = %target.state, "redirecting");
                        current = current.redirect(&shared, target);
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    fn redirect(&self, shared: &Arc<RouterShared>, mut target: TargetState) -> Self {
        if target.relative_to.is_none() {
            target.relative_to = self.to().map(|s| s.name().to_owned());
        }
        Self::create(shared, self.inner.changes.from.clone(), target, Some(self.clone()))
    }

    async fn attempt(&self, shared: &Arc<RouterShared>) -> Step {
        self.activate(shared);
        for phase in [TransitionHookPhase::Before, TransitionHookPhase::Run] {
            for planned in self.plan(shared, phase) {
                if !self.is_active_in(shared) {
                    return Step::Done(Err(self.supersede()));
                }
                let Some(outcome) = self.invoke(&planned).await else {
                    continue;
                };
                if !self.is_active_in(shared) {
                    return Step::Done(Err(self.supersede()));
                }
                let hook = planned.hook.name();
                match outcome {
                    Ok(HookOutcome::Continue) => {}
                    Ok(other) if planned.event.result_policy() == ResultPolicy::LogRejected => {
                        tracing::warn!(hook = %hook, outcome = ?other, "ignoring hook result");
                    }
                    Ok(HookOutcome::Abort) => {
                        return Step::Done(self.reject(shared, TransitionError::Aborted { hook }));
                    }
                    Ok(HookOutcome::Redirect(target)) => return Step::Redirect(target),
                    Err(err) => match planned.event.error_policy() {
                        ErrorPolicy::Log => tracing::warn!(hook = %hook, error = %err, "hook failed"),
                        ErrorPolicy::Reject | ErrorPolicy::Throw => {
                            return Step::Done(self.reject(shared, err));
                        }
                    },
                }
            }
        }
        Step::Done(self.commit(shared))
    }

    fn plan(&self, shared: &RouterShared, phase: TransitionHookPhase) -> Vec<PlannedHook> {
        let snapshot = {
            let types = shared.event_types.read();
            let hooks = shared.hooks.read();
            hook_builder::snapshot(phase, &types, &hooks)
        };
        hook_builder::plan(snapshot, self)
    }

    /// Invoke one planned hook; `None` if its invocation limit is spent.
    fn call(&self, planned: &PlannedHook) -> Option<Result<HookReturn, HookError>> {
        tracing::trace!(
            transition = self.id(),
            event = planned.event.name(),
            hook = %planned.hook.name(),
            state = planned.state.as_ref().map(|s| s.name()),
            "invoking hook"
        );
        let ctx = HookContext {
            transition: self,
            state: planned.state.as_ref(),
            event: planned.event.name(),
        };
        let result = planned.hook.invoke(&ctx);
        if result.is_none() {
            tracing::trace!(hook = %planned.hook.name(), "invoke limit reached");
        }
        result
    }

    /// Run one hook of an asynchronous phase. Deferred results of
    /// non-synchronous event types are awaited; synchronous event types must
    /// not suspend, so their deferred results are dropped with a warning.
    async fn invoke(&self, planned: &PlannedHook) -> Option<Result<HookOutcome, TransitionError>> {
        let outcome = match self.call(planned)? {
            Ok(HookReturn::Settled(outcome)) => Ok(outcome),
            Ok(HookReturn::Deferred(_)) if planned.event.is_synchronous() => {
                warn_deferred(planned);
                Ok(HookOutcome::Continue)
            }
            Ok(HookReturn::Deferred(future)) => future
                .await
                .map_err(|err| hook_failure(planned.hook.name(), err, true)),
            Err(err) => Err(hook_failure(planned.hook.name(), err, false)),
        };
        Some(outcome)
    }

    /// Run a synchronous phase, returning the first error its policy does not swallow.
    ///
    /// Only synchronous event types are defined for these phases.
    fn run_sync(&self, shared: &RouterShared, phase: TransitionHookPhase) -> Option<TransitionError> {
        for planned in self.plan(shared, phase) {
            let hook = planned.hook.name();
            let outcome = match self.call(&planned) {
                None => continue,
                Some(Ok(HookReturn::Settled(outcome))) => Ok(outcome),
                Some(Ok(HookReturn::Deferred(_))) => {
                    warn_deferred(&planned);
                    Ok(HookOutcome::Continue)
                }
                Some(Err(err)) => Err(hook_failure(hook.clone(), err, false)),
            };
            match outcome {
                Ok(HookOutcome::Continue) => {}
                Ok(other) => {
                    tracing::warn!(hook = %hook, outcome = ?other, "ignoring hook result");
                }
                Err(err) => match planned.event.error_policy() {
                    ErrorPolicy::Log => tracing::warn!(hook = %hook, error = %err, "hook failed"),
                    ErrorPolicy::Reject | ErrorPolicy::Throw => return Some(err),
                },
            }
        }
        None
    }

    fn activate(&self, shared: &RouterShared) {
        let mut globals = shared.globals.lock();
        if let Some(previous) = globals.active {
            tracing::debug!(superseded = previous, by = self.id(), "superseding transition");
        }
        globals.active = Some(self.id());
        globals.history.enqueue(self.clone());
    }

    fn is_active_in(&self, shared: &RouterShared) -> bool {
        shared.globals.lock().active == Some(self.id())
    }

    fn supersede(&self) -> TransitionError {
        tracing::debug!(transition = self.id(), "transition superseded");
        let err = TransitionError::Superseded;
        *self.inner.rejection.lock() = Some(err.clone());
        err
    }

    fn reject(&self, shared: &RouterShared, err: TransitionError) -> Result<Self, TransitionError> {
        *self.inner.rejection.lock() = Some(err.clone());
        {
            let mut globals = shared.globals.lock();
            if globals.active == Some(self.id()) {
                globals.active = None;
            }
        }
        tracing::debug!(transition = self.id(), error = %err, kind = ?err.kind(), "transition rejected");
        if !err.is_silent() {
            self.run_sync(shared, TransitionHookPhase::Error);
        }
        Err(err)
    }

    fn commit(&self, shared: &RouterShared) -> Result<Self, TransitionError> {
        {
            let mut globals = shared.globals.lock();
            if globals.active != Some(self.id()) {
                drop(globals);
                return Err(self.supersede());
            }
            globals.active = None;
            globals.current = self.inner.changes.to.clone();
            globals.params = self.inner.params.clone();
            let resolved = self.inner.resolved.lock();
            globals.resolved = self
                .inner
                .changes
                .to
                .iter()
                .filter_map(|n| resolved.get(n.name()).map(|v| (n.name().to_owned(), v.clone())))
                .collect();
            globals.successful.enqueue(self.clone());
        }
        self.inner.succeeded.store(true, Ordering::Release);
        tracing::info!(
            transition = self.id(),
            from = self.from().map(|s| s.name()),
            to = self.to().map(|s| s.name()),
            "transition succeeded"
        );
        self.run_sync(shared, TransitionHookPhase::Success);
        Ok(self.clone())
    }

    /// Unique (per router) id.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Whether creation found no problem.
    pub fn valid(&self) -> bool {
        self.inner.error.lock().is_none()
    }

    /// Why the transition is invalid, if it is.
    pub fn error(&self) -> Option<TransitionError> {
        self.inner.error.lock().clone()
    }

    /// Why the transition did not succeed, once it has finished.
    pub fn rejection(&self) -> Option<TransitionError> {
        self.inner.rejection.lock().clone()
    }

    /// Whether the transition committed.
    pub fn succeeded(&self) -> bool {
        self.inner.succeeded.load(Ordering::Acquire)
    }

    /// Whether this is the router's in-flight transition.
    pub fn is_active(&self) -> bool {
        self.inner
            .router
            .upgrade()
            .is_some_and(|shared| self.is_active_in(&shared))
    }

    /// The target state; `None` for an invalid target.
    pub fn to(&self) -> Option<&Arc<StateObject>> {
        self.inner.changes.to_state()
    }

    /// The state the transition starts from.
    pub fn from(&self) -> Option<&Arc<StateObject>> {
        self.inner.changes.from_state()
    }

    /// Target param values, defaults applied.
    pub fn params(&self) -> &ParamValues {
        &self.inner.params
    }

    /// Param values of the starting path.
    pub fn from_params(&self) -> &ParamValues {
        &self.inner.from_params
    }

    /// Every path of the transition.
    pub fn tree_changes(&self) -> &TreeChanges {
        &self.inner.changes
    }

    /// One path of the transition.
    pub fn path(&self, kind: PathKind) -> &[PathNode] {
        self.inner.changes.path(kind)
    }

    /// States being entered, outermost first.
    pub fn entering(&self) -> &[PathNode] {
        &self.inner.changes.entering
    }

    /// States being exited, innermost first.
    pub fn exiting(&self) -> &[PathNode] {
        &self.inner.changes.exiting
    }

    /// States kept across the transition.
    pub fn retained(&self) -> &[PathNode] {
        &self.inner.changes.retained
    }

    /// The requested target.
    pub fn target(&self) -> &TargetState {
        &self.inner.target
    }

    /// Options of this transition.
    pub fn options(&self) -> &TransitionOptions {
        &self.inner.target.options
    }

    /// The transition that redirected to this one.
    pub fn redirected_from(&self) -> Option<&Self> {
        self.inner.redirected_from.as_ref()
    }

    /// How many redirects led to this transition.
    pub fn redirect_count(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.redirected_from();
        while let Some(t) = cursor {
            count += 1;
            cursor = t.redirected_from();
        }
        count
    }

    /// Whether the transition would change nothing: same state, same params,
    /// and no reload.
    pub fn is_noop(&self) -> bool {
        let changes = &self.inner.changes;
        if self.options().has(TransitionFlags::RELOAD)
            || !changes.exiting.is_empty()
            || !changes.entering.is_empty()
        {
            return false;
        }
        match self.to() {
            Some(to) => Param::values_equal(to.params(), &self.inner.params, &self.inner.from_params),
            None => false,
        }
    }

    /// A resolved value by token, looking from the target state up to the root.
    pub fn resolved(&self, token: &str) -> Option<Value> {
        let resolved = self.inner.resolved.lock();
        self.inner
            .changes
            .to
            .iter()
            .rev()
            .find_map(|n| resolved.get(n.name()).and_then(|m| m.get(token)).cloned())
    }

    /// A resolved value of one state.
    pub fn resolved_for(&self, state: &str, token: &str) -> Option<Value> {
        self.inner
            .resolved
            .lock()
            .get(state)
            .and_then(|m| m.get(token))
            .cloned()
    }

    pub(crate) fn store_resolved(&self, state: &str, token: &str, value: Value) {
        self.inner
            .resolved
            .lock()
            .entry(state.to_owned())
            .or_default()
            .insert(token.to_owned(), value);
    }

    /// Values resolved for `state` and its ancestors; nearer states win.
    pub(crate) fn upstream(&self, state: &StateObject) -> BTreeMap<String, Value> {
        let resolved = self.inner.resolved.lock();
        let mut merged = BTreeMap::new();
        for name in state.path() {
            if let Some(values) = resolved.get(name) {
                merged.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        merged
    }
}

fn warn_deferred(planned: &PlannedHook) {
    tracing::warn!(
        hook = %planned.hook.name(),
        event = planned.event.name(),
        "synchronous hook returned a deferred result; ignoring it"
    );
}

fn hook_failure(hook: String, err: HookError, deferred: bool) -> TransitionError {
    match err {
        HookError::Rejection(rejection) => *rejection,
        err if deferred => TransitionError::HookRejected {
            hook,
            source: Arc::new(err),
        },
        err => TransitionError::HookThrew {
            hook,
            source: Arc::new(err),
        },
    }
}

fn resolve_target(
    registry: &StateRegistry,
    from: &[PathNode],
    target: &TargetState,
) -> Result<(Vec<PathNode>, ParamValues), InvalidReason> {
    let state = registry
        .find(&target.state, target.relative_to.as_deref())
        .map_err(|_| InvalidReason::NoSuchState(target.state.clone()))?;
    if state.is_abstract() {
        return Err(InvalidReason::AbstractTarget(state.name().to_owned()));
    }
    let mut explicit = target.params.clone();
    if target.options.has(TransitionFlags::INHERIT) {
        for name in state.path() {
            let Some(owner) = registry.get(name) else {
                continue;
            };
            let Some(old) = from.iter().find(|n| n.name() == owner.name()) else {
                continue;
            };
            for param in owner.own_params().iter().filter(|p| p.inherits()) {
                if explicit.contains_key(param.id()) {
                    continue;
                }
                if let Some(value) = old.params.get(param.id()) {
                    explicit.insert(param.id().to_owned(), value.clone());
                }
            }
        }
    }
    let params = state.param_values(&explicit);
    let invalid: Vec<String> = Param::invalid(state.params(), &params)
        .into_iter()
        .map(|p| p.id().to_owned())
        .collect();
    if !invalid.is_empty() {
        return Err(InvalidReason::InvalidParams {
            state: state.name().to_owned(),
            params: invalid,
        });
    }
    let path = build_path(&state, &params, |n| registry.get(n));
    Ok((path, params))
}
