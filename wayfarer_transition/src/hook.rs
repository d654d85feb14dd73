// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hook callbacks, their results, and the hook registry.
//!
//! A hook is a callback registered for one event type with a
//! [`HookMatchCriteria`]. It returns a [`HookResult`]: either a settled
//! [`HookOutcome`] or a deferred one that the pipeline awaits before running
//! the next hook. Any type implementing [`IntoHookResult`] can be returned
//! from a callback, so `()`, `bool`, a [`TargetState`] or a `Result` of those
//! all work.

use core::fmt;
use core::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use wayfarer_state::StateObject;

use crate::criteria::HookMatchCriteria;
use crate::rejection::TransitionError;
use crate::transition::Transition;
use crate::types::TargetState;

/// What a hook decided.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum HookOutcome {
    /// Carry on with the next hook.
    #[default]
    Continue,
    /// Reject the transition as aborted.
    Abort,
    /// Replace the transition with one to this target.
    Redirect(TargetState),
}

/// A settled outcome, or a future producing one.
pub enum HookReturn {
    /// Already decided.
    Settled(HookOutcome),
    /// Decided once the future completes.
    Deferred(BoxFuture<'static, Result<HookOutcome, HookError>>),
}

impl fmt::Debug for HookReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Settled(o) => f.debug_tuple("Settled").field(o).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl HookReturn {
    /// Wrap a future.
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = Result<HookOutcome, HookError>> + Send + 'static,
    {
        Self::Deferred(future.boxed())
    }
}

impl From<HookOutcome> for HookReturn {
    fn from(outcome: HookOutcome) -> Self {
        Self::Settled(outcome)
    }
}

/// Result of one hook invocation.
pub type HookResult = Result<HookReturn, HookError>;

/// A hook failure.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// A plain message.
    #[error("{0}")]
    Message(String),
    /// Any other error.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
    /// A typed rejection, passed through unchanged.
    #[error(transparent)]
    Rejection(Box<TransitionError>),
}

impl HookError {
    /// A failure with a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Wrap any error.
    pub fn other(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<TransitionError> for HookError {
    fn from(err: TransitionError) -> Self {
        Self::Rejection(Box::new(err))
    }
}

/// Conversion from callback return values to a [`HookResult`].
pub trait IntoHookResult {
    /// Convert.
    fn into_hook_result(self) -> HookResult;
}

impl IntoHookResult for HookResult {
    fn into_hook_result(self) -> HookResult {
        self
    }
}

impl IntoHookResult for HookReturn {
    fn into_hook_result(self) -> HookResult {
        Ok(self)
    }
}

impl IntoHookResult for HookOutcome {
    fn into_hook_result(self) -> HookResult {
        Ok(HookReturn::Settled(self))
    }
}

impl IntoHookResult for () {
    fn into_hook_result(self) -> HookResult {
        HookOutcome::Continue.into_hook_result()
    }
}

impl IntoHookResult for bool {
    fn into_hook_result(self) -> HookResult {
        let outcome = if self {
            HookOutcome::Continue
        } else {
            HookOutcome::Abort
        };
        outcome.into_hook_result()
    }
}

impl IntoHookResult for TargetState {
    fn into_hook_result(self) -> HookResult {
        HookOutcome::Redirect(self).into_hook_result()
    }
}

impl IntoHookResult for Result<(), HookError> {
    fn into_hook_result(self) -> HookResult {
        self.and_then(IntoHookResult::into_hook_result)
    }
}

impl IntoHookResult for Result<bool, HookError> {
    fn into_hook_result(self) -> HookResult {
        self.and_then(IntoHookResult::into_hook_result)
    }
}

impl IntoHookResult for Result<HookOutcome, HookError> {
    fn into_hook_result(self) -> HookResult {
        self.and_then(IntoHookResult::into_hook_result)
    }
}

/// What a hook sees.
#[derive(Debug)]
pub struct HookContext<'a> {
    /// The running transition. Clone it to use it from a deferred result.
    pub transition: &'a Transition,
    /// The matched state for state-scoped event types.
    pub state: Option<&'a Arc<StateObject>>,
    /// Name of the event type being run.
    pub event: &'a str,
}

pub(crate) type HookFn = Arc<dyn Fn(&HookContext<'_>) -> HookResult + Send + Sync>;

/// Per-hook registration options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HookOptions {
    /// Higher runs first among hooks for the same event type and state depth.
    pub priority: i32,
    /// Name used in errors and logs.
    pub name: Option<String>,
    /// Stop invoking the hook after this many invocations.
    pub invoke_limit: Option<usize>,
}

impl HookOptions {
    /// Options with `priority`.
    pub fn priority(priority: i32) -> Self {
        Self {
            priority,
            ..Self::default()
        }
    }

    /// Set the name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the invocation limit.
    pub fn invoke_limit(mut self, limit: usize) -> Self {
        self.invoke_limit = Some(limit);
        self
    }
}

/// Handle for removing a registered hook.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct HookId(u64);

pub(crate) struct RegisteredHook {
    pub(crate) id: HookId,
    pub(crate) event: Arc<str>,
    pub(crate) criteria: HookMatchCriteria,
    pub(crate) callback: HookFn,
    pub(crate) options: HookOptions,
    invocations: AtomicUsize,
}

impl fmt::Debug for RegisteredHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredHook")
            .field("id", &self.id)
            .field("event", &self.event)
            .field("criteria", &self.criteria)
            .field("options", &self.options)
            .field("invocations", &self.invocations)
            .finish_non_exhaustive()
    }
}

impl RegisteredHook {
    pub(crate) fn name(&self) -> String {
        match &self.options.name {
            Some(name) => name.clone(),
            None => format!("{}#{}", self.event, self.id.0),
        }
    }

    pub(crate) fn seq(&self) -> u64 {
        self.id.0
    }

    pub(crate) fn exhausted(&self) -> bool {
        self.options
            .invoke_limit
            .is_some_and(|limit| self.invocations.load(Ordering::Acquire) >= limit)
    }

    /// Claim one invocation and run the callback; `None` once the limit is spent.
    ///
    /// The claim is atomic, so a hook planned for several states of one
    /// transition still stops at its limit.
    pub(crate) fn invoke(&self, ctx: &HookContext<'_>) -> Option<HookResult> {
        let claimed = match self.options.invoke_limit {
            Some(limit) => self
                .invocations
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                    (n < limit).then_some(n + 1)
                })
                .is_ok(),
            None => {
                self.invocations.fetch_add(1, Ordering::AcqRel);
                true
            }
        };
        claimed.then(|| (self.callback)(ctx))
    }
}

/// Every registered hook, in registration order.
#[derive(Debug, Default)]
pub struct HookRegistry {
    hooks: Vec<Arc<RegisteredHook>>,
    next: u64,
}

impl HookRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(
        &mut self,
        event: Arc<str>,
        criteria: HookMatchCriteria,
        callback: HookFn,
        options: HookOptions,
    ) -> HookId {
        let id = HookId(self.next);
        self.next += 1;
        tracing::debug!(event = %event, id = id.0, priority = options.priority, "registered hook");
        self.hooks.push(Arc::new(RegisteredHook {
            id,
            event,
            criteria,
            callback,
            options,
            invocations: AtomicUsize::new(0),
        }));
        id
    }

    /// Remove a hook, returning whether it was registered.
    pub fn remove(&mut self, id: HookId) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|h| h.id != id);
        before != self.hooks.len()
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub(crate) fn hooks_for(&self, event: &str) -> Vec<Arc<RegisteredHook>> {
        self.hooks
            .iter()
            .filter(|h| &*h.event == event && !h.exhausted())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> HookFn {
        Arc::new(|_: &HookContext<'_>| ().into_hook_result())
    }

    #[test]
    fn return_values_convert() {
        assert!(matches!(
            true.into_hook_result(),
            Ok(HookReturn::Settled(HookOutcome::Continue))
        ));
        assert!(matches!(
            false.into_hook_result(),
            Ok(HookReturn::Settled(HookOutcome::Abort))
        ));
        assert!(matches!(
            TargetState::new("home", wayfarer_params::ParamValues::new()).into_hook_result(),
            Ok(HookReturn::Settled(HookOutcome::Redirect(t))) if t.state == "home"
        ));
        assert!(matches!(
            Err::<(), _>(HookError::message("x")).into_hook_result(),
            Err(HookError::Message(m)) if m == "x"
        ));
    }

    #[test]
    fn registry_filters_by_event_and_removes() {
        let mut reg = HookRegistry::new();
        let a = reg.add(
            "on_enter".into(),
            HookMatchCriteria::default(),
            noop(),
            HookOptions::default(),
        );
        let b = reg.add(
            "on_exit".into(),
            HookMatchCriteria::default(),
            noop(),
            HookOptions::priority(3).named("leave"),
        );
        assert_eq!(reg.len(), 2);
        let exit = reg.hooks_for("on_exit");
        assert_eq!(exit.len(), 1);
        assert_eq!(exit[0].name(), "leave");
        assert_eq!(reg.hooks_for("on_enter")[0].name(), "on_enter#0");
        assert!(reg.remove(a));
        assert!(!reg.remove(a));
        assert!(reg.hooks_for("on_enter").is_empty());
        assert!(reg.remove(b));
        assert!(reg.is_empty());
    }
}
