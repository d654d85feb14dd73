// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hook kinds.
//!
//! A [`TransitionEventType`] says when hooks of one kind run (phase and
//! order), which path their criteria are matched against, and what happens to
//! their results and errors. The nine built-in kinds are:
//!
//! | name        | phase   | order | path     | notes                         |
//! |-------------|---------|-------|----------|-------------------------------|
//! | `on_create` | Create  | 0     | to       | synchronous, errors throw     |
//! | `on_before` | Before  | 0     | to       |                               |
//! | `on_start`  | Run     | 0     | to       |                               |
//! | `on_exit`   | Run     | 100   | exiting  | deeper states first           |
//! | `on_retain` | Run     | 200   | retained |                               |
//! | `on_enter`  | Run     | 300   | entering |                               |
//! | `on_finish` | Run     | 400   | to       |                               |
//! | `on_success`| Success | 0     | to       | synchronous, results logged   |
//! | `on_error`  | Error   | 0     | to       | synchronous, results logged   |

use std::sync::Arc;

use crate::types::{HookScope, PathKind, TransitionHookPhase};

/// What to do with a hook's successful return value.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ResultPolicy {
    /// Aborts reject the transition and redirects supersede it.
    #[default]
    HandleResult,
    /// Aborts and redirects are logged and otherwise ignored.
    LogRejected,
}

/// What to do when a hook fails.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ErrorPolicy {
    /// Reject the transition with the error.
    #[default]
    Reject,
    /// Log the error and continue.
    Log,
    /// Mark the transition invalid with the error (creation-time hooks).
    Throw,
}

/// Descriptor of one hook kind. Immutable once defined on a router.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionEventType {
    name: Arc<str>,
    phase: TransitionHookPhase,
    hook_order: i32,
    criteria_path: PathKind,
    reverse_sort: bool,
    synchronous: bool,
    result_policy: ResultPolicy,
    error_policy: ErrorPolicy,
}

impl TransitionEventType {
    /// An asynchronous event type with default policies.
    pub fn new(
        name: impl Into<Arc<str>>,
        phase: TransitionHookPhase,
        hook_order: i32,
        criteria_path: PathKind,
    ) -> Self {
        Self {
            name: name.into(),
            phase,
            hook_order,
            criteria_path,
            reverse_sort: false,
            synchronous: false,
            result_policy: ResultPolicy::default(),
            error_policy: ErrorPolicy::default(),
        }
    }

    /// Order deeper states first.
    pub fn reverse_sort(mut self) -> Self {
        self.reverse_sort = true;
        self
    }

    /// Hooks must settle without suspending.
    pub fn synchronous(mut self) -> Self {
        self.synchronous = true;
        self
    }

    /// Set the result policy.
    pub fn with_result_policy(mut self, policy: ResultPolicy) -> Self {
        self.result_policy = policy;
        self
    }

    /// Set the error policy.
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Name used to register hooks.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Phase.
    pub fn phase(&self) -> TransitionHookPhase {
        self.phase
    }

    /// Lower runs first within a phase.
    pub fn hook_order(&self) -> i32 {
        self.hook_order
    }

    /// Path the criteria are matched against and hooks are invoked for.
    pub fn criteria_path(&self) -> PathKind {
        self.criteria_path
    }

    /// Scope derived from the criteria path.
    pub fn scope(&self) -> HookScope {
        self.criteria_path.scope()
    }

    /// Whether deeper states run first.
    pub fn is_reverse_sort(&self) -> bool {
        self.reverse_sort
    }

    /// Whether hooks must not suspend.
    pub fn is_synchronous(&self) -> bool {
        self.synchronous
    }

    /// Result policy.
    pub fn result_policy(&self) -> ResultPolicy {
        self.result_policy
    }

    /// Error policy.
    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }
}

/// Names of the built-in event types.
pub mod names {
    /// Creation.
    pub const ON_CREATE: &str = "on_create";
    /// Before the pipeline.
    pub const ON_BEFORE: &str = "on_before";
    /// Pipeline start.
    pub const ON_START: &str = "on_start";
    /// Per exited state.
    pub const ON_EXIT: &str = "on_exit";
    /// Per retained state.
    pub const ON_RETAIN: &str = "on_retain";
    /// Per entered state.
    pub const ON_ENTER: &str = "on_enter";
    /// Pipeline end.
    pub const ON_FINISH: &str = "on_finish";
    /// After commit.
    pub const ON_SUCCESS: &str = "on_success";
    /// After rejection.
    pub const ON_ERROR: &str = "on_error";
}

/// The built-in event types, in definition order.
pub fn builtin_event_types() -> Vec<TransitionEventType> {
    use ErrorPolicy::{Log, Throw};
    use PathKind::{Entering, Exiting, Retained, To};
    use ResultPolicy::LogRejected;
    use TransitionHookPhase::{Before, Create, Error, Run, Success};
    vec![
        TransitionEventType::new(names::ON_CREATE, Create, 0, To)
            .synchronous()
            .with_result_policy(LogRejected)
            .with_error_policy(Throw),
        TransitionEventType::new(names::ON_BEFORE, Before, 0, To),
        TransitionEventType::new(names::ON_START, Run, 0, To),
        TransitionEventType::new(names::ON_EXIT, Run, 100, Exiting).reverse_sort(),
        TransitionEventType::new(names::ON_RETAIN, Run, 200, Retained),
        TransitionEventType::new(names::ON_ENTER, Run, 300, Entering),
        TransitionEventType::new(names::ON_FINISH, Run, 400, To),
        TransitionEventType::new(names::ON_SUCCESS, Success, 0, To)
            .synchronous()
            .with_result_policy(LogRejected)
            .with_error_policy(Log),
        TransitionEventType::new(names::ON_ERROR, Error, 0, To)
            .synchronous()
            .with_result_policy(LogRejected)
            .with_error_policy(Log),
    ]
}

/// Event types of `phase`, by `hook_order`; equal orders keep definition order.
pub fn events_for_phase(
    types: &[Arc<TransitionEventType>],
    phase: TransitionHookPhase,
) -> Vec<Arc<TransitionEventType>> {
    let mut selected: Vec<_> = types.iter().filter(|t| t.phase == phase).cloned().collect();
    selected.sort_by_key(|t| t.hook_order);
    selected
}
