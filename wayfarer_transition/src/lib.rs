// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wayfarer Transition: the transition pipeline.
//!
//! ## Overview
//!
//! A transition moves the application from its current path in the state
//! tree to a target path. The crate computes the minimal diff between the two
//! paths ([`TreeChanges`]) and runs the registered hooks for it in a fixed,
//! deterministic order. Hooks may pass, abort, fail, or redirect; only when
//! every hook passed does the router's current location change.
//!
//! ## Phases and event types
//!
//! Every hook belongs to an event type ([`TransitionEventType`]) which fixes
//! its phase and its order within the phase:
//!
//! - CREATE: `on_create`, synchronous, while the transition is built.
//! - BEFORE: `on_before`, before anything is exited or entered.
//! - RUN: `on_start`, `on_exit` (deepest first), `on_retain`, `on_enter`
//!   (outermost first), `on_finish`.
//! - SUCCESS or ERROR: `on_success` / `on_error`, synchronous, terminal.
//!
//! Applications may define their own event types with
//! [`Router::define_event`] and register hooks for them with [`Router::on`].
//!
//! ## Ordering
//!
//! Within a phase, hooks run by event type order, then by state depth, then
//! by priority (higher first), then in registration order. Hooks run strictly
//! one after another; a deferred result is awaited before the next hook
//! starts.
//!
//! ## Supersession
//!
//! Starting a transition makes it the router's active one. A transition that
//! is no longer active stops before its next hook and resolves with
//! [`TransitionError::Superseded`] without running ERROR hooks.
//!
//! ## Minimal example
//!
//! ```
//! use futures::executor::block_on;
//! use wayfarer_params::ParamValues;
//! use wayfarer_state::StateDeclaration;
//! use wayfarer_transition::{HookMatchCriteria, HookOptions, Router, TransitionError};
//!
//! let router = Router::new().unwrap();
//! router.register(StateDeclaration::new("home")).unwrap();
//! router.register(StateDeclaration::new("admin")).unwrap();
//!
//! // Keep everyone out of admin.
//! router.on_before(HookMatchCriteria::any().to("admin"), |_| false, HookOptions::default());
//!
//! block_on(router.go("home", ParamValues::new())).unwrap();
//! let denied = block_on(router.go("admin", ParamValues::new()));
//! assert!(matches!(denied, Err(TransitionError::Aborted { .. })));
//! assert_eq!(router.current_state().name(), "home");
//! ```

mod builtins;
pub mod config;
pub mod criteria;
pub mod event_type;
pub mod hook;
mod hook_builder;
pub mod path;
pub mod rejection;
mod resolve;
pub mod router;
pub mod transition;
pub mod types;

pub use config::RouterConfig;
pub use criteria::{HookMatchCriteria, MatchedNodes, StateMatcher};
pub use event_type::{ErrorPolicy, ResultPolicy, TransitionEventType, builtin_event_types};
pub use hook::{
    HookContext, HookError, HookId, HookOptions, HookOutcome, HookRegistry, HookResult,
    HookReturn, IntoHookResult,
};
pub use path::{PathNode, TreeChanges, build_path};
pub use rejection::{InvalidReason, RejectionKind, TransitionError};
pub use router::{Router, RouterError};
pub use transition::Transition;
pub use types::{
    HookScope, PathKind, TargetState, TransitionFlags, TransitionHookPhase, TransitionOptions,
};
