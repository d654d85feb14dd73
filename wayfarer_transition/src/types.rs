// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Small shared types: phases, path kinds, options and targets.

use serde_json::{Map, Value};
use wayfarer_params::ParamValues;

/// Coarse stage of a transition attempt.
///
/// `Success` and `Error` are mutually exclusive terminal phases.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum TransitionHookPhase {
    /// While the transition is being created. Synchronous.
    Create,
    /// Before anything is exited or entered.
    Before,
    /// The main pipeline: start, exit, retain, enter, finish.
    Run,
    /// After the transition committed.
    Success,
    /// After the transition was rejected.
    Error,
}

/// Which hooks an event type runs per invocation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum HookScope {
    /// One invocation per transition, matched against the tail of the path.
    Transition,
    /// One invocation per matched state in the path.
    State,
}

/// A path of a transition that criteria can be matched against.
///
/// There is no separate `all` path. The target path always has a tail, so an
/// event type on [`PathKind::To`] whose criteria leave every matcher unset
/// ([`HookMatchCriteria::any`](crate::HookMatchCriteria::any)) runs once for
/// every transition.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum PathKind {
    /// The target path, root to target.
    To,
    /// The current path, root to current state.
    From,
    /// States being exited, child to root.
    Exiting,
    /// States kept across the transition.
    Retained,
    /// States being entered, root to child.
    Entering,
}

impl PathKind {
    /// Every kind, in the order criteria are evaluated.
    pub const ALL: [Self; 5] = [
        Self::To,
        Self::From,
        Self::Exiting,
        Self::Retained,
        Self::Entering,
    ];

    /// `To` and `From` are transition-scoped; the others are state-scoped.
    pub fn scope(self) -> HookScope {
        match self {
            Self::To | Self::From => HookScope::Transition,
            Self::Exiting | Self::Retained | Self::Entering => HookScope::State,
        }
    }
}

bitflags::bitflags! {
    /// Per-transition switches.
    #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
    pub struct TransitionFlags: u8 {
        /// Exit and re-enter every state below the root, even if unchanged.
        const RELOAD = 1;
        /// Carry over param values from the current path when the target omits them.
        const INHERIT = 1 << 1;
        /// Ask the URL layer to update the location on success.
        const LOCATION = 1 << 2;
    }
}

impl Default for TransitionFlags {
    fn default() -> Self {
        Self::INHERIT | Self::LOCATION
    }
}

/// Options for one transition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitionOptions {
    /// Reload, inherit and location switches.
    pub flags: TransitionFlags,
    /// Reload from this state down, even if it would be retained.
    pub reload_state: Option<String>,
    /// Opaque values for hooks.
    pub custom: Map<String, Value>,
}

impl TransitionOptions {
    /// Default options with [`TransitionFlags::RELOAD`] set.
    pub fn reload() -> Self {
        Self {
            flags: TransitionFlags::default() | TransitionFlags::RELOAD,
            ..Self::default()
        }
    }

    /// Whether `flag` is set.
    pub fn has(&self, flag: TransitionFlags) -> bool {
        self.flags.contains(flag)
    }
}

/// Where a transition should go.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetState {
    /// State name; relative names (`^.sibling`, `.child`) need `relative_to`.
    pub state: String,
    /// Explicit param values.
    pub params: ParamValues,
    /// Options for the resulting transition.
    pub options: TransitionOptions,
    /// Base for relative names.
    pub relative_to: Option<String>,
}

impl TargetState {
    /// Target `state` with `params` and default options.
    pub fn new(state: impl Into<String>, params: ParamValues) -> Self {
        Self {
            state: state.into(),
            params,
            ..Self::default()
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: TransitionOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve relative names against `base`.
    pub fn relative_to(mut self, base: impl Into<String>) -> Self {
        self.relative_to = Some(base.into());
        self
    }
}
