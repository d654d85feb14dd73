// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Why a transition did not succeed.

use std::sync::Arc;

use wayfarer_state::ResolveError;

use crate::hook::HookError;

/// Why a transition is invalid.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum InvalidReason {
    /// The target name does not resolve to a registered state.
    #[error("no such state `{0}`")]
    NoSuchState(String),
    /// The target is abstract.
    #[error("cannot transition to abstract state `{0}`")]
    AbstractTarget(String),
    /// Some target param values do not validate.
    #[error("param values for `{state}` do not validate: {}", params.join(", "))]
    InvalidParams {
        /// Target state.
        state: String,
        /// Ids of the failing params.
        params: Vec<String>,
    },
}

/// A transition rejection.
#[derive(Clone, Debug, thiserror::Error)]
pub enum TransitionError {
    /// The transition was invalid from the start.
    #[error("invalid transition: {0}")]
    Invalid(InvalidReason),
    /// A hook returned an abort.
    #[error("transition aborted by hook `{hook}`")]
    Aborted {
        /// Hook name.
        hook: String,
    },
    /// A hook's deferred result failed.
    #[error("hook `{hook}` rejected the transition: {source}")]
    HookRejected {
        /// Hook name.
        hook: String,
        /// The failure.
        source: Arc<HookError>,
    },
    /// A hook failed without suspending.
    #[error("hook `{hook}` failed: {source}")]
    HookThrew {
        /// Hook name.
        hook: String,
        /// The failure.
        source: Arc<HookError>,
    },
    /// A newer transition started while this one was running.
    #[error("transition superseded by a newer transition")]
    Superseded,
    /// A hook redirected; the redirect replaced this transition.
    #[error("transition redirected to `{0}`")]
    Redirected(String),
    /// Already at the target with the same params.
    #[error("transition ignored: target is the current state with the same params")]
    Ignored,
    /// Redirects chained past the configured limit.
    #[error("too many redirects (limit {0})")]
    TooManyRedirects(usize),
    /// A resolvable failed.
    #[error("resolving `{token}` for state `{state}` failed: {source}")]
    Resolve {
        /// Owning state.
        state: String,
        /// Resolvable token.
        token: String,
        /// The resolver's error.
        source: ResolveError,
    },
}

/// Coarse classification of a [`TransitionError`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum RejectionKind {
    /// Replaced by a newer or redirected transition. Silent.
    Superseded,
    /// Aborted by a hook.
    Aborted,
    /// Invalid target or params.
    Invalid,
    /// No-op transition. Silent.
    Ignored,
    /// Any other failure.
    Error,
}

impl TransitionError {
    /// Classify this rejection.
    pub fn kind(&self) -> RejectionKind {
        match self {
            Self::Invalid(_) => RejectionKind::Invalid,
            Self::Aborted { .. } => RejectionKind::Aborted,
            Self::Superseded | Self::Redirected(_) => RejectionKind::Superseded,
            Self::Ignored => RejectionKind::Ignored,
            Self::HookRejected { .. }
            | Self::HookThrew { .. }
            | Self::TooManyRedirects(_)
            | Self::Resolve { .. } => RejectionKind::Error,
        }
    }

    /// Whether ERROR-phase hooks should see this rejection.
    pub fn is_silent(&self) -> bool {
        matches!(
            self.kind(),
            RejectionKind::Superseded | RejectionKind::Ignored
        )
    }

    /// Whether this rejection came from a redirect.
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirected(_))
    }
}
