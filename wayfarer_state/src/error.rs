// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use wayfarer_params::ParamError;

/// Errors raised while declaring, building, or looking up states.
#[derive(Clone, Debug, thiserror::Error)]
pub enum StateError {
    /// A declaration had an empty name.
    #[error("state name must not be empty")]
    EmptyName,
    /// A name contained an empty segment or a wildcard.
    #[error("invalid state name '{0}'")]
    InvalidName(String),
    /// The name is already registered or queued.
    #[error("state '{0}' is already registered")]
    DuplicateState(String),
    /// The state is queued waiting for a parent that has not been registered.
    #[error("state '{name}' is waiting for unregistered parent '{parent}'")]
    UnresolvedParent {
        /// Queued state.
        name: String,
        /// Missing parent.
        parent: String,
    },
    /// No registered state has this name.
    #[error("no state named '{0}'")]
    NotFound(String),
    /// The implicit root cannot be removed.
    #[error("the root state cannot be deregistered")]
    RootState,
    /// A URL pattern could not be parsed or compiled.
    #[error("invalid url pattern '{url}': {reason}")]
    InvalidUrl {
        /// Pattern text.
        url: String,
        /// What went wrong.
        reason: String,
    },
    /// A param id appears twice along a state's URL.
    #[error("duplicate parameter '{0}' in url")]
    DuplicateParam(String),
    /// A relative name climbed above the root or had no base state.
    #[error("relative name '{name}' cannot be resolved from '{base}'")]
    InvalidRelativeName {
        /// The relative name.
        name: String,
        /// The base state, empty when none was given.
        base: String,
    },
    /// Declarations queued behind a parent failed to build once the parent
    /// arrived. Each entry names the dropped declaration and its error.
    #[error("{} queued state(s) failed to build, first '{}': {}", .0.len(), first_name(.0), first_error(.0))]
    QueuedBuildsFailed(Vec<(String, StateError)>),
    /// A param declaration was rejected.
    #[error(transparent)]
    Param(#[from] ParamError),
}

fn first_name(failures: &[(String, StateError)]) -> &str {
    failures.first().map_or("", |(name, _)| name)
}

fn first_error(failures: &[(String, StateError)]) -> String {
    failures
        .first()
        .map_or_else(String::new, |(_, err)| err.to_string())
}
