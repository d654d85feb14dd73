// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fetching resolvables during a transition.
//!
//! Eager resolvables of the whole target path are fetched when the RUN phase
//! starts; lazy ones just before their state is entered. Ancestors always
//! resolve before descendants, and each resolver sees the values already
//! resolved for its state's ancestors. Values of retained states are carried
//! over from the previous successful transition and are not fetched again.

use std::sync::Arc;

use wayfarer_state::{ResolveArgs, ResolvePolicy, StateObject};

use crate::criteria::HookMatchCriteria;
use crate::event_type::names;
use crate::hook::{HookContext, HookError, HookOptions, HookOutcome, HookRegistry, HookReturn};
use crate::rejection::TransitionError;
use crate::transition::Transition;

/// Runs ahead of application `on_start` hooks, after redirects.
pub(crate) const EAGER_PRIORITY: i32 = 1000;
/// Runs ahead of application `on_enter` hooks for the same state.
pub(crate) const LAZY_PRIORITY: i32 = 1000;

/// Fetch the resolvables of `state` not yet resolved for `transition`,
/// optionally only those with `policy`.
pub(crate) async fn resolve_state(
    transition: &Transition,
    state: &StateObject,
    policy: Option<ResolvePolicy>,
) -> Result<(), TransitionError> {
    for resolvable in state.resolvables() {
        if policy.is_some_and(|p| p != resolvable.policy()) {
            continue;
        }
        if transition
            .resolved_for(state.name(), resolvable.token())
            .is_some()
        {
            continue;
        }
        let upstream = transition.upstream(state);
        let future = resolvable.resolve(ResolveArgs {
            state: state.name(),
            params: transition.params(),
            upstream: &upstream,
        });
        tracing::trace!(state = state.name(), token = resolvable.token(), "resolving");
        let value = future.await.map_err(|source| TransitionError::Resolve {
            state: state.name().to_owned(),
            token: resolvable.token().to_owned(),
            source,
        })?;
        transition.store_resolved(state.name(), resolvable.token(), value);
    }
    Ok(())
}

fn eager(ctx: &HookContext<'_>) -> Result<HookReturn, HookError> {
    let transition = ctx.transition.clone();
    Ok(HookReturn::deferred(async move {
        let path: Vec<Arc<StateObject>> = transition
            .tree_changes()
            .to
            .iter()
            .map(|n| n.state.clone())
            .collect();
        for state in path {
            resolve_state(&transition, &state, Some(ResolvePolicy::Eager)).await?;
        }
        Ok(HookOutcome::Continue)
    }))
}

fn lazy(ctx: &HookContext<'_>) -> Result<HookReturn, HookError> {
    let Some(state) = ctx.state.cloned() else {
        return Ok(HookOutcome::Continue.into());
    };
    if state.resolvables().is_empty() {
        return Ok(HookOutcome::Continue.into());
    }
    let transition = ctx.transition.clone();
    Ok(HookReturn::deferred(async move {
        resolve_state(&transition, &state, None).await?;
        Ok(HookOutcome::Continue)
    }))
}

pub(crate) fn install(hooks: &mut HookRegistry) {
    hooks.add(
        names::ON_START.into(),
        HookMatchCriteria::any(),
        Arc::new(eager),
        HookOptions::priority(EAGER_PRIORITY).named("eager_resolve"),
    );
    hooks.add(
        names::ON_ENTER.into(),
        HookMatchCriteria::any(),
        Arc::new(lazy),
        HookOptions::priority(LAZY_PRIORITY).named("lazy_resolve"),
    );
}
