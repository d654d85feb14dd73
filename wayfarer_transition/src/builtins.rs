// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hooks every router starts with.

use std::sync::Arc;

use crate::criteria::{HookMatchCriteria, StateMatcher};
use crate::event_type::names;
use crate::hook::{HookContext, HookOptions, HookRegistry, HookResult, IntoHookResult};
use crate::rejection::TransitionError;
use crate::resolve;
use crate::types::TargetState;

/// Ahead of every other hook.
const INVALID_PRIORITY: i32 = i32::MAX;
const IGNORED_PRIORITY: i32 = i32::MAX - 1;
/// Ahead of eager resolves, so a redirecting state resolves nothing.
const REDIRECT_PRIORITY: i32 = 2000;

fn reject_invalid(ctx: &HookContext<'_>) -> HookResult {
    match ctx.transition.error() {
        Some(err) => Err(err.into()),
        None => ().into_hook_result(),
    }
}

fn ignore_noop(ctx: &HookContext<'_>) -> HookResult {
    if ctx.transition.is_noop() {
        Err(TransitionError::Ignored.into())
    } else {
        ().into_hook_result()
    }
}

fn follow_redirect_to(ctx: &HookContext<'_>) -> HookResult {
    let Some(state) = ctx.state else {
        return ().into_hook_result();
    };
    let Some(redirect) = state.redirect_to() else {
        return ().into_hook_result();
    };
    let mut params = ctx.transition.params().clone();
    params.extend(redirect.params.iter().map(|(k, v)| (k.clone(), v.clone())));
    TargetState::new(redirect.state.clone(), params)
        .relative_to(state.name())
        .into_hook_result()
}

/// Register the built-in hooks. Must run before any application hook.
pub(crate) fn install(hooks: &mut HookRegistry) {
    hooks.add(
        names::ON_BEFORE.into(),
        HookMatchCriteria::any(),
        Arc::new(reject_invalid),
        HookOptions::priority(INVALID_PRIORITY).named("invalid_transition"),
    );
    hooks.add(
        names::ON_BEFORE.into(),
        HookMatchCriteria::any(),
        Arc::new(ignore_noop),
        HookOptions::priority(IGNORED_PRIORITY).named("ignored_transition"),
    );
    hooks.add(
        names::ON_START.into(),
        HookMatchCriteria::any().to(StateMatcher::predicate(|state, _| state.redirect_to().is_some())),
        Arc::new(follow_redirect_to),
        HookOptions::priority(REDIRECT_PRIORITY).named("redirect_to"),
    );
    resolve::install(hooks);
}
