// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turning registered hooks into the ordered invocation list for one phase.
//!
//! Ordering, from most to least significant:
//! 1. event type `hook_order` (definition order breaks ties),
//! 2. state depth, shallow first, or deep first for `reverse_sort` event types,
//! 3. hook priority, higher first,
//! 4. registration order.

use std::sync::Arc;

use wayfarer_state::StateObject;

use crate::event_type::{TransitionEventType, events_for_phase};
use crate::hook::{HookRegistry, RegisteredHook};
use crate::transition::Transition;
use crate::types::{HookScope, TransitionHookPhase};

/// One hook invocation, ready to run.
#[derive(Clone, Debug)]
pub(crate) struct PlannedHook {
    pub(crate) hook: Arc<RegisteredHook>,
    pub(crate) event: Arc<TransitionEventType>,
    pub(crate) state: Option<Arc<StateObject>>,
    depth: usize,
}

pub(crate) type Snapshot = Vec<(Arc<TransitionEventType>, Vec<Arc<RegisteredHook>>)>;

/// The event types of `phase` in order, each with its live hooks.
///
/// Taken while the registries are locked; matching happens afterwards in
/// [`plan`], so criteria predicates may use the router freely. Hooks
/// registered after the snapshot are not part of the plan.
pub(crate) fn snapshot(
    phase: TransitionHookPhase,
    event_types: &[Arc<TransitionEventType>],
    hooks: &HookRegistry,
) -> Snapshot {
    events_for_phase(event_types, phase)
        .into_iter()
        .map(|event| {
            let registered = hooks.hooks_for(event.name());
            (event, registered)
        })
        .collect()
}

/// Match a snapshot against `transition` and order the invocations.
pub(crate) fn plan(snapshot: Snapshot, transition: &Transition) -> Vec<PlannedHook> {
    let changes = transition.tree_changes();
    let mut planned = Vec::new();
    for (event, registered) in snapshot {
        let mut batch = Vec::new();
        for hook in registered {
            let Some(matched) = hook.criteria.matches(changes, transition) else {
                continue;
            };
            let nodes = matched.nodes(event.criteria_path());
            match event.scope() {
                HookScope::Transition => batch.push(PlannedHook {
                    hook: hook.clone(),
                    event: event.clone(),
                    state: nodes.last().map(|n| n.state.clone()),
                    depth: 0,
                }),
                HookScope::State => batch.extend(nodes.iter().map(|n| PlannedHook {
                    hook: hook.clone(),
                    event: event.clone(),
                    state: Some(n.state.clone()),
                    depth: n.state.depth(),
                })),
            }
        }
        let reverse = event.is_reverse_sort();
        batch.sort_by(|a, b| {
            let depth = if reverse {
                b.depth.cmp(&a.depth)
            } else {
                a.depth.cmp(&b.depth)
            };
            depth
                .then(b.hook.options.priority.cmp(&a.hook.options.priority))
                .then(a.hook.seq().cmp(&b.hook.seq()))
        });
        planned.extend(batch);
    }
    planned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::HookMatchCriteria;
    use crate::event_type::builtin_event_types;
    use crate::hook::{HookContext, HookFn, HookOptions, IntoHookResult};
    use crate::router::Router;
    use wayfarer_params::ParamValues;
    use wayfarer_state::StateDeclaration;

    fn noop() -> HookFn {
        Arc::new(|_: &HookContext<'_>| ().into_hook_result())
    }

    fn labels(plan: &[PlannedHook]) -> Vec<String> {
        plan.iter()
            .map(|p| {
                let state = p.state.as_ref().map_or("-", |s| s.name());
                format!("{}:{}:{}", p.event.name(), p.hook.name(), state)
            })
            .collect()
    }

    fn transition() -> Transition {
        let router = Router::new().expect("router");
        for name in ["a", "a.b", "a.b.c", "x"] {
            router.register(StateDeclaration::new(name)).expect("valid");
        }
        router.create_transition("a.b.c", &ParamValues::new(), "x", ParamValues::new())
    }

    #[test]
    fn exits_run_deepest_first_and_priority_breaks_ties() {
        let t = transition();
        let types: Vec<_> = builtin_event_types().into_iter().map(Arc::new).collect();
        let mut hooks = HookRegistry::new();
        hooks.add("on_exit".into(), HookMatchCriteria::any(), noop(), HookOptions::default().named("low"));
        hooks.add(
            "on_exit".into(),
            HookMatchCriteria::any().exiting("a.b"),
            noop(),
            HookOptions::priority(5).named("high"),
        );
        hooks.add("on_enter".into(), HookMatchCriteria::any(), noop(), HookOptions::default().named("in"));
        hooks.add("on_start".into(), HookMatchCriteria::any().to("x"), noop(), HookOptions::default().named("go"));
        hooks.add("on_start".into(), HookMatchCriteria::any().to("a"), noop(), HookOptions::default().named("miss"));

        let plan = plan(snapshot(TransitionHookPhase::Run, &types, &hooks), &t);
        assert_eq!(
            labels(&plan),
            vec![
                "on_start:go:x",
                "on_exit:low:a.b.c",
                "on_exit:high:a.b",
                "on_exit:low:a.b",
                "on_exit:low:a",
                "on_enter:in:x",
            ]
        );
    }

    #[test]
    fn registration_order_breaks_equal_priority() {
        let t = transition();
        let types: Vec<_> = builtin_event_types().into_iter().map(Arc::new).collect();
        let mut hooks = HookRegistry::new();
        for name in ["first", "second", "third"] {
            hooks.add("on_before".into(), HookMatchCriteria::any(), noop(), HookOptions::default().named(name));
        }
        let plan = plan(snapshot(TransitionHookPhase::Before, &types, &hooks), &t);
        assert_eq!(
            labels(&plan),
            vec!["on_before:first:x", "on_before:second:x", "on_before:third:x"]
        );
    }
}
