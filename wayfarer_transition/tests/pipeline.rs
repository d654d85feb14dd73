// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end behavior of the transition pipeline.

use std::sync::{Arc, Mutex};

use futures::channel::oneshot;
use futures::executor::block_on;
use wayfarer_params::{ParamDeclaration, ParamValue, ParamValues, param_values};
use wayfarer_state::{Queue, StateDeclaration, StateError};
use wayfarer_transition::{
    HookMatchCriteria, HookOptions, HookOutcome, HookReturn, InvalidReason, PathKind, PathNode,
    RejectionKind, Router, RouterError, StateMatcher, TargetState, TransitionError, TransitionEventType,
    TransitionHookPhase,
};

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().expect("not poisoned").clone()
}

fn push(log: &Log, entry: impl Into<String>) {
    log.lock().expect("not poisoned").push(entry.into());
}

/// Record `label:state` for every invocation of a state-scoped hook.
fn record_states(router: &Router, log: &Log, label: &'static str, event: &str) {
    let sink = log.clone();
    router
        .on(
            event,
            HookMatchCriteria::any(),
            move |ctx| {
                let state = ctx.state.map_or("-", |s| s.name());
                push(&sink, format!("{label}:{state}"));
            },
            HookOptions::default(),
        )
        .expect("builtin event");
}

fn names(nodes: &[PathNode]) -> Vec<&str> {
    nodes.iter().map(PathNode::name).collect()
}

fn none() -> ParamValues {
    ParamValues::new()
}

#[test]
fn registration_defers_children_until_the_parent_exists() {
    let router = Router::new().expect("router");
    let built = router
        .register(StateDeclaration::new("home.about"))
        .expect("valid");
    assert!(built.is_none());
    assert!(router.state("home.about").is_none());
    assert_eq!(router.unresolved().len(), 1);

    router.register(StateDeclaration::new("home")).expect("valid");
    let states = router.flush().expect("nothing failed");
    assert_eq!(
        states.get("home.about").and_then(|s| s.parent()),
        Some("home")
    );
    assert!(router.unresolved().is_empty());
}

#[test]
fn duplicate_states_are_rejected() {
    let router = Router::new().expect("router");
    router.register(StateDeclaration::new("home")).expect("valid");
    assert!(router.register(StateDeclaration::new("home")).is_err());
}

#[test]
fn queued_children_that_fail_to_build_are_reported() {
    let router = Router::new().expect("router");
    assert!(
        router
            .register(StateDeclaration::new("a.b").url("/{"))
            .expect("queued")
            .is_none()
    );
    let err = router
        .register(StateDeclaration::new("a"))
        .expect_err("child fails");
    assert!(matches!(
        err,
        RouterError::State(StateError::QueuedBuildsFailed(ref failed)) if failed[0].0 == "a.b"
    ));
    assert!(router.state("a").is_some());
    assert!(router.state("a.b").is_none());
    assert!(router.failed_states().contains_key("a.b"));
}

#[test]
fn sibling_transition_retains_the_parent() {
    let router = Router::new().expect("router");
    for name in ["parent", "parent.a", "parent.b"] {
        router.register(StateDeclaration::new(name)).expect("valid");
    }
    block_on(router.go("parent.a", none())).expect("enter a");

    let hooks = log();
    record_states(&router, &hooks, "exit", "on_exit");
    record_states(&router, &hooks, "retain", "on_retain");
    record_states(&router, &hooks, "enter", "on_enter");

    let t = router.create_transition_to(TargetState::new("^.b", none()));
    assert!(t.valid());
    assert_eq!(names(t.retained()), vec!["", "parent"]);
    assert_eq!(names(t.exiting()), vec!["parent.a"]);
    assert_eq!(names(t.entering()), vec!["parent.b"]);

    block_on(t.run()).expect("sibling transition");
    assert_eq!(
        entries(&hooks),
        vec!["exit:parent.a", "retain:", "retain:parent", "enter:parent.b"]
    );
    assert_eq!(router.current_state().name(), "parent.b");
}

#[test]
fn lower_hook_order_runs_first() {
    let router = Router::new().expect("router");
    router.register(StateDeclaration::new("a")).expect("valid");
    router
        .define_event(TransitionEventType::new("ten", TransitionHookPhase::Run, 10, PathKind::To))
        .expect("new event");
    router
        .define_event(TransitionEventType::new("five", TransitionHookPhase::Run, 5, PathKind::To))
        .expect("new event");
    let hooks = log();
    record_states(&router, &hooks, "ten", "ten");
    record_states(&router, &hooks, "five", "five");

    block_on(router.go("a", none())).expect("ok");
    assert_eq!(entries(&hooks), vec!["five:a", "ten:a"]);
}

#[test]
fn exits_run_inner_to_outer_and_enters_outer_to_inner() {
    let router = Router::new().expect("router");
    for name in ["a", "a.b", "a.b.c", "x", "x.y"] {
        router.register(StateDeclaration::new(name)).expect("valid");
    }
    block_on(router.go("a.b.c", none())).expect("ok");
    let hooks = log();
    record_states(&router, &hooks, "exit", "on_exit");
    record_states(&router, &hooks, "enter", "on_enter");
    block_on(router.go("x.y", none())).expect("ok");
    assert_eq!(
        entries(&hooks),
        vec!["exit:a.b.c", "exit:a.b", "exit:a", "enter:x", "enter:x.y"]
    );
}

#[test]
fn abort_in_run_stops_the_pipeline_and_runs_error_hooks_once() {
    let router = Router::new().expect("router");
    for name in ["a", "b"] {
        router.register(StateDeclaration::new(name)).expect("valid");
    }
    block_on(router.go("a", none())).expect("ok");

    let hooks = log();
    let sink = hooks.clone();
    router.on_exit(
        HookMatchCriteria::any().exiting("a"),
        move |_| {
            push(&sink, "exit:a");
            false
        },
        HookOptions::default().named("keep_a"),
    );
    record_states(&router, &hooks, "enter", "on_enter");
    record_states(&router, &hooks, "finish", "on_finish");
    record_states(&router, &hooks, "success", "on_success");
    record_states(&router, &hooks, "error", "on_error");

    let result = block_on(router.go("b", none()));
    assert!(matches!(
        result,
        Err(TransitionError::Aborted { ref hook }) if hook == "keep_a"
    ));
    assert_eq!(entries(&hooks), vec!["exit:a", "error:b"]);
    assert_eq!(router.current_state().name(), "a");
}

#[test]
fn newer_transition_supersedes_one_suspended_in_a_hook() {
    let router = Router::new().expect("router");
    for name in ["slow", "fast"] {
        router.register(StateDeclaration::new(name)).expect("valid");
    }
    let (release, gate) = oneshot::channel::<()>();
    let gate = Arc::new(Mutex::new(Some(gate)));
    router.on_enter(
        HookMatchCriteria::any().entering("slow"),
        move |_| {
            let gate = gate.lock().expect("not poisoned").take();
            HookReturn::deferred(async move {
                if let Some(gate) = gate {
                    gate.await.ok();
                }
                Ok(HookOutcome::Continue)
            })
        },
        HookOptions::default(),
    );
    let hooks = log();
    record_states(&router, &hooks, "finish", "on_finish");
    record_states(&router, &hooks, "success", "on_success");
    record_states(&router, &hooks, "error", "on_error");

    let t1 = router.create_transition_to(TargetState::new("slow", none()));
    let t2 = router.create_transition_to(TargetState::new("fast", none()));
    let second = async {
        let result = t2.run().await;
        release.send(()).ok();
        result
    };
    let (first, second) = block_on(async { futures::join!(t1.run(), second) });

    assert!(matches!(first, Err(TransitionError::Superseded)));
    assert_eq!(t1.rejection().map(|e| e.kind()), Some(RejectionKind::Superseded));
    assert!(second.is_ok());
    assert_eq!(entries(&hooks), vec!["finish:fast", "success:fast"]);
    assert_eq!(router.current_state().name(), "fast");
    assert!(!router.transition_in_progress());
}

#[test]
fn queue_evicts_the_head_past_its_limit() {
    let evicted = log();
    let sink = evicted.clone();
    let mut queue = Queue::new(Some(2));
    queue.on_evict(move |item: &String| push(&sink, item.clone()));
    for item in ["a", "b", "c"] {
        queue.enqueue(item.to_owned());
    }
    assert_eq!(queue.to_vec(), vec!["b".to_owned(), "c".to_owned()]);
    assert_eq!(entries(&evicted), vec!["a"]);
}

#[test]
fn invalid_targets_are_rejected_before_application_hooks() {
    let router = Router::new().expect("router");
    let hooks = log();
    record_states(&router, &hooks, "before", "on_before");
    record_states(&router, &hooks, "error", "on_error");

    let t = router.create_transition_to(TargetState::new("missing", none()));
    assert!(!t.valid());
    let result = block_on(t.run());
    assert!(matches!(
        result,
        Err(TransitionError::Invalid(InvalidReason::NoSuchState(ref n))) if n == "missing"
    ));
    assert_eq!(entries(&hooks), vec!["error:-"]);
}

#[test]
fn repeating_the_current_location_is_ignored_silently() {
    let router = Router::new().expect("router");
    router.register(StateDeclaration::new("home")).expect("valid");
    block_on(router.go("home", none())).expect("ok");
    let hooks = log();
    record_states(&router, &hooks, "error", "on_error");

    let again = block_on(router.go("home", none()));
    assert!(matches!(again, Err(TransitionError::Ignored)));
    assert!(entries(&hooks).is_empty());

    let reload = block_on(router.go_with(
        "home",
        none(),
        wayfarer_transition::TransitionOptions::reload(),
    ));
    assert!(reload.is_ok());
}

#[test]
fn dynamic_param_changes_retain_the_state() {
    let router = Router::new().expect("router");
    router
        .register(
            StateDeclaration::new("search")
                .url("/search?{q}")
                .param("q", ParamDeclaration::new().dynamic()),
        )
        .expect("valid");
    block_on(router.go("search", param_values([("q", "rust".into())]))).expect("ok");

    let hooks = log();
    record_states(&router, &hooks, "enter", "on_enter");
    record_states(&router, &hooks, "retain", "on_retain");
    block_on(router.go("search", param_values([("q", "wayfarer".into())]))).expect("ok");
    assert_eq!(entries(&hooks), vec!["retain:", "retain:search"]);
    assert_eq!(router.current_params()["q"], ParamValue::from("wayfarer"));
    assert_eq!(
        router.href("search", router.current_params()).as_deref(),
        Some("/search?q=wayfarer")
    );
}

#[test]
fn predicates_and_globs_select_hooks() {
    let router = Router::new().expect("router");
    for decl in [
        StateDeclaration::new("admin").data("requires_auth", true),
        StateDeclaration::new("admin.users"),
        StateDeclaration::new("public"),
    ] {
        router.register(decl).expect("valid");
    }
    let hooks = log();
    let sink = hooks.clone();
    router.on_start(
        HookMatchCriteria::any().to(StateMatcher::predicate(|state, _| {
            state.data().get("requires_auth") == Some(&serde_json::Value::Bool(true))
        })),
        move |ctx| push(&sink, format!("auth:{}", ctx.transition.target().state)),
        HookOptions::default(),
    );
    let sink = hooks.clone();
    router.on_enter(
        HookMatchCriteria::any().entering("admin.**"),
        move |ctx| push(&sink, format!("glob:{}", ctx.state.map_or("-", |s| s.name()))),
        HookOptions::default(),
    );

    block_on(router.go("admin.users", none())).expect("ok");
    block_on(router.go("public", none())).expect("ok");
    assert_eq!(
        entries(&hooks),
        vec!["auth:admin.users", "glob:admin", "glob:admin.users"]
    );
}

#[test]
fn hooks_can_be_deregistered() {
    let router = Router::new().expect("router");
    for name in ["a", "b"] {
        router.register(StateDeclaration::new(name)).expect("valid");
    }
    let id = router.on_before(HookMatchCriteria::any(), |_| false, HookOptions::default());
    assert!(block_on(router.go("a", none())).is_err());
    assert!(router.deregister_hook(id));
    assert!(!router.deregister_hook(id));
    assert!(block_on(router.go("a", none())).is_ok());
}

#[test]
fn hook_failures_are_typed_by_how_they_failed() {
    use wayfarer_transition::HookError;

    let router = Router::new().expect("router");
    for name in ["sync", "deferred"] {
        router.register(StateDeclaration::new(name)).expect("valid");
    }
    router.on_start(
        HookMatchCriteria::any().to("sync"),
        |_| Err::<(), _>(HookError::message("boom")),
        HookOptions::default().named("sync_guard"),
    );
    router.on_start(
        HookMatchCriteria::any().to("deferred"),
        |_| HookReturn::deferred(async { Err::<HookOutcome, _>(HookError::message("later")) }),
        HookOptions::default().named("deferred_guard"),
    );
    assert!(matches!(
        block_on(router.go("sync", none())),
        Err(TransitionError::HookThrew { ref hook, .. }) if hook == "sync_guard"
    ));
    let err = block_on(router.go("deferred", none())).expect_err("rejected");
    assert!(matches!(err, TransitionError::HookRejected { ref hook, .. } if hook == "deferred_guard"));
    assert_eq!(err.kind(), RejectionKind::Error);
    assert_eq!(err.to_string(), "hook `deferred_guard` rejected the transition: later");
}

#[test]
fn params_inherit_from_the_current_path() {
    let router = Router::new().expect("router");
    router
        .register(StateDeclaration::new("users").url("/users/{id:int}"))
        .expect("valid");
    router
        .register(StateDeclaration::new("users.posts").url("/posts"))
        .expect("valid");
    router
        .register(StateDeclaration::new("users.likes").url("/likes"))
        .expect("valid");
    block_on(router.go("users.posts", param_values([("id", ParamValue::Int(9))]))).expect("ok");
    let t = block_on(router.go("^.likes", none())).expect("sibling");
    assert_eq!(t.params()["id"], ParamValue::Int(9));
    assert_eq!(names(t.retained()), vec!["", "users"]);
    assert_eq!(
        router.href("users.likes", router.current_params()).as_deref(),
        Some("/users/9/likes")
    );
}

#[test]
fn synchronous_event_types_never_suspend() {
    use std::sync::atomic::{AtomicBool, Ordering};

    let router = Router::new().expect("router");
    router.register(StateDeclaration::new("a")).expect("valid");
    router
        .define_event(
            TransitionEventType::new("on_check", TransitionHookPhase::Run, 50, PathKind::To)
                .synchronous(),
        )
        .expect("new event");
    let polled = Arc::new(AtomicBool::new(false));
    let flag = polled.clone();
    router
        .on(
            "on_check",
            HookMatchCriteria::any(),
            move |_| {
                let flag = flag.clone();
                HookReturn::deferred(async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok(HookOutcome::Abort)
                })
            },
            HookOptions::default(),
        )
        .expect("defined");
    let done = block_on(router.go("a", none())).expect("deferred result is dropped");
    assert!(done.succeeded());
    assert!(!polled.load(Ordering::SeqCst));
}

#[test]
fn asynchronous_event_types_are_awaited() {
    let router = Router::new().expect("router");
    router.register(StateDeclaration::new("a")).expect("valid");
    router
        .define_event(TransitionEventType::new(
            "on_check",
            TransitionHookPhase::Run,
            50,
            PathKind::To,
        ))
        .expect("new event");
    router
        .on(
            "on_check",
            HookMatchCriteria::any(),
            |_| HookReturn::deferred(async { Ok(HookOutcome::Abort) }),
            HookOptions::default().named("late_abort"),
        )
        .expect("defined");
    assert!(matches!(
        block_on(router.go("a", none())),
        Err(TransitionError::Aborted { ref hook }) if hook == "late_abort"
    ));
}

#[test]
fn invoke_limits_hold_within_one_transition() {
    let router = Router::new().expect("router");
    for name in ["a", "a.b", "a.b.c", "x"] {
        router.register(StateDeclaration::new(name)).expect("valid");
    }
    block_on(router.go("a.b.c", none())).expect("ok");
    let log = log();
    let sink = log.clone();
    router.on_exit(
        HookMatchCriteria::any(),
        move |ctx| push(&sink, ctx.state.map_or("-", |s| s.name())),
        HookOptions::default().invoke_limit(1),
    );
    block_on(router.go("x", none())).expect("ok");
    assert_eq!(entries(&log), vec!["a.b.c"]);
}
