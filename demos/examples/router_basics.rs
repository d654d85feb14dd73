// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Router basics.
//!
//! Registers a small state tree, logs every exit and enter, and walks through
//! a few transitions including a blocked one and a custom event type.
//!
//! Run:
//! - `cargo run -p wayfarer_demos --example router_basics`
//! - `RUST_LOG=wayfarer_transition=debug cargo run -p wayfarer_demos --example router_basics`

use futures::executor::block_on;
use tracing_subscriber::EnvFilter;
use wayfarer_params::{ParamValue, ParamValues, param_values};
use wayfarer_state::StateDeclaration;
use wayfarer_transition::{
    HookMatchCriteria, HookOptions, PathKind, Router, TransitionEventType, TransitionHookPhase,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let router = Router::new().expect("default config is valid");
    for decl in [
        StateDeclaration::new("home").url("/"),
        StateDeclaration::new("users").url("/users"),
        StateDeclaration::new("users.detail").url("/{id:int}"),
        StateDeclaration::new("admin").url("/admin"),
    ] {
        router.register(decl).expect("valid declaration");
    }
    tracing::info!(unresolved = router.unresolved().len(), "state tree registered");

    router.on_exit(
        HookMatchCriteria::any(),
        |ctx| println!("  exit  {}", ctx.state.map_or("-", |s| s.name())),
        HookOptions::default(),
    );
    router.on_enter(
        HookMatchCriteria::any(),
        |ctx| println!("  enter {}", ctx.state.map_or("-", |s| s.name())),
        HookOptions::default(),
    );
    router.on_before(
        HookMatchCriteria::any().to("admin"),
        |_| {
            println!("  admin is closed");
            false
        },
        HookOptions::default().named("admin_guard"),
    );

    // Runs between `on_retain` and `on_enter`.
    router
        .define_event(TransitionEventType::new(
            "on_audit",
            TransitionHookPhase::Run,
            250,
            PathKind::Entering,
        ))
        .expect("new event name");
    router
        .on(
            "on_audit",
            HookMatchCriteria::any().entering("users.*"),
            |ctx| println!("  audit {}", ctx.state.map_or("-", |s| s.name())),
            HookOptions::default(),
        )
        .expect("event is defined");

    let steps: [(&str, ParamValues); 4] = [
        ("home", ParamValues::new()),
        ("users.detail", param_values([("id", ParamValue::Int(7))])),
        ("users.detail", param_values([("id", ParamValue::Int(8))])),
        ("admin", ParamValues::new()),
    ];
    for (state, params) in steps {
        println!("go {state} {params:?}");
        match block_on(router.go(state, params)) {
            Ok(t) => println!("  -> now at {}", t.to().map_or("-", |s| s.name())),
            Err(err) => {
                tracing::warn!(state, kind = ?err.kind(), "transition rejected");
                println!("  -> rejected ({:?}): {err}", err.kind());
            }
        }
    }

    println!("current: {} {:?}", router.current_state().name(), router.current_params());
    println!(
        "href(users.detail, id=9): {:?}",
        router.href("users.detail", param_values([("id", ParamValue::Int(9))]))
    );
}
