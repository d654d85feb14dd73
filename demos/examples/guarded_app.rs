// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An application with a login guard, resolved data, and URL navigation.
//!
//! Protected states redirect to `login` until a session exists. The `inbox`
//! state fetches its messages before it is entered, and every navigation
//! starts from a URL.
//!
//! Run:
//! - `cargo run -p wayfarer_demos --example guarded_app`

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use futures::executor::block_on;
use serde_json::json;
use tracing_subscriber::EnvFilter;
use wayfarer_params::{ParamValue, ParamValues};
use wayfarer_state::{Resolvable, StateDeclaration};
use wayfarer_transition::{
    HookMatchCriteria, HookOptions, HookOutcome, Router, StateMatcher, TargetState, TransitionError,
};

fn navigate(router: &Router, url: &str) -> Result<(), TransitionError> {
    let Some(found) = router.match_url(url) else {
        tracing::warn!(url, "no state matches");
        println!("{url}: no state matches");
        return Ok(());
    };
    tracing::info!(url, state = %found.state, "navigating");
    let done = block_on(router.go(&found.state, found.params))?;
    if let Some(from) = done.redirected_from() {
        println!(
            "{url}: redirected from {} to {}",
            from.to().map_or("-", |s| s.name()),
            done.to().map_or("-", |s| s.name())
        );
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let router = Router::new().expect("default config is valid");
    router
        .register(StateDeclaration::new("login").url("/login"))
        .expect("valid");
    router
        .register(
            StateDeclaration::new("app")
                .url("/app")
                .abstract_state()
                .data("requires_auth", true),
        )
        .expect("valid");
    router
        .register(
            StateDeclaration::new("app.inbox")
                .url("/inbox?{page:int}")
                .resolve(Resolvable::new("messages", |args| {
                    let page = args.params.get("page").and_then(ParamValue::as_int).unwrap_or(1);
                    async move { Ok(json!([format!("message {}", page * 10), format!("message {}", page * 10 + 1)])) }
                        .boxed()
                }))
                .resolve(Resolvable::value("folder", json!("inbox")).eager()),
        )
        .expect("valid");

    let signed_in = Arc::new(AtomicBool::new(false));
    let session = signed_in.clone();
    router.on_before(
        HookMatchCriteria::any().to(StateMatcher::predicate(|state, _| {
            state.data().get("requires_auth").and_then(|v| v.as_bool()) == Some(true)
        })),
        move |_| {
            if session.load(Ordering::SeqCst) {
                HookOutcome::Continue
            } else {
                HookOutcome::Redirect(TargetState::new("login", ParamValues::new()))
            }
        },
        HookOptions::default().named("require_login"),
    );
    router.on_success(
        HookMatchCriteria::any().to("app.inbox"),
        |ctx| {
            println!(
                "inbox page {:?}: {}",
                ctx.transition.params().get("page"),
                ctx.transition.resolved("messages").unwrap_or_default()
            );
        },
        HookOptions::default(),
    );

    for url in ["/app/inbox", "/app/inbox?page=2", "/nowhere"] {
        if url == "/app/inbox?page=2" {
            signed_in.store(true, Ordering::SeqCst);
        }
        if let Err(err) = navigate(&router, url) {
            println!("{url}: {err}");
        }
        println!("  now at {}", router.current_state().name());
    }
}
