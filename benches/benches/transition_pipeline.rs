// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use futures::executor::block_on;
use wayfarer_params::ParamValues;
use wayfarer_state::StateDeclaration;
use wayfarer_transition::{HookMatchCriteria, HookOptions, Router, StateMatcher, TargetState};

/// Two branches `a.*` and `b.*` of `depth` states each.
fn build_tree(depth: usize) -> Router {
    let router = Router::new().expect("router");
    for branch in ["a", "b"] {
        let mut name = branch.to_owned();
        router
            .register(StateDeclaration::new(name.clone()).url(format!("/{branch}")))
            .expect("valid");
        for level in 1..depth {
            name = format!("{name}.s{level}");
            router
                .register(StateDeclaration::new(name.clone()).url(format!("/s{level}")))
                .expect("valid");
        }
    }
    router
}

fn leaf(branch: &str, depth: usize) -> String {
    let mut name = branch.to_owned();
    for level in 1..depth {
        name = format!("{name}.s{level}");
    }
    name
}

fn add_hooks(router: &Router, count: usize) {
    for i in 0..count {
        let priority = i32::try_from(i % 7).unwrap_or_default();
        match i % 4 {
            0 => router.on_enter(HookMatchCriteria::any(), |_| (), HookOptions::priority(priority)),
            1 => router.on_exit(HookMatchCriteria::any(), |_| (), HookOptions::priority(priority)),
            2 => router.on_before(
                HookMatchCriteria::any().to("a.**"),
                |_| true,
                HookOptions::priority(priority),
            ),
            _ => router.on_start(
                HookMatchCriteria::any().entering(StateMatcher::predicate(|s, _| s.depth() > 2)),
                |_| (),
                HookOptions::priority(priority),
            ),
        };
    }
}

fn bench_swap_branches(c: &mut Criterion) {
    let mut group = c.benchmark_group("swap_branches");
    for &hooks in &[0_usize, 16, 128] {
        let depth = 6;
        let router = build_tree(depth);
        add_hooks(&router, hooks);
        let a = leaf("a", depth);
        let b = leaf("b", depth);
        block_on(router.go(&a, ParamValues::new())).expect("initial");
        group.throughput(Throughput::Elements(hooks as u64));
        group.bench_function(format!("depth{depth}_hooks{hooks}"), |bench| {
            let mut toggle = false;
            bench.iter(|| {
                toggle = !toggle;
                let target = if toggle { &b } else { &a };
                black_box(block_on(router.go(target, ParamValues::new())).is_ok())
            });
        });
    }
    group.finish();
}

fn bench_create_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_transition");
    for &depth in &[2_usize, 8, 32] {
        let router = build_tree(depth);
        add_hooks(&router, 32);
        let a = leaf("a", depth);
        let b = leaf("b", depth);
        group.bench_function(format!("depth{depth}"), |bench| {
            bench.iter_batched(
                || TargetState::new(b.clone(), ParamValues::new()),
                |target| {
                    let from = router.path_for(&a, &ParamValues::new());
                    black_box(router.create_transition_from(from, target).valid())
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_swap_branches, bench_create_only);
criterion_main!(benches);
