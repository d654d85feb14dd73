// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use wayfarer_params::{ParamValue, param_values};
use wayfarer_state::StateDeclaration;
use wayfarer_transition::Router;

/// `sections` top-level states, each with a detail child taking an int id
/// and an edit grandchild with a search param.
fn build_site(sections: usize) -> Router {
    let router = Router::new().expect("router");
    for i in 0..sections {
        let section = format!("section{i}");
        router
            .register(StateDeclaration::new(section.clone()).url(format!("/{section}")))
            .expect("valid");
        router
            .register(StateDeclaration::new(format!("{section}.detail")).url("/{id:int}"))
            .expect("valid");
        router
            .register(StateDeclaration::new(format!("{section}.detail.edit")).url("/edit?draft"))
            .expect("valid");
    }
    router
}

fn bench_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_url");
    for &sections in &[8_usize, 64, 512] {
        let router = build_site(sections);
        let last = sections - 1;
        let urls = [
            format!("/section{last}"),
            format!("/section{last}/42"),
            format!("/section{last}/42/edit?draft=yes"),
            "/nowhere/at/all".to_owned(),
        ];
        group.throughput(Throughput::Elements(urls.len() as u64));
        group.bench_function(format!("sections{sections}"), |b| {
            b.iter(|| {
                for url in &urls {
                    black_box(router.match_url(url));
                }
            });
        });
    }
    group.finish();
}

fn bench_href(c: &mut Criterion) {
    let router = build_site(64);
    let params = param_values([
        ("id", ParamValue::Int(42)),
        ("draft", ParamValue::from("a b/c")),
    ]);
    c.bench_function("href_nested_with_search", |b| {
        b.iter(|| black_box(router.href("section63.detail.edit", params.clone())));
    });
}

criterion_group!(benches, bench_match, bench_href);
criterion_main!(benches);
