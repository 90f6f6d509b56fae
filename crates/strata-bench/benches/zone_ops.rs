//! Criterion micro-benchmarks for zone allocation and bulk free.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use strata_bench::{compile_profile, request_sizes, run_phase};
use strata_test_utils::Expr;
use strata_zone::{Zone, ZoneScope, ZoneScopeMode};

/// Benchmark: 10K small allocations from a fresh zone, then drop.
fn bench_zone_allocate_10k(c: &mut Criterion) {
    let sizes = request_sizes(42, 10_000, 64);
    c.bench_function("zone_allocate_10k", |b| {
        b.iter(|| {
            let zone = Zone::new(compile_profile()).unwrap();
            for &size in &sizes {
                black_box(zone.allocate(size));
            }
        });
    });
}

/// Baseline: the same 10K requests served by the global allocator.
fn bench_box_allocate_10k(c: &mut Criterion) {
    let sizes = request_sizes(42, 10_000, 64);
    c.bench_function("box_allocate_10k", |b| {
        b.iter(|| {
            let boxes: Vec<Box<[u8]>> = sizes
                .iter()
                .map(|&size| vec![0u8; size].into_boxed_slice())
                .collect();
            black_box(boxes);
        });
    });
}

/// Benchmark: repeated phases on one zone, restarting in the kept segment.
fn bench_phase_with_kept_segment(c: &mut Criterion) {
    let sizes = request_sizes(7, 2_000, 48);
    let mut zone = Zone::new(compile_profile()).unwrap();
    c.bench_function("phase_with_kept_segment", |b| {
        b.iter(|| black_box(run_phase(&mut zone, &sizes)));
    });
}

/// Benchmark: build a 10K-node expression tree, evaluate it, bulk free.
fn bench_ast_build_and_free(c: &mut Criterion) {
    let mut zone = Zone::new(compile_profile()).unwrap();
    c.bench_function("ast_build_and_free_10k", |b| {
        b.iter(|| {
            let scope = ZoneScope::new(&mut zone, ZoneScopeMode::DeleteOnExit);
            let tree = Expr::sum_chain(&scope, 5_000);
            black_box(tree.evaluate());
        });
    });
}

criterion_group!(
    benches,
    bench_zone_allocate_10k,
    bench_box_allocate_10k,
    bench_phase_with_kept_segment,
    bench_ast_build_and_free
);
criterion_main!(benches);
