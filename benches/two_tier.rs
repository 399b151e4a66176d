//! Micro-operation and hit-rate benchmarks for the two-tier cache.
//!
//! Run with: `cargo bench --bench two_tier`

mod common;

use std::hint::black_box;
use std::time::Instant;

use common::workload::{Workload, WorkloadSpec, run_hit_rate};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use hotset::builder::TwoTierBuilder;
use hotset::policy::two_tier::TwoTierCache;

const CAPACITY: usize = 4096;
const UNIVERSE: u64 = 16_384;
const OPS: u64 = 100_000;
const SEED: u64 = 42;

fn cache() -> TwoTierCache<u64, u64> {
    TwoTierBuilder::new().max_items(CAPACITY).seed(SEED).build()
}

fn warmed() -> TwoTierCache<u64, u64> {
    let mut cache = cache();
    for key in 0..CAPACITY as u64 {
        cache.set(key, key);
    }
    cache
}

// ============================================================================
// Per-operation latency
// ============================================================================

fn bench_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("two_tier_ops");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("get_hit", |b| {
        b.iter_custom(|iters| {
            let mut cache = warmed();
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    black_box(cache.get(&(i % CAPACITY as u64)));
                }
            }
            start.elapsed()
        })
    });

    group.bench_function("get_miss", |b| {
        b.iter_custom(|iters| {
            let mut cache = warmed();
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    black_box(cache.get(&(UNIVERSE + i)));
                }
            }
            start.elapsed()
        })
    });

    group.bench_function("set_update", |b| {
        b.iter_custom(|iters| {
            let mut cache = warmed();
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    cache.set(i % CAPACITY as u64, i);
                }
            }
            start.elapsed()
        })
    });

    group.bench_function("set_cold_full", |b| {
        b.iter_custom(|iters| {
            let mut cache = warmed();
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    cache.set(UNIVERSE + i, i);
                }
            }
            start.elapsed()
        })
    });

    group.bench_function("tick", |b| {
        b.iter_custom(|iters| {
            let mut cache = warmed();
            let start = Instant::now();
            for _ in 0..iters {
                cache.tick();
            }
            start.elapsed()
        })
    });

    group.finish();
}

// ============================================================================
// Hit rate by workload
// ============================================================================

fn workloads() -> Vec<(&'static str, Workload)> {
    vec![
        ("uniform", Workload::Uniform),
        (
            "hotset_90_10",
            Workload::Hotset {
                hot_fraction: 0.1,
                hot_prob: 0.9,
            },
        ),
        ("scan", Workload::Scan),
        ("zipfian_0.99", Workload::Zipfian { theta: 0.99 }),
    ]
}

fn bench_hit_rate(c: &mut Criterion) {
    let mut group = c.benchmark_group("two_tier_hit_rate");
    group.throughput(Throughput::Elements(OPS));

    for (name, workload) in workloads() {
        let spec = WorkloadSpec {
            universe: UNIVERSE,
            workload,
            seed: SEED,
        };
        let mut warm = cache();
        let rate = run_hit_rate(&mut warm, &mut spec.generator(), OPS as usize);
        println!("{name:>14}: hit rate {:.2}%", rate.hit_rate() * 100.0);

        group.bench_with_input(BenchmarkId::from_parameter(name), &spec, |b, spec| {
            b.iter(|| {
                let mut cache = cache();
                black_box(run_hit_rate(&mut cache, &mut spec.generator(), OPS as usize))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ops, bench_hit_rate);
criterion_main!(benches);
