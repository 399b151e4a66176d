//! Hit rate of a hot set before, during and after a one-off scan.
//!
//! Run with: `cargo bench --bench scan_resistance`

mod common;

use std::hint::black_box;

use common::workload::measure_scan_resistance;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use hotset::builder::TwoTierBuilder;
use hotset::ds::Weighting;
use hotset::policy::two_tier::TwoTierCache;

const CAPACITY: usize = 1024;
const UNIVERSE: u64 = 8192;
const OPS: usize = 50_000;
const SEED: u64 = 7;

fn cache(weighting: Weighting) -> TwoTierCache<u64, u64> {
    TwoTierBuilder::new()
        .max_items(CAPACITY)
        .weighting(weighting)
        .seed(SEED)
        .build()
}

fn bench_scan_resistance(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_resistance");
    group.sample_size(10);

    for (name, weighting) in [
        ("flat", Weighting::Flat),
        ("recency_biased", Weighting::RecencyBiased),
    ] {
        for scan_keys in [UNIVERSE, 4 * UNIVERSE] {
            let mut trial = cache(weighting);
            let report = measure_scan_resistance(&mut trial, UNIVERSE, scan_keys, OPS, SEED);
            println!(
                "{name:>14} scan={scan_keys:>6}: baseline {:.2}%, during {:.2}%, recovery {:.2}%",
                report.baseline.hit_rate() * 100.0,
                report.during_scan.hit_rate() * 100.0,
                report.recovery.hit_rate() * 100.0,
            );

            group.bench_with_input(
                BenchmarkId::new(name, scan_keys),
                &scan_keys,
                |b, &scan_keys| {
                    b.iter(|| {
                        let mut cache = cache(weighting);
                        black_box(measure_scan_resistance(
                            &mut cache, UNIVERSE, scan_keys, OPS, SEED,
                        ))
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_scan_resistance);
criterion_main!(benches);
