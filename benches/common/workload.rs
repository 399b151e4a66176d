//! Workload generators for hit-rate benchmarks.
//!
//! Key streams are deterministic for a given seed so runs are comparable.

use hotset::policy::two_tier::TwoTierCache;
use hotset::time::Clock;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy)]
pub enum Workload {
    /// Uniform random keys in `[0, universe)`.
    Uniform,
    /// `hot_prob` of accesses go to the first `hot_fraction` of keys.
    Hotset { hot_fraction: f64, hot_prob: f64 },
    /// Sequential scan in `[0, universe)`.
    Scan,
    /// Power-law popularity; `theta` 0.0 is uniform, 0.99 is heavily skewed.
    Zipfian { theta: f64 },
}

#[derive(Debug, Clone, Copy)]
pub struct WorkloadSpec {
    pub universe: u64,
    pub workload: Workload,
    pub seed: u64,
}

impl WorkloadSpec {
    pub fn generator(self) -> WorkloadGenerator {
        WorkloadGenerator::new(self.universe, self.workload, self.seed)
    }
}

#[derive(Debug, Clone)]
pub struct WorkloadGenerator {
    universe: u64,
    workload: Workload,
    rng: SmallRng,
    scan_pos: u64,
    zipfian: Option<Zipf>,
}

impl WorkloadGenerator {
    pub fn new(universe: u64, workload: Workload, seed: u64) -> Self {
        let universe = universe.max(1);
        let zipfian = match workload {
            Workload::Zipfian { theta } => Some(Zipf::new(universe, theta)),
            _ => None,
        };
        Self {
            universe,
            workload,
            rng: SmallRng::seed_from_u64(seed),
            scan_pos: 0,
            zipfian,
        }
    }

    /// Starts scans at `offset` so a scan can run over keys disjoint from
    /// another workload's.
    pub fn with_scan_offset(mut self, offset: u64) -> Self {
        self.scan_pos = offset % self.universe;
        self
    }

    pub fn next_key(&mut self) -> u64 {
        match self.workload {
            Workload::Uniform => self.rng.gen_range(0..self.universe),
            Workload::Hotset {
                hot_fraction,
                hot_prob,
            } => {
                let hot_fraction = hot_fraction.clamp(0.0, 1.0);
                let hot_prob = hot_prob.clamp(0.0, 1.0);
                let hot_size = ((self.universe as f64) * hot_fraction).round() as u64;
                let hot_size = hot_size.clamp(1, self.universe);
                if self.rng.gen_bool(hot_prob) {
                    self.rng.gen_range(0..hot_size)
                } else if hot_size == self.universe {
                    self.rng.gen_range(0..self.universe)
                } else {
                    self.rng.gen_range(hot_size..self.universe)
                }
            },
            Workload::Scan => {
                let key = self.scan_pos;
                self.scan_pos = (self.scan_pos + 1) % self.universe;
                key
            },
            Workload::Zipfian { .. } => match &self.zipfian {
                Some(zipf) => zipf.rank(self.rng.r#gen::<f64>()),
                None => 0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HitRate {
    pub hits: u64,
    pub misses: u64,
}

impl HitRate {
    pub fn hit_rate(self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Run a hit-rate workload against a cache.
///
/// Treated like a read-through cache: `get`, and `set` on miss.
pub fn run_hit_rate<C: Clock>(
    cache: &mut TwoTierCache<u64, u64, C>,
    generator: &mut WorkloadGenerator,
    operations: usize,
) -> HitRate {
    let mut hits = 0u64;
    let mut misses = 0u64;

    for _ in 0..operations {
        let key = generator.next_key();
        if cache.get(&key).is_some() {
            hits += 1;
        } else {
            misses += 1;
            cache.set(key, key);
        }
    }

    HitRate { hits, misses }
}

/// Hit rates before, during and after a one-off scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanResistance {
    pub baseline: HitRate,
    pub during_scan: HitRate,
    pub recovery: HitRate,
}

/// Warms `cache` with a hot-set workload, floods it with a scan over
/// `scan_keys` never-seen keys, then replays the hot set.
pub fn measure_scan_resistance<C: Clock>(
    cache: &mut TwoTierCache<u64, u64, C>,
    universe: u64,
    scan_keys: u64,
    operations: usize,
    seed: u64,
) -> ScanResistance {
    let hot = Workload::Hotset {
        hot_fraction: 0.1,
        hot_prob: 0.9,
    };
    let mut warm = WorkloadGenerator::new(universe, hot, seed);
    run_hit_rate(cache, &mut warm, operations);
    let baseline = run_hit_rate(cache, &mut warm, operations);

    let mut scan =
        WorkloadGenerator::new(universe + scan_keys, Workload::Scan, seed).with_scan_offset(universe);
    let during_scan = run_hit_rate(cache, &mut scan, scan_keys as usize);

    let recovery = run_hit_rate(cache, &mut warm, operations);

    ScanResistance {
        baseline,
        during_scan,
        recovery,
    }
}

/// Skewed key sampler after Gray et al., "Quickly Generating
/// Billion-Record Synthetic Databases" (the YCSB generator).
#[derive(Debug, Clone)]
struct Zipf {
    keys: u64,
    skew: f64,
    harmonic: f64,
    exponent: f64,
    tail: f64,
}

impl Zipf {
    fn new(keys: u64, skew: f64) -> Self {
        // skew == 1 makes `exponent` infinite
        let skew = skew.clamp(0.0, 0.9999);
        let harmonic = generalized_harmonic(keys, skew);
        let first_two = generalized_harmonic(2, skew);
        let tail = (1.0 - (2.0 / keys as f64).powf(1.0 - skew)) / (1.0 - first_two / harmonic);
        Self {
            keys,
            skew,
            harmonic,
            exponent: 1.0 / (1.0 - skew),
            tail,
        }
    }

    /// Maps a uniform draw in `[0, 1)` to a key rank; rank 0 is hottest.
    fn rank(&self, u: f64) -> u64 {
        let scaled = u * self.harmonic;
        if scaled < 1.0 {
            0
        } else if scaled < 1.0 + 0.5_f64.powf(self.skew) {
            1
        } else {
            let rank = self.keys as f64 * (self.tail * (u - 1.0) + 1.0).powf(self.exponent);
            (rank as u64).min(self.keys - 1)
        }
    }
}

fn generalized_harmonic(n: u64, skew: f64) -> f64 {
    (1..=n).map(|i| (i as f64).powf(-skew)).sum()
}
