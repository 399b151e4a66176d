use crate::metrics::cell::MetricsCell;
use crate::metrics::traits::{TwoTierMetricsReadRecorder, TwoTierMetricsRecorder};

/// Running counters kept by a two-tier cache.
#[derive(Debug, Default, Clone)]
pub struct TwoTierMetrics {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_watched_hits: u64,
    pub get_misses: u64,
    pub set_calls: u64,
    pub set_updates: u64,
    pub admissions: u64,
    pub promotions: u64,
    pub rejected_admissions: u64,
    pub cached_evictions: u64,
    pub watched_inserts: u64,
    pub watched_replacements: u64,
    pub watched_drops: u64,
    pub expirations: u64,
    pub invalidations: u64,
    pub rotations: u64,
    pub clears: u64,
    pub peek_calls: MetricsCell,
    pub peek_found: MetricsCell,
}

impl TwoTierMetrics {
    /// Share of `get` calls answered from the cached tier, in `[0, 1]`.
    pub fn hit_rate(&self) -> f64 {
        if self.get_calls == 0 {
            0.0
        } else {
            self.get_hits as f64 / self.get_calls as f64
        }
    }
}

impl TwoTierMetricsRecorder for TwoTierMetrics {
    fn record_get_hit(&mut self) {
        self.get_calls += 1;
        self.get_hits += 1;
    }

    fn record_get_watched_hit(&mut self) {
        self.get_calls += 1;
        self.get_watched_hits += 1;
    }

    fn record_get_miss(&mut self) {
        self.get_calls += 1;
        self.get_misses += 1;
    }

    fn record_set_call(&mut self) {
        self.set_calls += 1;
    }

    fn record_set_update(&mut self) {
        self.set_updates += 1;
    }

    fn record_admission(&mut self) {
        self.admissions += 1;
    }

    fn record_promotion(&mut self) {
        self.promotions += 1;
    }

    fn record_rejected_admission(&mut self) {
        self.rejected_admissions += 1;
    }

    fn record_cached_eviction(&mut self) {
        self.cached_evictions += 1;
    }

    fn record_watched_insert(&mut self) {
        self.watched_inserts += 1;
    }

    fn record_watched_replacement(&mut self) {
        self.watched_replacements += 1;
    }

    fn record_watched_drop(&mut self) {
        self.watched_drops += 1;
    }

    fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    fn record_invalidation(&mut self) {
        self.invalidations += 1;
    }

    fn record_rotation(&mut self) {
        self.rotations += 1;
    }

    fn record_clear(&mut self) {
        self.clears += 1;
    }
}

impl TwoTierMetricsReadRecorder for TwoTierMetrics {
    fn record_peek_call(&self) {
        self.peek_calls.incr();
    }

    fn record_peek_found(&self) {
        self.peek_found.incr();
    }
}
