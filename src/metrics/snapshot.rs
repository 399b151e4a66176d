use std::fmt;

use crate::size::human_bytes;

/// Point-in-time copy of a two-tier cache's counters and gauges.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TwoTierMetricsSnapshot {
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

    pub peek_calls: u64,
    pub peek_found: u64,

    // gauges captured at snapshot time
    pub cached_len: usize,
    pub watched_len: usize,
    pub memory_bytes: usize,
    pub cached_max_items: Option<usize>,
    pub watched_max_items: usize,
}

impl TwoTierMetricsSnapshot {
    /// Share of `get` calls answered from the cached tier.
    pub fn hit_rate(&self) -> f64 {
        if self.get_calls == 0 {
            0.0
        } else {
            self.get_hits as f64 / self.get_calls as f64
        }
    }
}

impl fmt::Display for TwoTierMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TwoTierMetrics {{ hits: {}, watched_hits: {}, misses: {}, hit_rate: {:.2}%, \
             admissions: {}, promotions: {}, evictions: {}, expirations: {}, \
             cached: {}, watched: {}, memory: {} }}",
            self.get_hits,
            self.get_watched_hits,
            self.get_misses,
            self.hit_rate() * 100.0,
            self.admissions,
            self.promotions,
            self.cached_evictions,
            self.expirations,
            self.cached_len,
            self.watched_len,
            human_bytes(self.memory_bytes),
        )
    }
}
