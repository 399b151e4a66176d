//! Recorder, snapshot and export traits.
//!
//! - Recorders only write counters. Mutating operations use
//!   [`TwoTierMetricsRecorder`]; `&self` operations use
//!   [`TwoTierMetricsReadRecorder`].
//! - [`MetricsSnapshotProvider`] copies counters and gauges out for tests and
//!   benchmarks.
//! - [`MetricsExporter`] publishes a snapshot to a monitoring system.

/// Counters written by mutating cache operations.
pub trait TwoTierMetricsRecorder {
    fn record_get_hit(&mut self);
    fn record_get_watched_hit(&mut self);
    fn record_get_miss(&mut self);
    fn record_set_call(&mut self);
    fn record_set_update(&mut self);
    fn record_admission(&mut self);
    fn record_promotion(&mut self);
    fn record_rejected_admission(&mut self);
    fn record_cached_eviction(&mut self);
    fn record_watched_insert(&mut self);
    fn record_watched_replacement(&mut self);
    fn record_watched_drop(&mut self);
    fn record_expiration(&mut self);
    fn record_invalidation(&mut self);
    fn record_rotation(&mut self);
    fn record_clear(&mut self);
}

/// Counters written by `&self` cache operations.
pub trait TwoTierMetricsReadRecorder {
    fn record_peek_call(&self);
    fn record_peek_found(&self);
}

/// Copies the current metrics out of a cache.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Publishes a snapshot.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
