//! Counters for [`TwoTierCache`](crate::policy::two_tier::TwoTierCache).
//!
//! Recording, snapshotting and export are split into small traits so the
//! cache only ever writes counters:
//!
//! ```text
//!   TwoTierCache ──record_*──► TwoTierMetrics ──snapshot──► TwoTierMetricsSnapshot
//!                                                                 │
//!                                                                 ▼
//!                                                        MetricsExporter<S>
//!                                                     (PrometheusTextExporter)
//! ```
//!
//! Compiled only with the `metrics` feature.

pub mod cell;
pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;

pub use exporter::PrometheusTextExporter;
pub use metrics_impl::TwoTierMetrics;
pub use snapshot::TwoTierMetricsSnapshot;
pub use traits::{
    MetricsExporter, MetricsSnapshotProvider, TwoTierMetricsReadRecorder, TwoTierMetricsRecorder,
};
