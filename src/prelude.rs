pub use crate::builder::{TwoTierBuilder, TwoTierConfig};
pub use crate::ds::{BucketWindow, ExpiryQueue, PopularityHistory, ScoreHeap, Weighting};
pub use crate::error::{ConfigError, DuplicateKeyError, InvariantError};
#[cfg(feature = "metrics")]
pub use crate::metrics::{MetricsSnapshotProvider, TwoTierMetricsSnapshot};
#[cfg(feature = "concurrency")]
pub use crate::policy::ConcurrentTwoTierCache;
pub use crate::policy::{Tier, TwoTierCache};
pub use crate::size::{EstimateSize, estimate_size, human_bytes};
pub use crate::time::{Clock, ManualClock, SystemClock};
