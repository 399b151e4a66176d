//! hotset: a two-tier, popularity-aware in-process cache.
//!
//! Values live in a bounded **cached** tier; keys that have not yet earned a
//! slot are tracked in a **watched** tier that keeps only their access
//! history. A key is promoted once its bucketed popularity beats the weakest
//! cached entry, which keeps one-off scans from flushing the hot set.
//!
//! ```
//! use std::time::Duration;
//!
//! use hotset::prelude::*;
//!
//! let mut cache = TwoTierBuilder::new()
//!     .max_items(1_000)
//!     .max_size(1 << 20)
//!     .stale_time(Duration::from_secs(60))
//!     .build::<String, Vec<u8>>();
//!
//! cache.set("greeting".to_string(), b"hello".to_vec());
//! assert_eq!(cache.get(&"greeting".to_string()).as_deref(), Some(&b"hello".to_vec()));
//! assert_eq!(cache.tier_of(&"greeting".to_string()), Some(Tier::Cached));
//!
//! // Call on your own schedule, e.g. every `cache_time`.
//! cache.rotate_elapsed();
//! ```
//!
//! ## Features
//!
//! | Feature       | Default | Enables                                         |
//! |---------------|---------|-------------------------------------------------|
//! | `concurrency` | yes     | `ConcurrentTwoTierCache` (`parking_lot` mutex)  |
//! | `json`        | yes     | `EstimateSize` for `serde_json::Value`          |
//! | `metrics`     | yes     | Counters, snapshots and a Prometheus exporter   |

pub mod builder;
pub mod ds;
pub mod error;
pub mod policy;
pub mod prelude;
pub mod size;
pub mod time;

#[cfg(feature = "metrics")]
pub mod metrics;
