//! Configuration and builder for [`TwoTierCache`].
//!
//! [`TwoTierConfig`] carries every recognized option with its default;
//! [`TwoTierBuilder`] is the chainable front end.
//!
//! ## Options
//!
//! | Option              | Default   | Meaning                                              |
//! |---------------------|-----------|------------------------------------------------------|
//! | `max_items`         | unbounded | Cap on cached-tier entries                           |
//! | `max_size`          | unbounded | Byte budget, 90% cached tier / 10% watched tier      |
//! | `cache_time`        | 300 s     | Length of one popularity bucket                      |
//! | `precision`         | 10        | Buckets in the sliding window (1..=64)               |
//! | `stale_time`        | never     | Time-to-live of a cached value                       |
//! | `weighting`         | `Flat`    | How bucket counts are weighted by age                |
//! | `min_watched_items` | 64        | Floor on watched-tier capacity                       |
//! | `seed`              | entropy   | Seed for weak-entry sampling                         |
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use hotset::builder::TwoTierBuilder;
//!
//! let mut cache = TwoTierBuilder::new()
//!     .max_items(100)
//!     .stale_time(Duration::from_secs(30))
//!     .build::<u64, String>();
//!
//! cache.set(1, "hello".to_string());
//! assert_eq!(cache.get(&1).as_deref(), Some(&"hello".to_string()));
//! ```

use std::hash::Hash;
use std::time::Duration;

use crate::ds::{MAX_PRECISION, Weighting};
use crate::error::ConfigError;
use crate::policy::two_tier::TwoTierCache;
use crate::size::EstimateSize;
use crate::time::Clock;

/// Default length of one popularity bucket.
pub const DEFAULT_CACHE_TIME: Duration = Duration::from_secs(300);
/// Default number of buckets per history.
pub const DEFAULT_PRECISION: usize = 10;
/// Default floor on watched-tier capacity.
pub const DEFAULT_MIN_WATCHED_ITEMS: usize = 64;

/// Recognized cache options.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoTierConfig {
    /// Maximum cached-tier entries; `None` is unbounded.
    pub max_items: Option<usize>,
    /// Total byte budget; `None` is unbounded.
    pub max_size: Option<usize>,
    /// Bucket rotation interval.
    pub cache_time: Duration,
    /// Number of buckets in each popularity history.
    pub precision: usize,
    /// Time-to-live of cached values; `None` never expires.
    pub stale_time: Option<Duration>,
    /// Age weighting used by the score.
    pub weighting: Weighting,
    /// Watched-tier capacity never drops below this.
    pub min_watched_items: usize,
    /// Seed for weak-entry sampling; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for TwoTierConfig {
    fn default() -> Self {
        Self {
            max_items: None,
            max_size: None,
            cache_time: DEFAULT_CACHE_TIME,
            precision: DEFAULT_PRECISION,
            stale_time: None,
            weighting: Weighting::default(),
            min_watched_items: DEFAULT_MIN_WATCHED_ITEMS,
            seed: None,
        }
    }
}

impl TwoTierConfig {
    /// Checks every option, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.precision == 0 || self.precision > MAX_PRECISION {
            return Err(ConfigError::new(format!(
                "precision must be in 1..={}, got {}",
                MAX_PRECISION, self.precision
            )));
        }
        if self.cache_time.is_zero() {
            return Err(ConfigError::new("cache_time must be greater than zero"));
        }
        if self.stale_time.is_some_and(|ttl| ttl.is_zero()) {
            return Err(ConfigError::new("stale_time must be greater than zero"));
        }
        if self.max_items == Some(0) {
            return Err(ConfigError::new("max_items must be greater than zero"));
        }
        if self.max_size == Some(0) {
            return Err(ConfigError::new("max_size must be greater than zero"));
        }
        Ok(())
    }

    /// Byte budget of the cached tier: 90% of `max_size`.
    pub fn cached_max_bytes(&self) -> Option<usize> {
        self.max_size
            .map(|max| (max as u128 * 9 / 10) as usize)
    }

    /// Byte slice reserved for the watched tier: the rest of `max_size`.
    pub fn watched_max_bytes(&self) -> Option<usize> {
        self.max_size
            .zip(self.cached_max_bytes())
            .map(|(max, cached)| max - cached)
    }
}

/// Chainable builder for [`TwoTierCache`].
#[derive(Debug, Clone, Default)]
pub struct TwoTierBuilder {
    config: TwoTierConfig,
}

impl TwoTierBuilder {
    /// Starts from [`TwoTierConfig::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: TwoTierConfig) -> Self {
        Self { config }
    }

    /// Caps the cached tier at `max_items` entries.
    pub fn max_items(mut self, max_items: usize) -> Self {
        self.config.max_items = Some(max_items);
        self
    }

    /// Sets the total byte budget.
    pub fn max_size(mut self, bytes: usize) -> Self {
        self.config.max_size = Some(bytes);
        self
    }

    /// Sets the bucket rotation interval.
    pub fn cache_time(mut self, interval: Duration) -> Self {
        self.config.cache_time = interval;
        self
    }

    /// Sets the number of buckets per history.
    pub fn precision(mut self, precision: usize) -> Self {
        self.config.precision = precision;
        self
    }

    /// Sets the time-to-live of cached values.
    pub fn stale_time(mut self, ttl: Duration) -> Self {
        self.config.stale_time = Some(ttl);
        self
    }

    /// Sets the age weighting.
    pub fn weighting(mut self, weighting: Weighting) -> Self {
        self.config.weighting = weighting;
        self
    }

    /// Sets the floor on watched-tier capacity.
    pub fn min_watched_items(mut self, items: usize) -> Self {
        self.config.min_watched_items = items;
        self
    }

    /// Seeds weak-entry sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Returns the configuration built so far.
    pub fn config(&self) -> &TwoTierConfig {
        &self.config
    }

    /// Builds a cache on the system clock.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid. See [`try_build`](Self::try_build).
    pub fn build<K, V>(self) -> TwoTierCache<K, V>
    where
        K: Eq + Hash + Clone,
        V: EstimateSize,
    {
        match self.try_build() {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// Builds a cache on the system clock, rejecting invalid configuration.
    pub fn try_build<K, V>(self) -> Result<TwoTierCache<K, V>, ConfigError>
    where
        K: Eq + Hash + Clone,
        V: EstimateSize,
    {
        TwoTierCache::try_new(self.config)
    }

    /// Builds a cache that reads time from `clock`.
    pub fn try_build_with_clock<K, V, C>(self, clock: C) -> Result<TwoTierCache<K, V, C>, ConfigError>
    where
        K: Eq + Hash + Clone,
        V: EstimateSize,
        C: Clock,
    {
        TwoTierCache::with_clock(self.config, clock)
    }

    /// Builds a cache that charges values with `weigher` instead of
    /// [`EstimateSize`].
    pub fn try_build_with_weigher<K, V, C>(
        self,
        clock: C,
        weigher: fn(&V) -> usize,
    ) -> Result<TwoTierCache<K, V, C>, ConfigError>
    where
        K: Eq + Hash + Clone,
        C: Clock,
    {
        TwoTierCache::with_weigher(self.config, clock, weigher)
    }
}
