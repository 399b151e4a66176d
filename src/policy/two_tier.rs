//! Two-tier popularity-aware cache.
//!
//! Keys are tracked in one of two tiers. The **cached** tier stores values
//! and is bounded by an item cap and/or a byte budget. The **watched** tier
//! stores only a key's access history. A key earns a place in the cached tier
//! by out-scoring the weakest cached entry, so one-off keys from a scan never
//! displace keys that are genuinely hot.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                        TwoTierCache<K, V, C>                             │
//! │                                                                          │
//! │   cached:  ScoreHeap<K, CachedEntry<V>>    value + history + expires_at  │
//! │            bounded by max_items and 90% of max_size                      │
//! │                                                                          │
//! │   watched: ScoreHeap<K, WatchedEntry>      history only                  │
//! │            bounded by watched_max_items                                  │
//! │                                                                          │
//! │   expiry:  ExpiryQueue<K>                  cached keys with a TTL        │
//! │   window:  BucketWindow                    shared bucket cursor          │
//! └──────────────────────────────────────────────────────────────────────────┘
//!
//! Key lifecycle
//! ─────────────
//!
//!            set (room or out-scores worst)
//!   Absent ─────────────────────────────────────────► Cached
//!     │                                                 │  ▲
//!     │ set (no room)                  expire/invalidate│  │ set (out-scores
//!     ▼                                                 ▼  │      worst)
//!   Watched ◄───────────────────────────────────────────┘  │
//!     └────────────────────────────────────────────────────┘
//!
//!   delete / invalidate_all / capacity eviction ──► Absent
//! ```
//!
//! ## Admission
//!
//! | Step               | Rule                                                       |
//! |--------------------|------------------------------------------------------------|
//! | Direct admission   | Cached tier has item and byte room                         |
//! | Replacement        | Candidate scores strictly above `peek_worst`               |
//! | Watched insert     | Watched tier has room                                      |
//! | Watched replace    | Candidate scores strictly above a `sample_weak` pick       |
//! | Drop               | Otherwise; the `set` has no observable effect              |
//!
//! Scores are the weighted bucket sums described in
//! [`ds::popularity`](crate::ds::popularity).
//!
//! ## Example Usage
//!
//! ```
//! use hotset::builder::TwoTierBuilder;
//! use hotset::policy::two_tier::Tier;
//!
//! let mut cache = TwoTierBuilder::new().max_items(2).build::<&str, u32>();
//!
//! cache.set("a", 1);
//! cache.set("b", 2);
//! cache.get(&"a");
//! cache.get(&"b");
//!
//! // Full, and "c" is colder than anything cached: it is only watched.
//! cache.set("c", 3);
//! assert_eq!(cache.tier_of(&"c"), Some(Tier::Watched));
//! assert_eq!(cache.get(&"c"), None);
//!
//! // Each access warms it up until it out-scores the weakest cached key.
//! cache.get(&"c");
//! cache.set("c", 3);
//! assert_eq!(cache.get(&"c").as_deref(), Some(&3));
//! assert_eq!(cache.size(), 2);
//! ```
//!
//! ## Thread Safety
//!
//! - [`TwoTierCache`]: single-threaded; every operation takes `&mut self`
//!   because even `get` updates popularity.
//! - [`ConcurrentTwoTierCache`]: one `parking_lot::Mutex` around the whole
//!   cache. Both tiers are touched by most operations, so finer locking would
//!   not preserve tier exclusivity.

use std::fmt;
use std::hash::Hash;
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "concurrency")]
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::builder::TwoTierConfig;
use crate::ds::{BucketWindow, ExpiryQueue, PopularityHistory, ScoreHeap};
use crate::error::{ConfigError, InvariantError};
#[cfg(feature = "metrics")]
use crate::metrics::{
    MetricsSnapshotProvider, TwoTierMetrics, TwoTierMetricsReadRecorder, TwoTierMetricsRecorder,
    TwoTierMetricsSnapshot,
};
use crate::size::{EstimateSize, estimate_size, human_bytes};
use crate::time::{Clock, SystemClock};

/// Heap slot fields charged per entry: score, sequence number and byte count.
const SLOT_BOOKKEEPING: usize = 3 * mem::size_of::<u64>();

/// Which tier currently tracks a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Value stored and returned by `get`.
    Cached,
    /// Only the access history is kept.
    Watched,
}

#[derive(Debug)]
struct CachedEntry<V> {
    value: Arc<V>,
    size: usize,
    history: PopularityHistory,
    expires_at: Option<Instant>,
}

impl<V> CachedEntry<V> {
    fn payload(entry: &Self) -> usize {
        entry.size
    }
}

#[derive(Debug, Clone)]
struct WatchedEntry {
    history: PopularityHistory,
}

impl WatchedEntry {
    fn payload(_: &Self) -> usize {
        0
    }
}

fn cached_entry_overhead<K, V>(precision: usize) -> usize {
    mem::size_of::<K>()
        + mem::size_of::<CachedEntry<V>>()
        + SLOT_BOOKKEEPING
        + precision * mem::size_of::<u32>()
}

fn watched_entry_overhead<K>(precision: usize) -> usize {
    mem::size_of::<K>()
        + mem::size_of::<WatchedEntry>()
        + SLOT_BOOKKEEPING
        + precision * mem::size_of::<u32>()
}

/// Popularity-aware cache with a value-holding tier and a history-only tier.
///
/// `get` returns `Arc<V>` handles, so a value handed out stays valid after
/// the entry is evicted without exposing the cache's bookkeeping.
///
/// # Type Parameters
///
/// - `K`: Key type (`Eq + Hash + Clone`)
/// - `V`: Value type
/// - `C`: Time source, [`SystemClock`] by default
pub struct TwoTierCache<K, V, C = SystemClock> {
    cached: ScoreHeap<K, CachedEntry<V>>,
    watched: ScoreHeap<K, WatchedEntry>,
    expiry: ExpiryQueue<K>,
    window: BucketWindow,
    config: TwoTierConfig,
    cached_max_bytes: Option<usize>,
    watched_max_items: usize,
    weigher: fn(&V) -> usize,
    clock: C,
    last_rotation: Instant,
    #[cfg(feature = "metrics")]
    metrics: TwoTierMetrics,
}

impl<K, V> TwoTierCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
    V: EstimateSize,
{
    /// Creates a cache on the system clock.
    ///
    /// # Panics
    ///
    /// Panics if `config` is invalid. See [`try_new`](Self::try_new).
    pub fn new(config: TwoTierConfig) -> Self {
        match Self::try_new(config) {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates a cache on the system clock, rejecting invalid configuration.
    pub fn try_new(config: TwoTierConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, SystemClock)
    }
}

impl<K, V, C> TwoTierCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: EstimateSize,
    C: Clock,
{
    /// Creates a cache that reads time from `clock` and sizes values with
    /// [`estimate_size`].
    pub fn with_clock(config: TwoTierConfig, clock: C) -> Result<Self, ConfigError> {
        Self::with_weigher(config, clock, estimate_size::<V>)
    }
}

impl<K, V, C> TwoTierCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    /// Creates a cache that charges each value `weigher(value)` bytes.
    pub fn with_weigher(
        config: TwoTierConfig,
        clock: C,
        weigher: fn(&V) -> usize,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let precision = config.precision;
        let mut cached = ScoreHeap::with_accounting(
            CachedEntry::<V>::payload,
            cached_entry_overhead::<K, V>(precision),
        );
        let mut watched = ScoreHeap::with_accounting(
            WatchedEntry::payload,
            watched_entry_overhead::<K>(precision),
        );
        if let Some(seed) = config.seed {
            cached = cached.with_seed(seed);
            watched = watched.with_seed(seed.rotate_left(32));
        }
        let watched_max_items = match config.watched_max_bytes() {
            Some(bytes) => (bytes / watched.per_entry_cost()).max(config.min_watched_items),
            None => config.min_watched_items,
        };
        let last_rotation = clock.now();

        Ok(Self {
            cached,
            watched,
            expiry: ExpiryQueue::new(),
            window: BucketWindow::new(precision, config.weighting),
            cached_max_bytes: config.cached_max_bytes(),
            watched_max_items,
            config,
            weigher,
            clock,
            last_rotation,
            #[cfg(feature = "metrics")]
            metrics: TwoTierMetrics::default(),
        })
    }

    // -----------------------------------------------------------------------
    // Public operations
    // -----------------------------------------------------------------------

    /// Looks up `key`, counting one access.
    ///
    /// Returns the value only for cached keys. A watched key still gains
    /// popularity, which is how it works its way into the cached tier.
    pub fn get(&mut self, key: &K) -> Option<Arc<V>> {
        self.drain_expired();

        if let Some(entry) = self.cached.get_mut(key) {
            entry.history.record(&self.window);
            let value = Arc::clone(&entry.value);
            let score = self.window.score(&entry.history);
            self.cached.update(key, score);
            #[cfg(feature = "metrics")]
            self.metrics.record_get_hit();
            return Some(value);
        }

        if let Some(entry) = self.watched.get_mut(key) {
            entry.history.record(&self.window);
            let score = self.window.score(&entry.history);
            self.watched.update(key, score);
            #[cfg(feature = "metrics")]
            self.metrics.record_get_watched_hit();
            return None;
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_get_miss();
        None
    }

    /// Stores `value` under `key`.
    ///
    /// Never fails from the caller's point of view: the value ends up cached,
    /// the key ends up watched, or the call is dropped because neither tier
    /// would take it.
    pub fn set(&mut self, key: K, value: V) {
        self.drain_expired();
        #[cfg(feature = "metrics")]
        self.metrics.record_set_call();

        let size = (self.weigher)(&value);
        let expires_at = self.config.stale_time.map(|ttl| self.clock.now() + ttl);

        if self.cached.contains(&key) {
            self.update_cached(key, value, size, expires_at);
            return;
        }

        let (key, history, promoted) = match self.watched.remove(&key) {
            Some((key, mut watched)) => {
                watched.history.record(&self.window);
                (key, watched.history, true)
            }
            None => {
                let mut history = PopularityHistory::new(self.config.precision);
                history.record(&self.window);
                (key, history, false)
            }
        };
        let candidate = CachedEntry {
            value: Arc::new(value),
            size,
            history,
            expires_at,
        };
        self.admit_or_watch(key, candidate, promoted);
    }

    /// Removes `key` from whichever tier holds it.
    ///
    /// Returns `true` if the key was tracked.
    pub fn delete(&mut self, key: &K) -> bool {
        if self.cached.delete(key) {
            self.expiry.delete(key);
            self.recompute_watched_capacity();
            return true;
        }
        self.watched.delete(key)
    }

    /// Drops the cached value for `key` but keeps its access history in the
    /// watched tier.
    ///
    /// Returns `true` if `key` was cached. Watched keys are left alone.
    pub fn invalidate(&mut self, key: &K) -> bool {
        let Some((key, entry)) = self.cached.remove(key) else {
            return false;
        };
        self.expiry.delete(&key);
        self.recompute_watched_capacity();
        #[cfg(feature = "metrics")]
        self.metrics.record_invalidation();
        debug!(
            score = self.window.score(&entry.history),
            bytes = entry.size,
            "invalidated cached entry"
        );
        self.add_to_watched(
            key,
            WatchedEntry {
                history: entry.history,
            },
        );
        true
    }

    /// [`invalidate`](Self::invalidate)s every cached key matching
    /// `predicate`, returning how many were demoted.
    pub fn invalidate_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&K) -> bool,
    {
        let matching: Vec<K> = self
            .cached
            .keys()
            .filter(|key| predicate(key))
            .cloned()
            .collect();
        matching
            .iter()
            .filter(|key| self.invalidate(key))
            .count()
    }

    /// Forgets every key in both tiers.
    pub fn invalidate_all(&mut self) {
        self.cached.clear();
        self.watched.clear();
        self.expiry.clear();
        self.recompute_watched_capacity();
        #[cfg(feature = "metrics")]
        self.metrics.record_clear();
        debug!("cleared both tiers");
    }

    /// Advances the bucket window by one period.
    ///
    /// The bucket that becomes current is zeroed in every tracked history and
    /// both tiers are re-ordered. Nothing is evicted.
    pub fn tick(&mut self) {
        let bucket = self.window.advance();
        let window = self.window;
        self.cached.rescore_all(|_, entry| {
            entry.history.reset_bucket(bucket);
            window.score(&entry.history)
        });
        self.watched.rescore_all(|_, entry| {
            entry.history.reset_bucket(bucket);
            window.score(&entry.history)
        });
        #[cfg(feature = "metrics")]
        self.metrics.record_rotation();
        debug!(
            bucket,
            cached = self.cached.len(),
            watched = self.watched.len(),
            memory = %human_bytes(self.memory()),
            "rotated popularity buckets"
        );
    }

    /// Applies one [`tick`](Self::tick) per whole `cache_time` elapsed on the
    /// clock since the last rotation, and returns how many were applied.
    ///
    /// At most `precision` ticks are applied; past that every bucket is
    /// already zero.
    pub fn rotate_elapsed(&mut self) -> usize {
        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(self.last_rotation);
        let period = self.config.cache_time.as_nanos();
        let periods = elapsed.as_nanos() / period;
        if periods == 0 {
            return 0;
        }
        let remainder = u64::try_from(elapsed.as_nanos() % period).unwrap_or(u64::MAX);
        self.last_rotation = now - Duration::from_nanos(remainder);

        let rotations = usize::try_from(periods)
            .unwrap_or(usize::MAX)
            .min(self.config.precision);
        for _ in 0..rotations {
            self.tick();
        }
        rotations
    }

    /// Number of cached entries.
    #[inline]
    pub fn size(&self) -> usize {
        self.cached.len()
    }

    /// Number of watched keys.
    #[inline]
    pub fn watched_len(&self) -> usize {
        self.watched.len()
    }

    /// Returns `true` if no value is cached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cached.is_empty()
    }

    /// Estimated bytes held by both tiers, overhead included.
    #[inline]
    pub fn memory(&self) -> usize {
        self.cached.memory() + self.watched.memory()
    }

    /// Fill level against the configured limits.
    ///
    /// The larger of `memory() / max_size` and `size() / max_items`, using
    /// whichever are configured. `None` when the cache is unbounded.
    pub fn utilization(&self) -> Option<f64> {
        let bytes = self
            .config
            .max_size
            .map(|max| self.memory() as f64 / max as f64);
        let items = self
            .config
            .max_items
            .map(|max| self.cached.len() as f64 / max as f64);
        match (bytes, items) {
            (Some(bytes), Some(items)) => Some(bytes.max(items)),
            (bytes, items) => bytes.or(items),
        }
    }

    /// Returns `true` if `key` is cached. Does not count as an access.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.cached.contains(key)
    }

    /// Returns the cached value for `key` without counting an access.
    ///
    /// Expired values are reported as absent but left for the next `get` or
    /// `set` to demote.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        #[cfg(feature = "metrics")]
        self.metrics.record_peek_call();
        let entry = self.cached.get(key)?;
        if entry.expires_at.is_some_and(|at| at <= self.clock.now()) {
            return None;
        }
        #[cfg(feature = "metrics")]
        self.metrics.record_peek_found();
        Some(Arc::clone(&entry.value))
    }

    /// Which tier tracks `key`, if any.
    pub fn tier_of(&self, key: &K) -> Option<Tier> {
        if self.cached.contains(key) {
            Some(Tier::Cached)
        } else if self.watched.contains(key) {
            Some(Tier::Watched)
        } else {
            None
        }
    }

    /// Current score of `key` in whichever tier holds it.
    pub fn popularity(&self, key: &K) -> Option<u64> {
        self.cached
            .score_of(key)
            .or_else(|| self.watched.score_of(key))
    }

    /// Configured cap on cached entries.
    #[inline]
    pub fn capacity_items(&self) -> Option<usize> {
        self.config.max_items
    }

    /// Byte budget of the cached tier.
    #[inline]
    pub fn cached_max_bytes(&self) -> Option<usize> {
        self.cached_max_bytes
    }

    /// Current cap on watched keys.
    #[inline]
    pub fn watched_max_items(&self) -> usize {
        self.watched_max_items
    }

    /// The configuration the cache was built with.
    #[inline]
    pub fn config(&self) -> &TwoTierConfig {
        &self.config
    }

    /// The cache's time source.
    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Verifies tier exclusivity, capacity bounds, score freshness and
    /// expiry bookkeeping.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.cached.check_invariants()?;
        self.watched.check_invariants()?;

        if let Some(max) = self.config.max_items.filter(|&max| self.cached.len() > max) {
            return Err(InvariantError::new(format!(
                "cached tier holds {} entries, cap is {}",
                self.cached.len(),
                max
            )));
        }
        if let Some(max) = self
            .cached_max_bytes
            .filter(|&max| self.cached.memory() > max)
        {
            return Err(InvariantError::new(format!(
                "cached tier uses {} bytes, budget is {}",
                self.cached.memory(),
                max
            )));
        }
        if self.watched.len() > self.watched_max_items {
            return Err(InvariantError::new(format!(
                "watched tier holds {} keys, cap is {}",
                self.watched.len(),
                self.watched_max_items
            )));
        }

        let mut with_ttl = 0usize;
        for (key, entry) in self.cached.iter() {
            if self.watched.contains(key) {
                return Err(InvariantError::new("key is tracked in both tiers"));
            }
            if self.cached.score_of(key) != Some(self.window.score(&entry.history)) {
                return Err(InvariantError::new("cached score is out of date"));
            }
            if self.expiry.deadline_of(key) != entry.expires_at {
                return Err(InvariantError::new(
                    "expiry queue disagrees with cached deadline",
                ));
            }
            with_ttl += usize::from(entry.expires_at.is_some());
        }
        if self.expiry.len() != with_ttl {
            return Err(InvariantError::new(format!(
                "expiry queue holds {} keys, {} cached entries have a deadline",
                self.expiry.len(),
                with_ttl
            )));
        }
        for (key, entry) in self.watched.iter() {
            if self.watched.score_of(key) != Some(self.window.score(&entry.history)) {
                return Err(InvariantError::new("watched score is out of date"));
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Admission helpers
    // -----------------------------------------------------------------------

    /// Re-`set` of a cached key: replace the value in place, keeping the
    /// history, unless the new value breaks the byte budget.
    fn update_cached(&mut self, key: K, value: V, size: usize, expires_at: Option<Instant>) {
        let old_size = self.cached.get(&key).map_or(0, |entry| entry.size);
        let fits = self
            .cached_max_bytes
            .is_none_or(|max| self.cached.memory() - old_size + size <= max);

        if !fits {
            let Some((key, entry)) = self.cached.remove(&key) else {
                return;
            };
            self.expiry.delete(&key);
            self.recompute_watched_capacity();
            trace!(bytes = size, "re-set outgrew the byte budget, re-admitting");
            let candidate = CachedEntry {
                value: Arc::new(value),
                size,
                history: entry.history,
                expires_at,
            };
            self.admit_or_watch(key, candidate, false);
            return;
        }

        let Some(entry) = self.cached.get_mut(&key) else {
            return;
        };
        entry.value = Arc::new(value);
        entry.size = size;
        entry.expires_at = expires_at;
        let score = self.window.score(&entry.history);
        self.cached.update(&key, score);
        match expires_at {
            Some(at) => {
                self.expiry.push(key, at);
            }
            None => {
                self.expiry.delete(&key);
            }
        }
        self.recompute_watched_capacity();
        #[cfg(feature = "metrics")]
        self.metrics.record_set_update();
    }

    /// Tries the cached tier, then falls back to the watched tier.
    ///
    /// `promoted` marks a candidate that came out of the watched tier.
    fn admit_or_watch(&mut self, key: K, candidate: CachedEntry<V>, promoted: bool) {
        match self.load_to_cache(key, candidate) {
            Ok(()) => {
                #[cfg(feature = "metrics")]
                {
                    if promoted {
                        self.metrics.record_promotion();
                    } else {
                        self.metrics.record_admission();
                    }
                }
                trace!(promoted, "admitted to cached tier");
            }
            Err((key, rejected)) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_rejected_admission();
                trace!(
                    score = self.window.score(&rejected.history),
                    "cached tier rejected candidate"
                );
                self.add_to_watched(
                    key,
                    WatchedEntry {
                        history: rejected.history,
                    },
                );
            }
        }
    }

    /// Inserts `candidate` into the cached tier if there is room, evicting
    /// weaker entries while the candidate strictly out-scores the worst.
    ///
    /// Hands the candidate back if it does not get in. Nothing is evicted
    /// unless the evictions make room.
    fn load_to_cache(
        &mut self,
        key: K,
        candidate: CachedEntry<V>,
    ) -> Result<(), (K, CachedEntry<V>)> {
        let cost = candidate.size + self.cached.per_entry_cost();
        if self.cached_max_bytes.is_some_and(|max| cost > max) {
            return Err((key, candidate));
        }
        let score = self.window.score(&candidate.history);
        if !self.has_room(cost) && !self.can_make_room(cost, score) {
            return Err((key, candidate));
        }

        while !self.has_room(cost) {
            match self.cached.peek_worst() {
                Some((_, _, worst)) if score > worst => self.evict_worst(score),
                _ => return Err((key, candidate)),
            }
        }

        let expires_at = candidate.expires_at;
        let indexed = key.clone();
        self.cached
            .push(key, candidate, score)
            .map_err(|err| err.into_entry())?;
        if let Some(at) = expires_at {
            self.expiry.push(indexed, at);
        }
        self.recompute_watched_capacity();
        Ok(())
    }

    fn has_room(&self, cost: usize) -> bool {
        let items = self
            .config
            .max_items
            .is_none_or(|max| self.cached.len() < max);
        let bytes = self
            .cached_max_bytes
            .is_none_or(|max| self.cached.memory() + cost <= max);
        items && bytes
    }

    /// Whether evicting every cached entry scored below `score` would leave
    /// room for `cost` more bytes.
    fn can_make_room(&self, cost: usize, score: u64) -> bool {
        let (items, bytes) = self.cached.reclaimable_below(score);
        let items = self
            .config
            .max_items
            .is_none_or(|max| self.cached.len() - items < max);
        let bytes = self
            .cached_max_bytes
            .is_none_or(|max| self.cached.memory() - bytes + cost <= max);
        items && bytes
    }

    fn evict_worst(&mut self, challenger: u64) {
        let Some((key, entry)) = self.cached.pop_worst() else {
            return;
        };
        self.expiry.delete(&key);
        #[cfg(feature = "metrics")]
        self.metrics.record_cached_eviction();
        debug!(
            score = self.window.score(&entry.history),
            challenger,
            bytes = entry.size,
            "evicted cached entry"
        );
    }

    /// Tracks `key` in the watched tier, replacing a sampled weak key if the
    /// tier is full and `record` scores strictly higher.
    ///
    /// Returns `false` when the record is dropped.
    fn add_to_watched(&mut self, key: K, record: WatchedEntry) -> bool {
        let score = self.window.score(&record.history);

        if self.watched.len() >= self.watched_max_items {
            let weak = match self.watched.sample_weak() {
                Some((weak, _, weak_score)) if weak_score < score => weak.clone(),
                _ => {
                    #[cfg(feature = "metrics")]
                    self.metrics.record_watched_drop();
                    trace!(score, "watched tier full, dropped record");
                    return false;
                }
            };
            self.watched.delete(&weak);
            #[cfg(feature = "metrics")]
            self.metrics.record_watched_replacement();
            debug!(score, "replaced weak watched key");
        }

        let inserted = self.watched.push(key, record, score).is_ok();
        #[cfg(feature = "metrics")]
        {
            if inserted {
                self.metrics.record_watched_insert();
            }
        }
        inserted
    }

    /// Demotes every cached entry whose deadline has passed to a watched
    /// entry with an empty history.
    fn drain_expired(&mut self) {
        let now = self.clock.now();
        while let Some(key) = self.expiry.pop_expired(now) {
            let Some((key, entry)) = self.cached.remove(&key) else {
                continue;
            };
            self.recompute_watched_capacity();
            #[cfg(feature = "metrics")]
            self.metrics.record_expiration();
            debug!(bytes = entry.size, "expired cached entry");
            let fresh = WatchedEntry {
                history: PopularityHistory::new(self.config.precision),
            };
            self.add_to_watched(key, fresh);
        }
    }

    /// Without a byte budget, watched capacity follows the cached tier's
    /// footprint. Trims the watched tier if the cap shrank.
    fn recompute_watched_capacity(&mut self) {
        if self.config.max_size.is_none() {
            let derived = self.cached.memory() / 10 / self.watched.per_entry_cost();
            self.watched_max_items = derived.max(self.config.min_watched_items);
        }
        while self.watched.len() > self.watched_max_items {
            if self.watched.pop_worst().is_none() {
                break;
            }
            #[cfg(feature = "metrics")]
            self.metrics.record_watched_drop();
        }
    }
}

#[cfg(feature = "metrics")]
impl<K, V, C> TwoTierCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    /// Running counters.
    pub fn metrics(&self) -> &TwoTierMetrics {
        &self.metrics
    }

    /// Zeroes every counter.
    pub fn reset_metrics(&mut self) {
        self.metrics = TwoTierMetrics::default();
    }

    /// Copies counters and current gauges.
    pub fn metrics_snapshot(&self) -> TwoTierMetricsSnapshot {
        TwoTierMetricsSnapshot {
            get_calls: self.metrics.get_calls,
            get_hits: self.metrics.get_hits,
            get_watched_hits: self.metrics.get_watched_hits,
            get_misses: self.metrics.get_misses,
            set_calls: self.metrics.set_calls,
            set_updates: self.metrics.set_updates,
            admissions: self.metrics.admissions,
            promotions: self.metrics.promotions,
            rejected_admissions: self.metrics.rejected_admissions,
            cached_evictions: self.metrics.cached_evictions,
            watched_inserts: self.metrics.watched_inserts,
            watched_replacements: self.metrics.watched_replacements,
            watched_drops: self.metrics.watched_drops,
            expirations: self.metrics.expirations,
            invalidations: self.metrics.invalidations,
            rotations: self.metrics.rotations,
            clears: self.metrics.clears,
            peek_calls: self.metrics.peek_calls.get(),
            peek_found: self.metrics.peek_found.get(),
            cached_len: self.cached.len(),
            watched_len: self.watched.len(),
            memory_bytes: self.memory(),
            cached_max_items: self.config.max_items,
            watched_max_items: self.watched_max_items,
        }
    }
}

#[cfg(feature = "metrics")]
impl<K, V, C> MetricsSnapshotProvider<TwoTierMetricsSnapshot> for TwoTierCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    fn snapshot(&self) -> TwoTierMetricsSnapshot {
        self.metrics_snapshot()
    }
}

impl<K, V, C> fmt::Debug for TwoTierCache<K, V, C>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoTierCache")
            .field("cached", &self.cached.len())
            .field("watched", &self.watched.len())
            .field("max_items", &self.config.max_items)
            .field("cached_max_bytes", &self.cached_max_bytes)
            .field("watched_max_items", &self.watched_max_items)
            .field("bucket", &self.window.current())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Concurrent wrapper
// ---------------------------------------------------------------------------

/// Thread-safe [`TwoTierCache`] behind a single `parking_lot::Mutex`.
///
/// Clones share the same cache.
///
/// ```
/// use std::thread;
///
/// use hotset::builder::TwoTierConfig;
/// use hotset::policy::two_tier::{ConcurrentTwoTierCache, TwoTierCache};
///
/// let cache = ConcurrentTwoTierCache::new(TwoTierCache::<u32, u32>::new(TwoTierConfig {
///     max_items: Some(100),
///     ..TwoTierConfig::default()
/// }));
///
/// let handles: Vec<_> = (0..4u32)
///     .map(|t| {
///         let cache = cache.clone();
///         thread::spawn(move || {
///             for i in 0..10 {
///                 cache.set(t * 10 + i, i);
///             }
///         })
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// assert_eq!(cache.size(), 40);
/// ```
#[cfg(feature = "concurrency")]
pub struct ConcurrentTwoTierCache<K, V, C = SystemClock> {
    inner: Arc<Mutex<TwoTierCache<K, V, C>>>,
}

#[cfg(feature = "concurrency")]
impl<K, V, C> Clone for ConcurrentTwoTierCache<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(feature = "concurrency")]
impl<K, V, C> ConcurrentTwoTierCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    /// Wraps an existing cache.
    pub fn new(cache: TwoTierCache<K, V, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// See [`TwoTierCache::get`].
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.inner.lock().get(key)
    }

    /// See [`TwoTierCache::set`].
    pub fn set(&self, key: K, value: V) {
        self.inner.lock().set(key, value);
    }

    /// See [`TwoTierCache::delete`].
    pub fn delete(&self, key: &K) -> bool {
        self.inner.lock().delete(key)
    }

    /// See [`TwoTierCache::invalidate`].
    pub fn invalidate(&self, key: &K) -> bool {
        self.inner.lock().invalidate(key)
    }

    /// See [`TwoTierCache::invalidate_where`].
    pub fn invalidate_where<F>(&self, predicate: F) -> usize
    where
        F: FnMut(&K) -> bool,
    {
        self.inner.lock().invalidate_where(predicate)
    }

    /// See [`TwoTierCache::invalidate_all`].
    pub fn invalidate_all(&self) {
        self.inner.lock().invalidate_all();
    }

    /// See [`TwoTierCache::tick`].
    pub fn tick(&self) {
        self.inner.lock().tick();
    }

    /// See [`TwoTierCache::rotate_elapsed`].
    pub fn rotate_elapsed(&self) -> usize {
        self.inner.lock().rotate_elapsed()
    }

    /// See [`TwoTierCache::size`].
    pub fn size(&self) -> usize {
        self.inner.lock().size()
    }

    /// See [`TwoTierCache::watched_len`].
    pub fn watched_len(&self) -> usize {
        self.inner.lock().watched_len()
    }

    /// See [`TwoTierCache::memory`].
    pub fn memory(&self) -> usize {
        self.inner.lock().memory()
    }

    /// See [`TwoTierCache::utilization`].
    pub fn utilization(&self) -> Option<f64> {
        self.inner.lock().utilization()
    }

    /// See [`TwoTierCache::contains`].
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    /// See [`TwoTierCache::peek`].
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.inner.lock().peek(key)
    }

    /// See [`TwoTierCache::tier_of`].
    pub fn tier_of(&self, key: &K) -> Option<Tier> {
        self.inner.lock().tier_of(key)
    }

    /// See [`TwoTierCache::popularity`].
    pub fn popularity(&self, key: &K) -> Option<u64> {
        self.inner.lock().popularity(key)
    }

    /// See [`TwoTierCache::check_invariants`].
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.lock().check_invariants()
    }

    /// Runs `f` with exclusive access to the underlying cache.
    pub fn with_cache<R>(&self, f: impl FnOnce(&mut TwoTierCache<K, V, C>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// See [`TwoTierCache::metrics_snapshot`].
    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> TwoTierMetricsSnapshot {
        self.inner.lock().metrics_snapshot()
    }
}

#[cfg(feature = "concurrency")]
impl<K, V, C> fmt::Debug for ConcurrentTwoTierCache<K, V, C>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentTwoTierCache")
            .field("inner", &*self.inner.lock())
            .finish()
    }
}
