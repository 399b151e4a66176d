//! Time-bucketed access counters and the shared rotation window.
//!
//! Every tracked key owns a [`PopularityHistory`]: a ring of `precision`
//! saturating counters, one per `cache_time` period. Which slot is "now" is
//! not stored per entry; a single [`BucketWindow`] owned by the cache holds
//! the shared cursor and is passed explicitly to every record and score call,
//! so a score is a pure function of `(history, window)`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │               BucketWindow { current: 2, precision: 4 }                     │
//! │                                                                             │
//! │   history.buckets:   [ 3 ][ 0 ][ 5 ][ 1 ]                                   │
//! │                        0    1    2    3                                     │
//! │                                  ▲                                          │
//! │                               current                                       │
//! │                                                                             │
//! │   age 0 → buckets[2] = 5   (this period)                                    │
//! │   age 1 → buckets[1] = 0                                                    │
//! │   age 2 → buckets[0] = 3                                                    │
//! │   age 3 → buckets[3] = 1   (oldest, zeroed by the next rotation)            │
//! │                                                                             │
//! │   score = Σ buckets[(current - age + precision) % precision] * weight(age)  │
//! │                                                                             │
//! │   Flat:           weight(age) = 1                      → 9                  │
//! │   RecencyBiased:  weight(age) = 2^(precision-1-age)    → 40 + 0 + 6 + 1     │
//! │   AgeBiased:      weight(age) = 2^age                  → 5 + 0 + 12 + 8     │
//! └─────────────────────────────────────────────────────────────────────────────┘
//!
//! Rotation
//! ────────
//!   window.advance()          current = (current + 1) % precision
//!   history.reset_bucket(current)   for every tracked entry
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use hotset::ds::{BucketWindow, PopularityHistory, Weighting};
//!
//! let mut window = BucketWindow::new(3, Weighting::Flat);
//! let mut history = PopularityHistory::new(3);
//!
//! history.record(&window);
//! history.record(&window);
//! assert_eq!(window.score(&history), 2);
//!
//! // Two rotations later the old counts are still inside the window...
//! let next = window.advance();
//! history.reset_bucket(next);
//! history.record(&window);
//! assert_eq!(window.score(&history), 3);
//!
//! // ...until the ring wraps onto them.
//! let next = window.advance();
//! history.reset_bucket(next);
//! let next = window.advance();
//! history.reset_bucket(next);
//! assert_eq!(window.score(&history), 1);
//! ```

/// Largest supported bucket count; exponential weights must fit in `u64`.
pub const MAX_PRECISION: usize = 64;

/// How bucket counts are weighted by age when computing a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Weighting {
    /// Every bucket in the window counts once: plain access frequency.
    #[default]
    Flat,
    /// The current bucket weighs most; each older bucket half as much.
    RecencyBiased,
    /// The oldest bucket weighs most; each newer bucket half as much.
    ///
    /// Favors keys that were hot in the past over keys that are hot now.
    AgeBiased,
}

impl Weighting {
    /// Weight applied to the bucket `age` periods behind the current one.
    #[inline]
    pub fn weight(self, age: usize, precision: usize) -> u64 {
        match self {
            Weighting::Flat => 1,
            Weighting::RecencyBiased => 1u64 << (precision - 1 - age),
            Weighting::AgeBiased => 1u64 << age,
        }
    }
}

/// Shared cursor over every entry's bucket ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketWindow {
    current: usize,
    precision: usize,
    weighting: Weighting,
}

impl BucketWindow {
    /// Creates a window over `precision` buckets starting at bucket 0.
    ///
    /// # Panics
    ///
    /// Panics if `precision` is 0 or greater than [`MAX_PRECISION`].
    pub fn new(precision: usize, weighting: Weighting) -> Self {
        assert!(
            (1..=MAX_PRECISION).contains(&precision),
            "precision must be in 1..={MAX_PRECISION}"
        );
        Self {
            current: 0,
            precision,
            weighting,
        }
    }

    /// Index of the bucket accesses are currently recorded into.
    #[inline]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Number of buckets per history.
    #[inline]
    pub fn precision(&self) -> usize {
        self.precision
    }

    /// The weighting scheme used by [`score`](Self::score).
    #[inline]
    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    /// Advances the cursor one bucket and returns the new current index.
    ///
    /// Callers must zero that bucket in every history they track.
    #[inline]
    pub fn advance(&mut self) -> usize {
        self.current = (self.current + 1) % self.precision;
        self.current
    }

    /// Weighted sum of `history` read backwards from the current bucket.
    pub fn score(&self, history: &PopularityHistory) -> u64 {
        let buckets = &history.buckets;
        debug_assert_eq!(buckets.len(), self.precision);
        (0..self.precision).fold(0u64, |acc, age| {
            let idx = (self.current + self.precision - age) % self.precision;
            let weighted =
                u64::from(buckets[idx]).saturating_mul(self.weighting.weight(age, self.precision));
            acc.saturating_add(weighted)
        })
    }
}

/// Ring of saturating per-period access counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PopularityHistory {
    buckets: Box<[u32]>,
}

impl PopularityHistory {
    /// Creates an all-zero history of `precision` buckets.
    pub fn new(precision: usize) -> Self {
        Self {
            buckets: vec![0; precision].into_boxed_slice(),
        }
    }

    /// Counts one access in the window's current bucket.
    #[inline]
    pub fn record(&mut self, window: &BucketWindow) {
        let bucket = &mut self.buckets[window.current()];
        *bucket = bucket.saturating_add(1);
    }

    /// Zeroes bucket `index`.
    #[inline]
    pub fn reset_bucket(&mut self, index: usize) {
        self.buckets[index] = 0;
    }

    /// Zeroes every bucket.
    pub fn clear(&mut self) {
        self.buckets.fill(0);
    }

    /// Unweighted access count across the whole window.
    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|&count| u64::from(count)).sum()
    }

    /// Raw bucket counters, indexed by bucket position.
    #[inline]
    pub fn buckets(&self) -> &[u32] {
        &self.buckets
    }

    /// Number of buckets.
    #[inline]
    pub fn precision(&self) -> usize {
        self.buckets.len()
    }

    /// Heap bytes held by the bucket ring.
    #[inline]
    pub fn heap_bytes(&self) -> usize {
        std::mem::size_of_val(&*self.buckets)
    }
}
