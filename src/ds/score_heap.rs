//! Key-indexed min-heap with byte accounting and weak-entry sampling.
//!
//! Orders entries by a caller-supplied score (lower = more evictable) and
//! keeps a position index so any key can be updated or removed in O(log n).
//! Unlike [`ExpiryQueue`](crate::ds::ExpiryQueue), which defers cleanup and
//! skips stale heap entries, every slot here is live: the index always points
//! at the slot's current position.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                         ScoreHeap<K, E, S> Layout                           │
//! │                                                                             │
//! │   index: FxHashMap<K, usize>          slots: Vec<Slot>  (binary min-heap)   │
//! │                                                                             │
//! │   ┌───────┬─────┐                     pos  key   score  seq  bytes          │
//! │   │ "b"   │  0  │──────────────────►  0    "b"     1     1    12            │
//! │   │ "c"   │  1  │──────────────────►  1    "c"     4     2     8            │
//! │   │ "a"   │  2  │──────────────────►  2    "a"     9     0    30            │
//! │   └───────┴─────┘                                                           │
//! │                                                                             │
//! │   payload_bytes = 50                                                        │
//! │   memory()      = 50 + len * (entry_overhead + INDEX_OVERHEAD)              │
//! │                                                                             │
//! │   generation: bumped on every order-changing mutation                       │
//! │   sorted_generation: generation at which `slots` was last fully sorted      │
//! └─────────────────────────────────────────────────────────────────────────────┘
//!
//! Weak Sampling
//! ─────────────
//!   sample_weak():
//!     if sorted_generation != Some(generation):
//!       sort slots ascending by (score, seq)   (a sorted array is a valid heap)
//!       rewrite index positions
//!       sorted_generation = Some(generation)
//!     tail = max(1, ceil(log2(len)))
//!     return slots[random(0..tail)]
//! ```
//!
//! ## Operations
//!
//! | Operation      | Description                              | Complexity          |
//! |----------------|------------------------------------------|---------------------|
//! | `push`         | Insert a new key, rejects duplicates     | O(log n)            |
//! | `remove`       | Remove by key                            | O(log n)            |
//! | `update`       | Re-sift after an in-place mutation       | O(log n)            |
//! | `peek_worst`   | Lowest-scored entry                      | O(1)                |
//! | `pop_worst`    | Remove lowest-scored entry               | O(log n)            |
//! | `get`/`get_mut`| Lookup by key                            | O(1)                |
//! | `rescore_all`  | Recompute every score, heapify           | O(n)                |
//! | `sample_weak`  | Random pick among the ~log2(n) weakest   | O(n log n) / O(1)   |
//!
//! ## Example Usage
//!
//! ```
//! use hotset::ds::ScoreHeap;
//!
//! let mut heap: ScoreHeap<&str, String> =
//!     ScoreHeap::with_accounting(|value: &String| value.len(), 16);
//!
//! heap.push("a", "alpha".to_string(), 9).unwrap();
//! heap.push("b", "be".to_string(), 1).unwrap();
//! assert!(heap.push("a", "again".to_string(), 3).is_err());
//!
//! assert_eq!(heap.peek_worst().map(|(key, _, score)| (*key, score)), Some(("b", 1)));
//! assert_eq!(heap.payload_bytes(), 7);
//!
//! // Mutate in place, then restore order.
//! heap.get_mut(&"b").unwrap().push_str("eeee");
//! heap.update(&"b", 20);
//! assert_eq!(heap.peek_worst().map(|(key, _, _)| *key), Some("a"));
//! assert_eq!(heap.payload_bytes(), 11);
//! ```
//!
//! ## Thread Safety
//!
//! `ScoreHeap` is not thread-safe. The owning cache serializes access.

use std::fmt;
use std::hash::Hash;
use std::mem;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

use crate::error::{DuplicateKeyError, InvariantError};

/// Per-entry bytes charged for the key index and heap position bookkeeping.
pub const INDEX_OVERHEAD: usize = 2 * mem::size_of::<usize>();

#[derive(Debug)]
struct Slot<K, E, S> {
    key: K,
    score: S,
    seq: u64,
    bytes: usize,
    entry: E,
}

impl<K, E, S: Ord + Copy> Slot<K, E, S> {
    #[inline]
    fn rank(&self) -> (S, u64) {
        (self.score, self.seq)
    }
}

/// Mutable, key-indexed priority queue ordered by ascending score.
///
/// Ties are broken by insertion order, so among equally scored entries the
/// oldest is the worst. Byte accounting is opt-in through
/// [`with_accounting`](Self::with_accounting); without it only the fixed
/// per-entry overhead is charged.
///
/// # Type Parameters
///
/// - `K`: Key type (`Eq + Hash + Clone`)
/// - `E`: Stored entry
/// - `S`: Score type (`Ord + Copy`), defaults to `u64`
pub struct ScoreHeap<K, E, S = u64> {
    slots: Vec<Slot<K, E, S>>,
    index: FxHashMap<K, usize>,
    seq: u64,
    weigher: Option<fn(&E) -> usize>,
    entry_overhead: usize,
    payload_bytes: usize,
    generation: u64,
    sorted_generation: Option<u64>,
    rng: SmallRng,
}

impl<K, E, S> ScoreHeap<K, E, S>
where
    K: Eq + Hash + Clone,
    S: Ord + Copy,
{
    /// Creates an empty heap without payload accounting.
    ///
    /// [`memory`](Self::memory) then reports only the per-slot overhead.
    pub fn new() -> Self {
        Self::build(None, mem::size_of::<Slot<K, E, S>>())
    }

    /// Creates an empty heap that charges `weigher(entry)` payload bytes per
    /// entry plus a fixed `entry_overhead` for its non-payload fields.
    pub fn with_accounting(weigher: fn(&E) -> usize, entry_overhead: usize) -> Self {
        Self::build(Some(weigher), entry_overhead)
    }

    fn build(weigher: Option<fn(&E) -> usize>, entry_overhead: usize) -> Self {
        Self {
            slots: Vec::new(),
            index: FxHashMap::default(),
            seq: 0,
            weigher,
            entry_overhead,
            payload_bytes: 0,
            generation: 0,
            sorted_generation: None,
            rng: SmallRng::from_entropy(),
        }
    }

    /// Reseeds the sampling RNG so [`sample_weak`](Self::sample_weak) is
    /// reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the heap holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns `true` if `key` is present.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Sum of the weigher over all entries (0 without accounting).
    #[inline]
    pub fn payload_bytes(&self) -> usize {
        self.payload_bytes
    }

    /// Fixed bytes charged per entry on top of its payload.
    #[inline]
    pub fn entry_overhead(&self) -> usize {
        self.entry_overhead
    }

    /// Bytes one additional entry costs before its payload is counted.
    #[inline]
    pub fn per_entry_cost(&self) -> usize {
        self.entry_overhead + INDEX_OVERHEAD
    }

    /// Estimated footprint: payload plus per-entry and index overhead.
    #[inline]
    pub fn memory(&self) -> usize {
        self.payload_bytes + self.slots.len() * self.per_entry_cost()
    }

    /// Bytes `entry` would add to [`payload_bytes`](Self::payload_bytes).
    #[inline]
    pub fn weigh(&self, entry: &E) -> usize {
        self.weigher.map_or(0, |weigher| weigher(entry))
    }

    /// Inserts `entry` under `key` with the given score.
    ///
    /// Fails with [`DuplicateKeyError`] (handing the pair back) if `key` is
    /// already present.
    pub fn push(&mut self, key: K, entry: E, score: S) -> Result<(), DuplicateKeyError<(K, E)>> {
        if self.index.contains_key(&key) {
            return Err(DuplicateKeyError::new((key, entry)));
        }
        let bytes = self.weigh(&entry);
        let pos = self.slots.len();
        self.index.insert(key.clone(), pos);
        self.slots.push(Slot {
            key,
            score,
            seq: self.seq,
            bytes,
            entry,
        });
        self.seq = self.seq.wrapping_add(1);
        self.payload_bytes += bytes;
        self.sift_up(pos);
        self.touch();
        Ok(())
    }

    /// Removes `key` and returns its key/entry pair, if present.
    pub fn remove(&mut self, key: &K) -> Option<(K, E)> {
        let pos = self.index.remove(key)?;
        Some(self.take_at(pos))
    }

    /// Removes `key`, returning whether anything was removed.
    pub fn delete(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    /// Re-establishes heap order for `key` after its entry was mutated via
    /// [`get_mut`](Self::get_mut), and re-weighs its payload.
    ///
    /// Returns `false` if `key` is absent.
    pub fn update(&mut self, key: &K, score: S) -> bool {
        let Some(&pos) = self.index.get(key) else {
            return false;
        };
        let new_bytes = match self.weigher {
            Some(weigher) => weigher(&self.slots[pos].entry),
            None => 0,
        };
        let slot = &mut self.slots[pos];
        self.payload_bytes = self.payload_bytes - slot.bytes + new_bytes;
        slot.bytes = new_bytes;
        slot.score = score;
        self.restore(pos);
        self.touch();
        true
    }

    /// Returns the entry for `key`.
    #[inline]
    pub fn get(&self, key: &K) -> Option<&E> {
        self.index.get(key).map(|&pos| &self.slots[pos].entry)
    }

    /// Returns a mutable handle to the entry for `key`.
    ///
    /// Size or score changes only take effect after [`update`](Self::update).
    #[inline]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut E> {
        let pos = *self.index.get(key)?;
        Some(&mut self.slots[pos].entry)
    }

    /// Returns the score `key` is currently ordered by.
    #[inline]
    pub fn score_of(&self, key: &K) -> Option<S> {
        self.index.get(key).map(|&pos| self.slots[pos].score)
    }

    /// Returns the lowest-scored entry without removing it.
    #[inline]
    pub fn peek_worst(&self) -> Option<(&K, &E, S)> {
        self.slots
            .first()
            .map(|slot| (&slot.key, &slot.entry, slot.score))
    }

    /// Entry count and [`memory`](Self::memory) bytes that removing every
    /// entry scored strictly below `score` would release.
    pub fn reclaimable_below(&self, score: S) -> (usize, usize) {
        let per_entry = self.per_entry_cost();
        self.slots
            .iter()
            .filter(|slot| slot.score < score)
            .fold((0, 0), |(items, bytes), slot| {
                (items + 1, bytes + slot.bytes + per_entry)
            })
    }

    /// Removes and returns the lowest-scored entry.
    pub fn pop_worst(&mut self) -> Option<(K, E)> {
        let key = self.slots.first()?.key.clone();
        self.index.remove(&key);
        Some(self.take_at(0))
    }

    /// Iterates over `(key, entry)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &E)> + '_ {
        self.slots.iter().map(|slot| (&slot.key, &slot.entry))
    }

    /// Iterates over entries in unspecified order.
    pub fn values(&self) -> impl Iterator<Item = &E> + '_ {
        self.slots.iter().map(|slot| &slot.entry)
    }

    /// Iterates over keys in unspecified order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.slots.iter().map(|slot| &slot.key)
    }

    /// Lets `rescore` mutate every entry and return its new score, then
    /// rebuilds heap order in O(n).
    pub fn rescore_all<F>(&mut self, mut rescore: F)
    where
        F: FnMut(&K, &mut E) -> S,
    {
        for slot in &mut self.slots {
            slot.score = rescore(&slot.key, &mut slot.entry);
        }
        for pos in (0..self.slots.len() / 2).rev() {
            self.sift_down(pos);
        }
        self.touch();
    }

    /// Returns one entry chosen uniformly among the `max(1, ceil(log2(n)))`
    /// lowest-scored entries.
    ///
    /// The first call after a mutation fully sorts the backing storage; later
    /// calls reuse that order until the next mutation.
    pub fn sample_weak(&mut self) -> Option<(&K, &E, S)> {
        if self.slots.is_empty() {
            return None;
        }
        if self.sorted_generation != Some(self.generation) {
            self.sort_slots();
        }
        let tail = weak_tail_len(self.slots.len());
        let pick = self.rng.gen_range(0..tail);
        let slot = &self.slots[pick];
        Some((&slot.key, &slot.entry, slot.score))
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.payload_bytes = 0;
        self.touch();
    }

    /// Verifies index positions, heap order and byte accounting.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.index.len() != self.slots.len() {
            return Err(InvariantError::new(format!(
                "index holds {} keys but heap holds {} slots",
                self.index.len(),
                self.slots.len()
            )));
        }
        let mut payload = 0usize;
        for (pos, slot) in self.slots.iter().enumerate() {
            if self.index.get(&slot.key) != Some(&pos) {
                return Err(InvariantError::new(format!(
                    "index position mismatch at slot {pos}"
                )));
            }
            if pos > 0 && self.slots[(pos - 1) / 2].rank() > slot.rank() {
                return Err(InvariantError::new(format!(
                    "heap order violated at slot {pos}"
                )));
            }
            if self.weigh(&slot.entry) != slot.bytes {
                return Err(InvariantError::new(format!(
                    "slot {pos} was mutated without update"
                )));
            }
            payload += slot.bytes;
        }
        if payload != self.payload_bytes {
            return Err(InvariantError::new(format!(
                "payload bytes {} != tracked {}",
                payload, self.payload_bytes
            )));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    #[inline]
    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Removes the slot at `pos` whose key is already gone from the index.
    fn take_at(&mut self, pos: usize) -> (K, E) {
        let slot = self.slots.swap_remove(pos);
        if pos < self.slots.len() {
            if let Some(moved) = self.index.get_mut(&self.slots[pos].key) {
                *moved = pos;
            }
            self.restore(pos);
        }
        self.payload_bytes -= slot.bytes;
        self.touch();
        (slot.key, slot.entry)
    }

    fn sort_slots(&mut self) {
        self.slots.sort_unstable_by_key(|slot| slot.rank());
        for (pos, slot) in self.slots.iter().enumerate() {
            if let Some(entry) = self.index.get_mut(&slot.key) {
                *entry = pos;
            }
        }
        self.sorted_generation = Some(self.generation);
    }

    #[inline]
    fn precedes(&self, a: usize, b: usize) -> bool {
        self.slots[a].rank() < self.slots[b].rank()
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.slots.swap(a, b);
        if let Some(pos) = self.index.get_mut(&self.slots[a].key) {
            *pos = a;
        }
        if let Some(pos) = self.index.get_mut(&self.slots[b].key) {
            *pos = b;
        }
    }

    fn restore(&mut self, pos: usize) {
        if self.sift_up(pos) == pos {
            self.sift_down(pos);
        }
    }

    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.precedes(pos, parent) {
                break;
            }
            self.swap_slots(pos, parent);
            pos = parent;
        }
        pos
    }

    fn sift_down(&mut self, mut pos: usize) -> usize {
        let len = self.slots.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.precedes(right, left) {
                right
            } else {
                left
            };
            if !self.precedes(child, pos) {
                break;
            }
            self.swap_slots(pos, child);
            pos = child;
        }
        pos
    }
}

/// `max(1, ceil(log2(len)))` for `len >= 1`.
#[inline]
fn weak_tail_len(len: usize) -> usize {
    if len <= 1 {
        1
    } else {
        (usize::BITS - (len - 1).leading_zeros()) as usize
    }
}

impl<K, E, S> Default for ScoreHeap<K, E, S>
where
    K: Eq + Hash + Clone,
    S: Ord + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, E, S> fmt::Debug for ScoreHeap<K, E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoreHeap")
            .field("len", &self.slots.len())
            .field("payload_bytes", &self.payload_bytes)
            .field("entry_overhead", &self.entry_overhead)
            .field("generation", &self.generation)
            .finish()
    }
}
