//! Deadline queue with lazy deletion for time-to-live bookkeeping.
//!
//! Answers "has anything expired yet?" in O(1) without scanning the cache.
//! Deadlines live in an authoritative `deadlines` map; the heap may hold stale
//! entries left behind by re-scheduling or deletion, and those are discarded
//! the moment they reach the head.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                          ExpiryQueue<K> Layout                              │
//! │                                                                             │
//! │   deadlines: FxHashMap<K, Instant>   (authoritative)                        │
//! │     "a" → t+3s                                                              │
//! │     "b" → t+4s                                                              │
//! │                                                                             │
//! │   heap: BinaryHeap<Reverse<(Instant, seq, K)>>   (may contain stale rows)   │
//! │     (t+1s, 0, "a")  ← STALE: deadlines["a"] = t+3s                          │
//! │     (t+3s, 2, "a")  ← live                                                  │
//! │     (t+4s, 1, "b")  ← live                                                  │
//! └─────────────────────────────────────────────────────────────────────────────┘
//!
//! Drain Flow
//! ──────────
//!   pop_expired(now):
//!     prune stale heads
//!     if head.deadline <= now: remove it, return key
//!     else: return None
//! ```
//!
//! ## Operations
//!
//! | Operation      | Description                              | Complexity           |
//! |----------------|------------------------------------------|----------------------|
//! | `push`         | Schedule or reschedule a key             | O(log n)             |
//! | `delete`       | Unschedule a key (heap row goes stale)   | O(1)                 |
//! | `peek_min`     | Earliest live deadline                   | Amortized O(log n)   |
//! | `pop_min`      | Remove earliest live deadline            | Amortized O(log n)   |
//! | `pop_expired`  | Pop only if the earliest is due          | Amortized O(log n)   |
//!
//! ## Example Usage
//!
//! ```
//! use std::time::{Duration, Instant};
//!
//! use hotset::ds::ExpiryQueue;
//!
//! let start = Instant::now();
//! let mut queue: ExpiryQueue<&str> = ExpiryQueue::new();
//! queue.push("a", start + Duration::from_secs(3));
//! queue.push("b", start + Duration::from_secs(1));
//! queue.push("b", start + Duration::from_secs(5)); // reschedule
//!
//! assert_eq!(queue.pop_expired(start + Duration::from_secs(2)), None);
//! assert_eq!(queue.pop_expired(start + Duration::from_secs(3)), Some("a"));
//! assert_eq!(queue.peek_min().map(|(key, _)| *key), Some("b"));
//! ```

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::hash::Hash;
use std::time::Instant;

use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
struct Deadline<K> {
    at: Instant,
    seq: u64,
    key: K,
}

impl<K> PartialEq for Deadline<K> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl<K> Eq for Deadline<K> {}

impl<K> PartialOrd for Deadline<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Deadline<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.at.cmp(&other.at) {
            Ordering::Equal => self.seq.cmp(&other.seq),
            ordering => ordering,
        }
    }
}

/// Ascending queue of per-key deadlines.
///
/// A key appears at most once: pushing an already scheduled key moves its
/// deadline.
#[derive(Debug)]
pub struct ExpiryQueue<K> {
    deadlines: FxHashMap<K, (Instant, u64)>,
    heap: BinaryHeap<Reverse<Deadline<K>>>,
    seq: u64,
}

impl<K> ExpiryQueue<K>
where
    K: Eq + Hash + Clone,
{
    /// Heap rows allowed per live deadline before a rebuild.
    const MAX_STALE_FACTOR: usize = 4;

    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            deadlines: FxHashMap::default(),
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }

    /// Returns the number of scheduled keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    /// Returns `true` if nothing is scheduled.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// Returns the heap length, including stale rows.
    #[inline]
    pub fn heap_len(&self) -> usize {
        self.heap.len()
    }

    /// Returns the deadline scheduled for `key`.
    #[inline]
    pub fn deadline_of(&self, key: &K) -> Option<Instant> {
        self.deadlines.get(key).map(|(at, _)| *at)
    }

    /// Schedules `key` to expire at `at`, replacing any earlier schedule.
    ///
    /// Returns the previous deadline.
    pub fn push(&mut self, key: K, at: Instant) -> Option<Instant> {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        let previous = self.deadlines.insert(key.clone(), (at, seq));
        self.heap.push(Reverse(Deadline { at, seq, key }));
        if previous.is_some() {
            self.maybe_rebuild();
        }
        previous.map(|(at, _)| at)
    }

    /// Unschedules `key`, returning whether it was scheduled.
    pub fn delete(&mut self, key: &K) -> bool {
        let removed = self.deadlines.remove(key).is_some();
        if removed {
            self.maybe_rebuild();
        }
        removed
    }

    /// Returns the earliest live deadline, discarding stale heads.
    pub fn peek_min(&mut self) -> Option<(&K, Instant)> {
        self.prune_stale();
        self.heap
            .peek()
            .map(|Reverse(deadline)| (&deadline.key, deadline.at))
    }

    /// Removes and returns the earliest live deadline.
    pub fn pop_min(&mut self) -> Option<(K, Instant)> {
        self.prune_stale();
        let Reverse(deadline) = self.heap.pop()?;
        self.deadlines.remove(&deadline.key);
        Some((deadline.key, deadline.at))
    }

    /// Pops the earliest key if its deadline is at or before `now`.
    pub fn pop_expired(&mut self, now: Instant) -> Option<K> {
        let due = matches!(self.peek_min(), Some((_, at)) if at <= now);
        if due {
            self.pop_min().map(|(key, _)| key)
        } else {
            None
        }
    }

    /// Unschedules every key.
    pub fn clear(&mut self) {
        self.deadlines.clear();
        self.heap.clear();
    }

    fn is_live(&self, deadline: &Deadline<K>) -> bool {
        matches!(self.deadlines.get(&deadline.key), Some(&(_, seq)) if seq == deadline.seq)
    }

    fn prune_stale(&mut self) {
        while let Some(Reverse(head)) = self.heap.peek() {
            if self.is_live(head) {
                break;
            }
            self.heap.pop();
        }
    }

    fn maybe_rebuild(&mut self) {
        let limit = self
            .deadlines
            .len()
            .max(1)
            .saturating_mul(Self::MAX_STALE_FACTOR);
        if self.heap.len() <= limit {
            return;
        }
        let rows: Vec<_> = self
            .deadlines
            .iter()
            .map(|(key, &(at, seq))| Reverse(Deadline {
                at,
                seq,
                key: key.clone(),
            }))
            .collect();
        self.heap = BinaryHeap::from(rows);
    }
}

impl<K> Default for ExpiryQueue<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
