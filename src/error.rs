//! Error types for the hotset library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when cache configuration parameters are invalid
//!   (zero precision, zero bucket interval, zero budgets).
//! - [`DuplicateKeyError`]: Returned by [`ScoreHeap::push`](crate::ds::ScoreHeap::push)
//!   when the key is already tracked.
//! - [`InvariantError`]: Returned by `check_invariants` methods when internal
//!   bookkeeping disagrees with itself.
//!
//! Admission failures are not errors: a full tier simply refuses a candidate
//! and the cache falls back to the next tier or drops it.
//!
//! ## Example Usage
//!
//! ```
//! use std::time::Duration;
//!
//! use hotset::builder::TwoTierBuilder;
//! use hotset::error::ConfigError;
//!
//! let err: ConfigError = TwoTierBuilder::new()
//!     .precision(0)
//!     .try_build::<String, u64>()
//!     .unwrap_err();
//! assert!(err.to_string().contains("precision"));
//!
//! let ok = TwoTierBuilder::new()
//!     .cache_time(Duration::from_secs(60))
//!     .try_build::<String, u64>();
//! assert!(ok.is_ok());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by [`TwoTierCache::check_invariants`](crate::policy::two_tier::TwoTierCache::check_invariants)
/// and [`ScoreHeap::check_invariants`](crate::ds::ScoreHeap::check_invariants).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`TwoTierConfig::validate`](crate::builder::TwoTierConfig::validate),
/// [`TwoTierBuilder::try_build`](crate::builder::TwoTierBuilder::try_build) and
/// [`TwoTierCache::try_new`](crate::policy::two_tier::TwoTierCache::try_new).
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use hotset::builder::TwoTierConfig;
///
/// let config = TwoTierConfig {
///     cache_time: Duration::ZERO,
///     ..TwoTierConfig::default()
/// };
/// let err = config.validate().unwrap_err();
/// assert!(err.to_string().contains("cache_time"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// DuplicateKeyError
// ---------------------------------------------------------------------------

/// Error returned when pushing a key that a [`ScoreHeap`](crate::ds::ScoreHeap)
/// already holds.
///
/// The rejected entry is handed back so the caller keeps ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKeyError<E> {
    entry: E,
}

impl<E> DuplicateKeyError<E> {
    #[inline]
    pub(crate) fn new(entry: E) -> Self {
        Self { entry }
    }

    /// Returns the rejected entry.
    #[inline]
    pub fn into_entry(self) -> E {
        self.entry
    }
}

impl<E> fmt::Display for DuplicateKeyError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("key is already present in the heap")
    }
}

impl<E: fmt::Debug> std::error::Error for DuplicateKeyError<E> {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
