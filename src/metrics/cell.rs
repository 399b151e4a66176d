use std::cell::Cell;

/// Counter that can be bumped through `&self`.
///
/// Used for read-only operations such as `peek` that do not take the cache
/// mutably. Not `Sync`: concurrent access goes through the cache's lock.
#[repr(transparent)]
#[derive(Debug, Default, Clone)]
pub struct MetricsCell(Cell<u64>);

impl MetricsCell {
    #[inline]
    pub fn new() -> Self {
        Self(Cell::new(0))
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0.get()
    }

    #[inline]
    pub fn incr(&self) {
        self.0.set(self.0.get().saturating_add(1));
    }

    #[inline]
    pub fn reset(&self) {
        self.0.set(0);
    }
}
