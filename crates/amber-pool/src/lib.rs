//! Fixed-capacity object pool with overflow and leak diagnostics.
//!
//! Frequently-allocated fixed-size objects (events, envelopes) come out
//! of a [`Pool`] instead of the heap. The pool is invisible to
//! serialization: pooled objects present the same field-level interface
//! as heap objects, and checkpoint bytes are identical either way. What
//! the pool adds is diagnostics for the statistics/reporting path:
//! overflow detection when capacity is exhausted, and an "undeleted
//! item" report listing objects still live at teardown.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Stable handle to an item in a [`Pool`].
    pub struct PoolKey;
}

/// Errors raised by pool operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("pool overflow: capacity {capacity} exhausted")]
    Overflow { capacity: usize },
}

/// Counters maintained across the pool's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Total successful insertions.
    pub allocated: u64,
    /// Total removals.
    pub released: u64,
    /// Items currently live.
    pub live: usize,
    /// Highest simultaneous occupancy ever observed.
    pub high_water: usize,
    /// Insertions rejected because the pool was full.
    pub overflow_denials: u64,
}

/// A bounded slot pool.
#[derive(Debug)]
pub struct Pool<T> {
    slots: SlotMap<PoolKey, T>,
    capacity: usize,
    stats: PoolStats,
}

impl<T> Pool<T> {
    /// Create a pool holding at most `capacity` items. A capacity of 0
    /// is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: SlotMap::with_capacity_and_key(capacity),
            capacity,
            stats: PoolStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Insert an item. Fails with [`PoolError::Overflow`] when the pool
    /// is at capacity; the denial is counted for diagnostics.
    pub fn insert(&mut self, item: T) -> Result<PoolKey, PoolError> {
        if self.slots.len() >= self.capacity {
            self.stats.overflow_denials += 1;
            return Err(PoolError::Overflow {
                capacity: self.capacity,
            });
        }
        let key = self.slots.insert(item);
        self.stats.allocated += 1;
        self.stats.live = self.slots.len();
        self.stats.high_water = self.stats.high_water.max(self.slots.len());
        Ok(key)
    }

    /// Remove an item. Returns `None` for a stale or foreign key.
    pub fn remove(&mut self, key: PoolKey) -> Option<T> {
        let item = self.slots.remove(key)?;
        self.stats.released += 1;
        self.stats.live = self.slots.len();
        Some(item)
    }

    pub fn get(&self, key: PoolKey) -> Option<&T> {
        self.slots.get(key)
    }

    pub fn get_mut(&mut self, key: PoolKey) -> Option<&mut T> {
        self.slots.get_mut(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoolKey, &T)> {
        self.slots.iter()
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Leak report: keys of every item still live. A non-empty result at
    /// teardown means someone forgot to release their allocations.
    pub fn undeleted(&self) -> Vec<PoolKey> {
        self.slots.keys().collect()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
