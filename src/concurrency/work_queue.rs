//! Bounded hand-off queue for relinquished top-level work units.
//!
//! The queue never drops a unit: a push into a full queue hands the unit back to
//! the caller, who must process it itself.

use std::collections::VecDeque;

use super::SpinLock;
use crate::collections::Vid;

/// Default queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// A contiguous range `[lo, hi)` of top-level vertex IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorkUnit {
    /// First vertex ID in the range.
    pub lo: Vid,
    /// One past the last vertex ID.
    pub hi: Vid,
    /// Global worker index of the range's original owner.
    pub owner: usize,
}

impl WorkUnit {
    /// Number of vertices in the range.
    #[inline]
    pub fn len(&self) -> usize {
        self.hi.saturating_sub(self.lo) as usize
    }

    /// Returns `true` if the range is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hi <= self.lo
    }

    /// Iterates the vertex IDs in the range.
    #[inline]
    pub fn vertices(&self) -> core::ops::Range<Vid> {
        self.lo..self.hi
    }
}

/// Fixed-capacity FIFO of [`WorkUnit`]s behind a [`SpinLock`].
pub struct WorkQueue {
    inner: SpinLock<VecDeque<WorkUnit>>,
    capacity: usize,
}

impl WorkQueue {
    /// Creates an empty queue holding at most `capacity` units.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity != 0, "queue capacity must be > 0");
        Self {
            inner: SpinLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Maximum number of queued units.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of queued units.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Appends `unit`, or returns it if the queue is full.
    pub fn push(&self, unit: WorkUnit) -> Result<(), WorkUnit> {
        let mut q = self.inner.lock();
        if q.len() >= self.capacity {
            return Err(unit);
        }
        q.push_back(unit);
        Ok(())
    }

    /// Moves as many units from the front of `units` as fit, in one critical section.
    ///
    /// Units that do not fit stay in `units`. Returns the number moved.
    pub fn push_batch(&self, units: &mut Vec<WorkUnit>) -> usize {
        let mut q = self.inner.lock();
        let n = units.len().min(self.capacity - q.len());
        q.extend(units.drain(..n));
        n
    }

    /// Removes and returns the oldest unit.
    pub fn front_and_pop(&self) -> Option<WorkUnit> {
        self.inner.lock().pop_front()
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
