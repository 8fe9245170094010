//! Work hand-off between workers and ranks.
//!
//! The hot path never takes a lock. The only contended structures live here: the
//! bounded queue of relinquished top-level units (behind a [`SpinLock`]) and the
//! per-run [`Coordinator`] that owns the static vertex split.

pub mod coordinator;
pub mod spin_lock;
pub mod work_queue;

pub use coordinator::{Coordinator, RankLayout};
pub use spin_lock::{SpinLock, SpinLockGuard};
pub use work_queue::{WorkQueue, WorkUnit, DEFAULT_QUEUE_CAPACITY};
