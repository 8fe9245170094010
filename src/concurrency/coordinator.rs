//! Top-level work distribution and cross-rank result reduction.
//!
//! The vertex range `[0, n)` is split statically: first evenly across ranks, then
//! evenly across each rank's workers. Every worker owns a cursor over its slice and
//! claims `chunk_size` vertices at a time with one `fetch_add`, so a vertex is
//! handed out at most once no matter who advances the cursor.
//!
//! A worker whose slice is exhausted first drains its private backlog, then the
//! shared [`WorkQueue`], and finally steals a batch from the peer with the most
//! remaining work (on any rank). It keeps the first chunk of a stolen batch and
//! relinquishes the rest to the queue for other idle workers. Chunks that do not
//! fit in the queue go to the thief's backlog; nothing is ever dropped.

use core::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::{Backoff, CachePadded};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{SpinLock, WorkQueue, WorkUnit};
use crate::collections::Vid;

/// How many ranks cooperate on one run and how many workers each rank runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankLayout {
    /// Number of cooperating ranks.
    pub ranks: usize,
    /// Workers per rank.
    pub threads_per_rank: usize,
}

impl RankLayout {
    /// A single rank with `threads` workers.
    pub const fn single(threads: usize) -> Self {
        Self {
            ranks: 1,
            threads_per_rank: threads,
        }
    }

    /// Total number of workers across all ranks.
    pub const fn total_workers(&self) -> usize {
        self.ranks * self.threads_per_rank
    }
}

/// One worker's statically assigned slice.
struct Cursor {
    next: AtomicUsize,
    end: usize,
}

impl Cursor {
    fn remaining(&self) -> usize {
        self.end.saturating_sub(self.next.load(Ordering::Relaxed))
    }

    /// Claims up to `amount` vertices; `None` once the slice is exhausted.
    fn claim(&self, amount: usize) -> Option<(usize, usize)> {
        let lo = self.next.fetch_add(amount, Ordering::Relaxed);
        (lo < self.end).then(|| (lo, (lo + amount).min(self.end)))
    }
}

/// Per-run work hand-off object shared by every worker of every rank.
pub struct Coordinator {
    vertex_count: usize,
    layout: RankLayout,
    chunk_size: usize,
    steal_batch: usize,
    cursors: Vec<CachePadded<Cursor>>,
    backlogs: Vec<CachePadded<SpinLock<Vec<WorkUnit>>>>,
    queue: WorkQueue,
    produced: AtomicUsize,
    claimed: AtomicUsize,
    results: SpinLock<Vec<Option<u64>>>,
    reported: AtomicUsize,
}

impl Coordinator {
    /// Splits `[0, vertex_count)` across `layout`.
    ///
    /// # Panics
    ///
    /// Panics if the layout has no workers, or `chunk_size`, `steal_batch` or
    /// `queue_capacity` is zero.
    pub fn new(
        vertex_count: usize,
        layout: RankLayout,
        chunk_size: usize,
        queue_capacity: usize,
        steal_batch: usize,
    ) -> Self {
        assert!(layout.ranks != 0, "ranks must be > 0");
        assert!(layout.threads_per_rank != 0, "threads_per_rank must be > 0");
        assert!(chunk_size != 0, "chunk_size must be > 0");
        assert!(steal_batch != 0, "steal_batch must be > 0");

        let workers = layout.total_workers();
        let cursors = (0..workers)
            .map(|g| {
                let (lo, hi) = static_split(vertex_count, layout, g);
                CachePadded::new(Cursor {
                    next: AtomicUsize::new(lo),
                    end: hi,
                })
            })
            .collect();
        let backlogs = (0..workers)
            .map(|_| CachePadded::new(SpinLock::new(Vec::new())))
            .collect();

        Self {
            vertex_count,
            layout,
            chunk_size,
            steal_batch,
            cursors,
            backlogs,
            queue: WorkQueue::new(queue_capacity),
            produced: AtomicUsize::new(0),
            claimed: AtomicUsize::new(0),
            results: SpinLock::new(vec![None; layout.ranks]),
            reported: AtomicUsize::new(0),
        }
    }

    /// Size of the top-level vertex range.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// The rank layout this coordinator was built for.
    pub fn layout(&self) -> RankLayout {
        self.layout
    }

    /// Global index of `worker` on `rank`.
    #[inline]
    pub fn global_worker(&self, rank: usize, worker: usize) -> usize {
        assert!(rank < self.layout.ranks, "rank {rank} out of range");
        assert!(
            worker < self.layout.threads_per_rank,
            "worker {worker} out of range"
        );
        rank * self.layout.threads_per_rank + worker
    }

    /// The statically assigned `[lo, hi)` slice of a worker.
    pub fn assigned_range(&self, rank: usize, worker: usize) -> (usize, usize) {
        static_split(self.vertex_count, self.layout, self.global_worker(rank, worker))
    }

    /// Hands `worker` on `rank` its next unit, or `None` once all work is claimed.
    pub fn get_loop(&self, rank: usize, worker: usize) -> Option<WorkUnit> {
        let g = self.global_worker(rank, worker);

        if let Some((lo, hi)) = self.cursors[g].claim(self.chunk_size) {
            self.produced.fetch_add(hi - lo, Ordering::Relaxed);
            return Some(self.hand_out(make_unit(lo, hi, g)));
        }
        if let Some(unit) = self.backlogs[g].lock().pop() {
            return Some(self.hand_out(unit));
        }
        if let Some(unit) = self.front_and_pop() {
            trace!(rank, worker, lo = unit.lo, hi = unit.hi, "took relinquished unit");
            return Some(unit);
        }
        self.steal(g)
    }

    fn steal(&self, thief: usize) -> Option<WorkUnit> {
        loop {
            let (victim, remaining) = self
                .cursors
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != thief)
                .map(|(i, c)| (i, c.remaining()))
                .max_by_key(|&(_, r)| r)?;
            if remaining == 0 {
                // A peer may have just relinquished work while we scanned.
                return self.front_and_pop();
            }

            let chunks = remaining.div_ceil(self.chunk_size).div_ceil(2).clamp(1, self.steal_batch);
            let Some((lo, hi)) = self.cursors[victim].claim(chunks * self.chunk_size) else {
                continue;
            };
            self.produced.fetch_add(hi - lo, Ordering::Relaxed);
            trace!(thief, victim, lo, hi, "stole top-level range");

            let mut units: Vec<WorkUnit> = (lo..hi)
                .step_by(self.chunk_size)
                .map(|s| make_unit(s, (s + self.chunk_size).min(hi), victim))
                .collect();
            let first = units.remove(0);
            self.set_loop(&mut units);
            if !units.is_empty() {
                self.backlogs[thief].lock().extend(units);
            }
            return Some(self.hand_out(first));
        }
    }

    /// Relinquishes `units` to the shared queue for idle workers.
    ///
    /// Units that do not fit remain in `units`; the caller keeps ownership of them.
    /// Returns the number of units queued.
    pub fn set_loop(&self, units: &mut Vec<WorkUnit>) -> usize {
        self.queue.push_batch(units)
    }

    /// Claims the oldest relinquished unit.
    pub fn front_and_pop(&self) -> Option<WorkUnit> {
        self.queue.front_and_pop().map(|u| self.hand_out(u))
    }

    fn hand_out(&self, unit: WorkUnit) -> WorkUnit {
        self.claimed.fetch_add(unit.len(), Ordering::Relaxed);
        unit
    }

    /// Vertices carved out of the static slices so far.
    pub fn produced(&self) -> usize {
        self.produced.load(Ordering::Relaxed)
    }

    /// Vertices handed to workers so far.
    pub fn claimed(&self) -> usize {
        self.claimed.load(Ordering::Relaxed)
    }

    /// Returns `true` once every slice, backlog and the queue are empty.
    pub fn is_drained(&self) -> bool {
        self.cursors.iter().all(|c| c.remaining() == 0)
            && self.queue.is_empty()
            && self.backlogs.iter().all(|b| b.lock().is_empty())
    }

    /// Records the rank-local total of `rank`.
    ///
    /// # Panics
    ///
    /// Panics if `rank` already reported.
    pub fn report_result(&self, rank: usize, count: u64) {
        let mut results = self.results.lock();
        assert!(results[rank].is_none(), "rank {rank} reported twice");
        results[rank] = Some(count);
        drop(results);
        self.reported.fetch_add(1, Ordering::Release);
    }

    /// Waits until every rank reported, then returns the run-wide total.
    pub fn run_major(&self) -> u64 {
        let backoff = Backoff::new();
        while self.reported.load(Ordering::Acquire) < self.layout.ranks {
            backoff.snooze();
        }
        self.results.lock().iter().map(|r| r.unwrap_or(0)).sum()
    }

    /// The run-wide total, if every rank has reported.
    pub fn try_run_major(&self) -> Option<u64> {
        (self.reported.load(Ordering::Acquire) >= self.layout.ranks).then(|| self.run_major())
    }
}

/// Even split of `[0, n)` into the slice of global worker `g`.
fn static_split(n: usize, layout: RankLayout, g: usize) -> (usize, usize) {
    let w = layout.total_workers() as u128;
    let n128 = n as u128;
    let g = g as u128;
    #[allow(clippy::cast_possible_truncation)]
    ((n128 * g / w) as usize, (n128 * (g + 1) / w) as usize)
}

#[allow(clippy::cast_possible_truncation)]
fn make_unit(lo: usize, hi: usize, owner: usize) -> WorkUnit {
    WorkUnit {
        lo: lo as Vid,
        hi: hi as Vid,
        owner,
    }
}
