//! Per-run output slots.

/// Run-wide state the driver allocates before a run and reads back afterwards.
///
/// Every per-worker vector has one slot per worker; during a run each slot is
/// written by its own worker only. Results accumulate across runs, so several
/// patterns can be counted into one context; call [`reset`](Self::reset) to start
/// over.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Context {
    /// Workers used by a run.
    pub num_threads: usize,
    /// Partial embedding counts.
    pub per_thread_result: Vec<u64>,
    /// Top-level vertices each worker finished.
    pub per_thread_handled: Vec<u64>,
    /// Wall-clock seconds each worker spent.
    pub per_thread_elapsed: Vec<f64>,
    /// Symmetry-correction counter for the automorphism post-processing step.
    /// Runs reset it to zero.
    pub iep_redundancy: u64,
}

impl Context {
    /// A zeroed context for `num_threads` workers.
    ///
    /// # Panics
    ///
    /// Panics if `num_threads` is zero.
    pub fn new(num_threads: usize) -> Self {
        assert!(num_threads > 0, "a context needs at least one worker");
        Self {
            num_threads,
            per_thread_result: vec![0; num_threads],
            per_thread_handled: vec![0; num_threads],
            per_thread_elapsed: vec![0.0; num_threads],
            iep_redundancy: 0,
        }
    }

    /// Sum of all per-worker results.
    pub fn total(&self) -> u64 {
        self.per_thread_result.iter().sum()
    }

    /// Sum of all per-worker handled counters.
    pub fn handled_total(&self) -> u64 {
        self.per_thread_handled.iter().sum()
    }

    /// Zeroes every counter, keeping the worker count.
    pub fn reset(&mut self) {
        self.per_thread_result.fill(0);
        self.per_thread_handled.fill(0);
        self.per_thread_elapsed.fill(0.0);
        self.iep_redundancy = 0;
    }
}
