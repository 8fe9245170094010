//! Plan execution.
//!
//! An [`Engine`] owns a fixed-size rayon pool. A run splits the top-level vertex
//! range through a [`Coordinator`]: every worker of the rank pulls work units from
//! it until none are left, and counts the embeddings rooted in each unit with the
//! shared [`interpreter`]. Inner levels whose candidate sets exceed the configured
//! fan-out threshold are iterated with rayon's work-stealing `par_iter` on the same
//! pool.
//!
//! Each worker folds its count into a private tally that is written to its
//! [`Context`] slot once the worker finishes, so slots are never shared.
//!
//! ### Performance Characteristics
//! | Stage | Cost | Notes |
//! |-------|------|-------|
//! | Top-level hand-off | one `fetch_add` per unit | Static split, stealing at the tail |
//! | Inner fan-out | rayon task per candidate | Only above the fan-out threshold |
//! | Terminal level | one counting merge | Never materialized |

mod context;
pub(crate) mod interpreter;

use std::time::Instant;

use anyhow::{Context as _, Result};
use tracing::{debug, info};

pub use context::Context;

use crate::concurrency::{Coordinator, RankLayout};
use crate::config::EngineConfig;
use crate::graph::HostGraph;
use crate::plan::Plan;
use interpreter::{scratch_for, Interpreter};

/// A configured worker pool that runs plans.
pub struct Engine {
    config: EngineConfig,
    pool: rayon::ThreadPool,
}

#[derive(Clone, Copy, Default)]
struct Tally {
    result: u64,
    handled: u64,
    elapsed: f64,
}

impl Engine {
    /// Validates `config` and builds the worker pool.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let threads = config.resolved_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("minigraph-worker-{i}"))
            .build()
            .context("failed to build worker pool")?;
        Ok(Self { config, pool })
    }

    /// The configuration this engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of pool threads.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// A zeroed context sized for this engine's pool.
    pub fn context(&self) -> Context {
        Context::new(self.threads())
    }

    /// A coordinator for a cooperative run of `layout` over `graph`, sized by this
    /// engine's configuration.
    pub fn coordinator(&self, graph: &HostGraph, layout: RankLayout) -> Coordinator {
        Coordinator::new(
            graph.vertex_count(),
            layout,
            self.config.chunk_size,
            self.config.queue_capacity,
            self.config.steal_batch,
        )
    }

    /// Counts the embeddings of `plan` in `graph`, adding the per-worker results to `ctx`.
    ///
    /// # Panics
    ///
    /// Panics if `ctx.num_threads` is zero or exceeds the pool size.
    pub fn run(&self, graph: &HostGraph, plan: &Plan, ctx: &mut Context) {
        let coordinator = self.coordinator(graph, RankLayout::single(ctx.num_threads));
        self.run_rank(graph, plan, ctx, &coordinator, 0);
    }

    /// Runs one rank of a cooperative run and reports its total to `coordinator`.
    ///
    /// Workers of this rank may take units from other ranks' slices once their own is
    /// exhausted, so rank totals are only meaningful summed with
    /// [`Coordinator::run_major`].
    ///
    /// # Panics
    ///
    /// Panics if `ctx.num_threads` is zero, exceeds the pool size, or differs from
    /// the coordinator's workers per rank, or if `rank` already reported.
    pub fn run_rank(
        &self,
        graph: &HostGraph,
        plan: &Plan,
        ctx: &mut Context,
        coordinator: &Coordinator,
        rank: usize,
    ) {
        let workers = ctx.num_threads;
        assert!(workers > 0, "a run needs at least one worker");
        assert!(
            workers <= self.threads(),
            "{workers} workers exceed the pool of {} threads",
            self.threads()
        );
        assert_eq!(
            coordinator.layout().threads_per_rank,
            workers,
            "context and coordinator disagree on workers per rank"
        );
        assert_eq!(
            coordinator.vertex_count(),
            graph.vertex_count(),
            "coordinator was built for another graph"
        );

        info!(
            rank,
            vertices = graph.vertex_count(),
            levels = plan.depth(),
            caches = plan.cache_count(),
            workers,
            "starting run"
        );
        let start = Instant::now();
        ctx.iep_redundancy = 0;

        let interpreter = Interpreter::new(graph, plan, &self.config);
        let mut tallies = vec![Tally::default(); workers];
        self.pool.scope(|scope| {
            for (worker, tally) in tallies.iter_mut().enumerate() {
                let interpreter = &interpreter;
                scope.spawn(move |_| {
                    let begin = Instant::now();
                    let mut scratch = scratch_for(plan.depth());
                    while let Some(unit) = coordinator.get_loop(rank, worker) {
                        tally.result += interpreter.count_unit(unit, &mut scratch);
                        tally.handled += unit.len() as u64;
                    }
                    tally.elapsed = begin.elapsed().as_secs_f64();
                });
            }
        });

        let mut rank_total = 0;
        for (worker, tally) in tallies.iter().enumerate() {
            debug!(
                rank,
                worker,
                handled = tally.handled,
                result = tally.result,
                elapsed = tally.elapsed,
                "worker finished"
            );
            ctx.per_thread_result[worker] += tally.result;
            ctx.per_thread_handled[worker] += tally.handled;
            ctx.per_thread_elapsed[worker] += tally.elapsed;
            rank_total += tally.result;
        }
        coordinator.report_result(rank, rank_total);
        info!(
            rank,
            total = rank_total,
            elapsed = start.elapsed().as_secs_f64(),
            "run finished"
        );
    }

    /// Runs `plan` on a fresh context and returns the total.
    pub fn count(&self, graph: &HostGraph, plan: &Plan) -> u64 {
        let mut ctx = self.context();
        self.run(graph, plan, &mut ctx);
        ctx.total()
    }
}
