//! # `minigraph` - Pattern Counting Engine
//!
//! Counts the embeddings of a small pattern graph in a large host graph by running
//! an explicit loop-nest plan over sorted vertex sets, with per-level adjacency
//! caches and nested work-stealing parallelism.
//!
//! ## Key Features
//!
//! - **Set algebra on sorted IDs**: merge and galloping intersections and
//!   differences, with counting variants that never materialize the terminal level
//! - **Mini graphs**: restricted adjacency cached per recursion level, derivable from
//!   an enclosing cache, built only when a cost model says it pays off
//! - **One interpreter for every pattern**: plans are data, validated once
//! - **Two-tier scheduling**: a static top-level split with tail stealing across
//!   workers and ranks, and rayon fan-out for large inner candidate sets
//!
//! ## Architecture
//!
//! 1. **Host graph** ([`HostGraph`]): immutable CSR with sorted adjacency.
//! 2. **Plans** ([`Plan`]): level `k` binds pattern position `k` to a vertex drawn from
//!    a [`SetExpr`](plan::SetExpr) over earlier bindings. [`Plan::compile`] derives a
//!    plan from a [`Pattern`].
//! 3. **Engine** ([`Engine`]): runs a plan on a fixed rayon pool and writes per-worker
//!    results into a [`Context`].
//! 4. **Coordination** ([`Coordinator`]): hands out top-level work units and reduces
//!    per-rank totals.
//!
//! ### Counting Invariants
//!
//! **Disjointness**: every top-level vertex is handed to exactly one worker, and every
//! inner candidate is iterated by exactly one task, so per-worker partial counts sum
//! to the total regardless of scheduling.
//!
//! **Policy independence**: cache and fan-out policies change cost only. Counts are
//! identical under every [`EngineConfig`].
//!
//! ## Example
//!
//! ```rust
//! use minigraph::{CompileOptions, Engine, EngineConfig, HostGraph, Pattern, Plan};
//!
//! // K4 has four triangles.
//! let graph = HostGraph::from_edges(4, &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
//! let triangle = Pattern::from_adjacency_str("011101110").unwrap();
//! let plan = Plan::compile(&triangle, &CompileOptions::default().descending(3)).unwrap();
//!
//! let engine = Engine::new(EngineConfig::default().with_threads(2)).unwrap();
//! let mut ctx = engine.context();
//! engine.run(&graph, &plan, &mut ctx);
//! assert_eq!(ctx.total(), 4);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod collections;
pub mod concurrency;
pub mod config;
pub mod engine;
pub mod graph;
pub mod plan;

pub use collections::{VertexSet, Vid};
pub use concurrency::{Coordinator, RankLayout, WorkUnit};
pub use config::{CachePolicy, EngineConfig, FanOut};
pub use engine::{Context, Engine};
pub use graph::{HostGraph, MiniGraph};
pub use plan::{CompileOptions, Pattern, Plan};

// Layout claims the scheduler relies on.
const _: () = {
    use core::mem;

    // Vertex sets are a borrowed slice and nothing else.
    assert!(mem::size_of::<VertexSet<'static>>() == mem::size_of::<&[Vid]>());

    // Work units stay small enough to move through the queue by value.
    assert!(mem::size_of::<WorkUnit>() <= 16);
};
