//! Host graph storage and per-level adjacency caches.
//!
//! - `csr_graph`: the immutable host graph, one sorted row per vertex
//! - `mini_graph`: restricted adjacency cached for one recursion branch

pub mod csr_graph;
pub mod mini_graph;

pub use csr_graph::HostGraph;
pub use mini_graph::MiniGraph;
