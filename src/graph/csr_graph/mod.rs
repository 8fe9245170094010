//! The immutable host graph in CSR (compressed sparse row) form.
//!
//! Memory layout:
//! - `offsets`: `Vec<usize>` of length `n + 1` (row offsets)
//! - `edges`: contiguous `Vid` targets, each row sorted and duplicate-free
//!
//! Rows are contiguous so that `neighbors` can hand out a [`VertexSet`] view with
//! no copying. The graph is undirected: every edge is stored in both rows.

use crate::collections::{VertexSet, Vid};

/// Read-only host graph consumed by the counting engine.
///
/// ### Performance Characteristics
/// | Operation | Complexity | Notes |
/// |-----------|------------|-------|
/// | `from_adjacency` | \(O(n + m)\) | Rows must already be sorted-unique |
/// | `from_edges` | \(O(m \log m)\) | Symmetrizes, sorts, dedups |
/// | `neighbors` | \(O(1)\) | Borrowed sorted view |
/// | `degree` | \(O(1)\) | |
/// | `has_edge` | \(O(\log d)\) | Binary search of the row |
#[derive(Clone, Debug)]
pub struct HostGraph {
    offsets: Vec<usize>,
    edges: Vec<Vid>,
    max_degree: usize,
}

impl HostGraph {
    /// Builds a CSR graph from per-vertex neighbor lists.
    ///
    /// # Panics
    ///
    /// Panics if a row is not strictly ascending, or if any neighbor is out of bounds.
    pub fn from_adjacency(adjacency: &[Vec<Vid>]) -> Self {
        let n = adjacency.len();
        assert!(
            u32::try_from(n).is_ok(),
            "vertex count {n} does not fit in a Vid"
        );

        let mut offsets = Vec::with_capacity(n + 1);
        offsets.push(0);
        let mut total_edges = 0usize;
        let mut max_degree = 0usize;
        for nbrs in adjacency {
            total_edges = total_edges.saturating_add(nbrs.len());
            max_degree = max_degree.max(nbrs.len());
            offsets.push(total_edges);
        }

        let mut edges = Vec::with_capacity(total_edges);
        for (u, nbrs) in adjacency.iter().enumerate() {
            assert!(
                nbrs.windows(2).all(|w| w[0] < w[1]),
                "row {u} is not sorted-unique"
            );
            for &v in nbrs {
                assert!((v as usize) < n, "edge {u}->{v} is out of bounds for n={n}");
                edges.push(v);
            }
        }

        Self {
            offsets,
            edges,
            max_degree,
        }
    }

    /// Builds an undirected graph from an edge list.
    ///
    /// Each `(u, v)` is stored in both directions. Self-loops and duplicates are
    /// dropped.
    ///
    /// # Panics
    ///
    /// Panics if an endpoint is `>= n`.
    pub fn from_edges(n: usize, edge_list: &[(Vid, Vid)]) -> Self {
        let mut adjacency = vec![Vec::new(); n];
        for &(u, v) in edge_list {
            assert!(
                (u as usize) < n && (v as usize) < n,
                "edge {u}-{v} is out of bounds for n={n}"
            );
            if u == v {
                continue;
            }
            adjacency[u as usize].push(v);
            adjacency[v as usize].push(u);
        }
        for row in &mut adjacency {
            row.sort_unstable();
            row.dedup();
        }
        Self::from_adjacency(&adjacency)
    }

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Number of stored (directed) adjacency entries, i.e. twice the undirected edge count.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Largest row length.
    #[inline]
    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    /// Mean row length, `0.0` for an empty graph.
    #[allow(clippy::cast_precision_loss)]
    pub fn average_degree(&self) -> f64 {
        match self.vertex_count() {
            0 => 0.0,
            n => self.edges.len() as f64 / n as f64,
        }
    }

    /// Degree of `v`.
    #[inline]
    pub fn degree(&self, v: Vid) -> usize {
        let v = v as usize;
        assert!(v < self.vertex_count(), "vertex {v} out of bounds");
        self.offsets[v + 1] - self.offsets[v]
    }

    /// Sorted neighbors of `v`.
    #[inline]
    pub fn neighbors(&self, v: Vid) -> VertexSet<'_> {
        let v = v as usize;
        assert!(v < self.vertex_count(), "vertex {v} out of bounds");
        VertexSet::new(&self.edges[self.offsets[v]..self.offsets[v + 1]])
    }

    /// Returns `true` if `u` and `v` are adjacent.
    pub fn has_edge(&self, u: Vid, v: Vid) -> bool {
        self.neighbors(u).contains(v)
    }

    /// Iterates every vertex ID in ascending order.
    pub fn vertices(&self) -> core::ops::Range<Vid> {
        // `from_adjacency` guarantees the count fits.
        #[allow(clippy::cast_possible_truncation)]
        let n = self.vertex_count() as Vid;
        0..n
    }
}

#[cfg(test)]
mod tests;
