//! Per-level cached adjacency ("mini graphs").
//!
//! A [`MiniGraph`] is built over a vertex set `V` and an intersect set `X`. For
//! every `v` at position `i` of `V` it stores `N(v) ∩ X` in one contiguous buffer,
//! so that deeper recursion levels can fetch the restricted neighbor list of a
//! bound vertex by position instead of re-running the intersection against the
//! full host adjacency.
//!
//! A mini graph can be derived from a parent mini graph whose intersect set is a
//! superset of its own: the restricted rows are then narrowed from the parent's
//! (already short) rows rather than from the host graph.
//!
//! Mini graphs live on the recursion stack of one branch and are dropped when that
//! branch returns.

use crate::collections::{VertexSet, Vid};
use crate::graph::HostGraph;

/// Expected fraction of a candidate set that survives one more level of narrowing.
///
/// Tuning constant for [`estimate_reuse_multiplier`]; it has no effect on counts.
pub const EXPECTED_DENSITY: f64 = 0.2;

/// Reuse multiplier at or below which building a cache does not pay for itself.
pub const MIN_REUSE: f64 = 1.0;

/// Estimates how many times each row of a cache over `len` vertices is consulted.
///
/// `distances` holds, for every plan term answered by the cache, how many levels
/// below the cache's level the lookup happens (`1` = the next level). A term one
/// level down touches each row once; every further level multiplies the lookups by
/// the expected size of the intermediate candidate sets.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn estimate_reuse_multiplier(len: usize, distances: impl IntoIterator<Item = usize>) -> f64 {
    let fanout = (len as f64 * EXPECTED_DENSITY).max(1.0);
    distances
        .into_iter()
        .map(|d| fanout.powi(d.saturating_sub(1) as i32))
        .sum()
}

/// Restricted adjacency cache addressed by position in its vertex set.
///
/// ### Performance Characteristics
/// | Operation | Complexity | Notes |
/// |-----------|------------|-------|
/// | `build` | \(O(\sum_{v \in V} (d(v) + |X|))\) | One intersection per member |
/// | `build_from_parent` | \(O(\sum_{v \in V} (|N_p(v)| + |X|))\) | Narrows parent rows |
/// | `neighbors` | \(O(1)\) | Borrowed view into the cache buffer |
/// | `indices` | \(O(|V| + |S|)\) or \(O(|S| \log |V|)\) | Chosen by reuse multiplier |
#[derive(Debug)]
pub struct MiniGraph<'a> {
    vertices: VertexSet<'a>,
    intersect: VertexSet<'a>,
    offsets: Vec<usize>,
    storage: Vec<Vid>,
    reuse_multiplier: f64,
}

impl<'a> MiniGraph<'a> {
    /// Caches `N(v) ∩ intersect` for every `v` in `vertices`, reading the host graph.
    ///
    /// Rows are addressed by position in `vertices`. `intersect` may differ from
    /// `vertices`; plans always pass the level's candidate set for both.
    pub fn build(graph: &HostGraph, vertices: VertexSet<'a>, intersect: VertexSet<'a>) -> Self {
        Self::build_with(vertices, intersect, |_, v, out| {
            graph.neighbors(v).intersect_into(intersect, out);
        })
    }

    /// Caches `N(v) ∩ intersect` for every `v` in `vertices`, narrowing the parent's rows.
    ///
    /// `parent_positions[i]` must be the parent position of `vertices[i]` (as produced by
    /// `parent.indices(vertices)`), and `intersect` must be a subset of the parent's
    /// intersect set.
    ///
    /// # Panics
    ///
    /// Panics if `parent_positions` and `vertices` differ in length.
    pub fn build_from_parent(
        parent: &MiniGraph<'_>,
        parent_positions: &[u32],
        vertices: VertexSet<'a>,
        intersect: VertexSet<'a>,
    ) -> Self {
        assert_eq!(
            parent_positions.len(),
            vertices.len(),
            "one parent position per cached vertex"
        );
        Self::build_with(vertices, intersect, |i, _, out| {
            parent
                .neighbors(parent_positions[i] as usize)
                .intersect_into(intersect, out);
        })
    }

    fn build_with(
        vertices: VertexSet<'a>,
        intersect: VertexSet<'a>,
        mut row: impl FnMut(usize, Vid, &mut Vec<Vid>),
    ) -> Self {
        let mut offsets = Vec::with_capacity(vertices.len() + 1);
        offsets.push(0);
        let mut storage = Vec::new();
        let mut scratch = Vec::with_capacity(intersect.len());
        for (i, v) in vertices.iter().enumerate() {
            row(i, v, &mut scratch);
            storage.extend_from_slice(&scratch);
            offsets.push(storage.len());
        }
        Self {
            vertices,
            intersect,
            offsets,
            storage,
            reuse_multiplier: 1.0,
        }
    }

    /// Records how often the cache is expected to be consulted (advisory only).
    pub fn set_reuse_multiplier(&mut self, factor: f64) {
        self.reuse_multiplier = factor;
    }

    /// The advisory reuse multiplier.
    pub fn reuse_multiplier(&self) -> f64 {
        self.reuse_multiplier
    }

    /// The vertex set rows are addressed by.
    pub fn vertices(&self) -> VertexSet<'a> {
        self.vertices
    }

    /// The set every cached row was intersected with.
    pub fn intersect(&self) -> VertexSet<'a> {
        self.intersect
    }

    /// Number of cached rows.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns `true` if no rows are cached.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Total number of cached neighbor entries.
    pub fn storage_len(&self) -> usize {
        self.storage.len()
    }

    /// Cached `N(v) ∩ X` for the vertex at `pos` in [`vertices`](Self::vertices).
    ///
    /// # Panics
    ///
    /// Panics if `pos` is not a valid position.
    #[inline]
    pub fn neighbors(&self, pos: usize) -> VertexSet<'_> {
        assert!(pos < self.len(), "position {pos} out of bounds for {} rows", self.len());
        VertexSet::new(&self.storage[self.offsets[pos]..self.offsets[pos + 1]])
    }

    /// Position of `v` in [`vertices`](Self::vertices), if cached.
    #[inline]
    pub fn position_of(&self, v: Vid) -> Option<usize> {
        self.vertices.position(v)
    }

    /// Writes the cache position of every member of `subset` into `out`.
    ///
    /// Dense subsets are mapped with one merge pass; sparse ones, or caches that are
    /// not expected to be reused, with a binary search per member.
    ///
    /// # Panics
    ///
    /// Panics if some member of `subset` is not cached. A subset must be drawn from
    /// the set this mini graph was built over.
    #[allow(clippy::cast_possible_truncation)]
    pub fn indices(&self, subset: VertexSet<'_>, out: &mut Vec<u32>) {
        out.clear();
        out.reserve(subset.len());
        let all = self.vertices.as_slice();
        let merge = self.reuse_multiplier > MIN_REUSE && subset.len().saturating_mul(8) >= all.len();
        if merge {
            let mut j = 0usize;
            for v in subset {
                while j < all.len() && all[j] < v {
                    j += 1;
                }
                assert!(j < all.len() && all[j] == v, "vertex {v} is not cached");
                out.push(j as u32);
                j += 1;
            }
        } else {
            for v in subset {
                let pos = self
                    .position_of(v)
                    .unwrap_or_else(|| panic!("vertex {v} is not cached"));
                out.push(pos as u32);
            }
        }
    }
}
