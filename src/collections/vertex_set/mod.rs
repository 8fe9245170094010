//! Sorted vertex-set views and their merge-based algebra.
//!
//! A [`VertexSet`] never owns memory. It borrows a strictly ascending run of vertex
//! IDs that lives either in the host graph's edge array, in a [`MiniGraph`]'s
//! cache, or in a caller-owned buffer produced by one of the `*_into` operations.
//!
//! ### Performance Characteristics
//! | Operation | Complexity | Notes |
//! |-----------|------------|-------|
//! | `bounded` / `bounded_below` | \(O(\log n)\) | Binary search, returns a sub-view |
//! | `intersect_into` / `intersect_cnt` | \(O(|A| + |B|)\) | Gallops when one side is \(32\times\) smaller |
//! | `subtract_into` / `subtract_cnt` | \(O(|A| + |B|)\) | Same kernels as intersection |
//! | `contains` / `position` | \(O(\log n)\) | Binary search |
//!
//! [`MiniGraph`]: crate::graph::MiniGraph

mod ops;

use core::ops::Index;

/// Vertex identifier in the host graph.
pub type Vid = u32;

/// A borrowed, strictly ascending sequence of vertex IDs.
///
/// Equality compares contents, so two views over different storage with the same
/// members are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VertexSet<'a> {
    ids: &'a [Vid],
}

impl<'a> VertexSet<'a> {
    /// The empty set.
    pub const EMPTY: VertexSet<'static> = VertexSet { ids: &[] };

    /// Wraps a sorted, duplicate-free slice.
    ///
    /// The ordering is a precondition; it is only checked in debug builds.
    #[inline]
    pub fn new(ids: &'a [Vid]) -> Self {
        debug_assert!(
            ids.windows(2).all(|w| w[0] < w[1]),
            "vertex set is not sorted-unique"
        );
        Self { ids }
    }

    /// Returns the underlying slice.
    #[inline]
    pub fn as_slice(&self) -> &'a [Vid] {
        self.ids
    }

    /// Number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if the set has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Member at `idx` in ascending order.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<Vid> {
        self.ids.get(idx).copied()
    }

    /// Iterates members in ascending order.
    #[inline]
    pub fn iter(&self) -> core::iter::Copied<core::slice::Iter<'a, Vid>> {
        self.ids.iter().copied()
    }

    /// Returns `true` if `v` is a member.
    #[inline]
    pub fn contains(&self, v: Vid) -> bool {
        self.ids.binary_search(&v).is_ok()
    }

    /// Index of `v` within the set, if present.
    #[inline]
    pub fn position(&self, v: Vid) -> Option<usize> {
        self.ids.binary_search(&v).ok()
    }

    /// The members strictly less than `x`.
    ///
    /// Used for symmetry breaking: a pattern position restricted to IDs below an
    /// earlier position's vertex takes `bounded` of its candidate set.
    #[inline]
    pub fn bounded(&self, x: Vid) -> VertexSet<'a> {
        let end = self.ids.partition_point(|&v| v < x);
        VertexSet { ids: &self.ids[..end] }
    }

    /// The members strictly greater than `x`.
    #[inline]
    pub fn bounded_below(&self, x: Vid) -> VertexSet<'a> {
        let start = self.ids.partition_point(|&v| v <= x);
        VertexSet { ids: &self.ids[start..] }
    }

    /// Writes `self ∩ other` into `out`, replacing its contents.
    #[inline]
    pub fn intersect_into(&self, other: VertexSet<'_>, out: &mut Vec<Vid>) {
        ops::intersect_into(self.ids, other.ids, None, out);
    }

    /// Writes `(self ∩ other) \ {except}` into `out`.
    #[inline]
    pub fn intersect_except_into(&self, other: VertexSet<'_>, except: Vid, out: &mut Vec<Vid>) {
        ops::intersect_into(self.ids, other.ids, Some(except), out);
    }

    /// `|self ∩ other|` without materializing the intersection.
    #[inline]
    pub fn intersect_cnt(&self, other: VertexSet<'_>) -> usize {
        ops::intersect_count(self.ids, other.ids, None)
    }

    /// `|(self ∩ other) \ {except}|`.
    #[inline]
    pub fn intersect_except_cnt(&self, other: VertexSet<'_>, except: Vid) -> usize {
        ops::intersect_count(self.ids, other.ids, Some(except))
    }

    /// Writes `self \ other` into `out`, replacing its contents.
    #[inline]
    pub fn subtract_into(&self, other: VertexSet<'_>, out: &mut Vec<Vid>) {
        ops::subtract_into(self.ids, other.ids, None, out);
    }

    /// Writes `self \ other \ {except}` into `out`.
    #[inline]
    pub fn subtract_except_into(&self, other: VertexSet<'_>, except: Vid, out: &mut Vec<Vid>) {
        ops::subtract_into(self.ids, other.ids, Some(except), out);
    }

    /// `|self \ other|` without materializing the difference.
    #[inline]
    pub fn subtract_cnt(&self, other: VertexSet<'_>) -> usize {
        ops::subtract_count(self.ids, other.ids, None)
    }

    /// `|self \ other \ {except}|`.
    #[inline]
    pub fn subtract_except_cnt(&self, other: VertexSet<'_>, except: Vid) -> usize {
        ops::subtract_count(self.ids, other.ids, Some(except))
    }
}

impl Index<usize> for VertexSet<'_> {
    type Output = Vid;

    #[inline]
    fn index(&self, idx: usize) -> &Vid {
        &self.ids[idx]
    }
}

impl<'a> IntoIterator for VertexSet<'a> {
    type Item = Vid;
    type IntoIter = core::iter::Copied<core::slice::Iter<'a, Vid>>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter().copied()
    }
}

impl<'a> From<&'a [Vid]> for VertexSet<'a> {
    fn from(ids: &'a [Vid]) -> Self {
        Self::new(ids)
    }
}

impl<'a> From<&'a Vec<Vid>> for VertexSet<'a> {
    fn from(ids: &'a Vec<Vid>) -> Self {
        Self::new(ids.as_slice())
    }
}

impl core::fmt::Debug for VertexSet<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.ids.iter()).finish()
    }
}

#[cfg(test)]
mod tests;
