//! Small undirected query patterns.

use anyhow::{bail, ensure, Result};

/// Patterns are small; positions fit in a byte and adjacency in a bit matrix.
pub const MAX_PATTERN_SIZE: usize = 16;

/// A small undirected pattern graph without self-loops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    size: usize,
    adj: [u16; MAX_PATTERN_SIZE],
}

impl Pattern {
    /// Builds a pattern from an undirected edge list.
    pub fn from_edges(size: usize, edges: &[(usize, usize)]) -> Result<Self> {
        ensure!(
            (1..=MAX_PATTERN_SIZE).contains(&size),
            "pattern size {size} outside 1..={MAX_PATTERN_SIZE}"
        );
        let mut adj = [0u16; MAX_PATTERN_SIZE];
        for &(a, b) in edges {
            ensure!(a < size && b < size, "pattern edge {a}-{b} out of range");
            ensure!(a != b, "pattern self-loop on {a}");
            adj[a] |= 1 << b;
            adj[b] |= 1 << a;
        }
        Ok(Self { size, adj })
    }

    /// Parses a row-major `0`/`1` adjacency matrix, e.g. `"011101110"` for a triangle.
    ///
    /// Whitespace is ignored. The matrix must be square, symmetric and have a zero
    /// diagonal.
    pub fn from_adjacency_str(s: &str) -> Result<Self> {
        let bits: Vec<bool> = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => bail!("unexpected character {other:?} in adjacency matrix"),
            })
            .collect::<Result<_>>()?;
        let size = (1..=MAX_PATTERN_SIZE)
            .find(|n| n * n == bits.len())
            .ok_or_else(|| anyhow::anyhow!("adjacency matrix of {} cells is not square", bits.len()))?;

        let mut edges = Vec::new();
        for a in 0..size {
            ensure!(!bits[a * size + a], "pattern self-loop on {a}");
            for b in (a + 1)..size {
                ensure!(
                    bits[a * size + b] == bits[b * size + a],
                    "adjacency matrix is not symmetric at ({a}, {b})"
                );
                if bits[a * size + b] {
                    edges.push((a, b));
                }
            }
        }
        Self::from_edges(size, &edges)
    }

    /// The complete graph on `size` positions.
    pub fn clique(size: usize) -> Result<Self> {
        let edges: Vec<_> = (0..size)
            .flat_map(|a| ((a + 1)..size).map(move |b| (a, b)))
            .collect();
        Self::from_edges(size, &edges)
    }

    /// A simple path through `size` positions.
    pub fn path(size: usize) -> Result<Self> {
        let edges: Vec<_> = (1..size).map(|b| (b - 1, b)).collect();
        Self::from_edges(size, &edges)
    }

    /// A simple cycle through `size` positions.
    pub fn cycle(size: usize) -> Result<Self> {
        ensure!(size >= 3, "a cycle needs at least 3 positions");
        let mut edges: Vec<_> = (1..size).map(|b| (b - 1, b)).collect();
        edges.push((size - 1, 0));
        Self::from_edges(size, &edges)
    }

    /// Number of positions.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if positions `a` and `b` are adjacent.
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.adj[a] & (1 << b) != 0
    }

    /// Number of pattern edges.
    pub fn edge_count(&self) -> usize {
        self.adj[..self.size]
            .iter()
            .map(|row| row.count_ones() as usize)
            .sum::<usize>()
            / 2
    }

    /// Positions adjacent to `a`.
    pub fn neighbors(&self, a: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.size).filter(move |&b| self.has_edge(a, b))
    }

    /// Returns `true` if every position is reachable from position 0.
    pub fn is_connected(&self) -> bool {
        let mut seen: u16 = 1;
        let mut frontier: u16 = 1;
        while frontier != 0 {
            let a = frontier.trailing_zeros() as usize;
            frontier &= frontier - 1;
            let fresh = self.adj[a] & !seen;
            seen |= fresh;
            frontier |= fresh;
        }
        seen.count_ones() as usize == self.size
    }

    /// Row-major `0`/`1` adjacency string, the inverse of [`from_adjacency_str`](Self::from_adjacency_str).
    pub fn to_adjacency_string(&self) -> String {
        (0..self.size)
            .flat_map(|a| (0..self.size).map(move |b| if self.has_edge(a, b) { '1' } else { '0' }))
            .collect()
    }
}
