//! Straightforward plan construction for a pattern.
//!
//! This is not a schedule optimizer. It picks a binding order greedily (most
//! already-bound neighbors first), reuses the latest earlier candidate set whose
//! constraints are implied by the current level's, and routes adjacency lookups
//! through the shallowest mini graph able to answer them.

use anyhow::{bail, ensure, Result};

use super::{Level, Pattern, Plan, SetExpr, SetOp, SetRef};

/// Knobs for [`Plan::compile`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    /// Count vertex-induced embeddings (non-edges must be absent) instead of
    /// edge-induced ones.
    pub induced: bool,
    /// Symmetry-breaking restrictions `(a, b)`: the vertex at position `a` must have
    /// a larger ID than the vertex at position `b`.
    pub restrictions: Vec<(usize, usize)>,
    /// Plan mini-graph caches where a lookup can be served from one.
    pub use_cache: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            induced: false,
            restrictions: Vec::new(),
            use_cache: true,
        }
    }
}

impl CompileOptions {
    /// Adds the restriction `id(a) > id(b)`.
    #[must_use]
    pub fn restrict(mut self, a: usize, b: usize) -> Self {
        self.restrictions.push((a, b));
        self
    }

    /// Restricts every position to a descending chain `0 > 1 > ... > size-1`.
    ///
    /// For a clique this counts each embedding exactly once.
    #[must_use]
    pub fn descending(mut self, size: usize) -> Self {
        self.restrictions.extend((1..size).map(|b| (b - 1, b)));
        self
    }

    /// Builder-style setter for `induced`.
    #[must_use]
    pub fn induced(mut self, induced: bool) -> Self {
        self.induced = induced;
        self
    }

    /// Builder-style setter for `use_cache`.
    #[must_use]
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }
}

/// Level bitmask.
type Mask = u32;

fn bits(mask: Mask) -> impl Iterator<Item = usize> {
    (0..Mask::BITS as usize).filter(move |&i| mask & (1 << i) != 0)
}

pub(super) fn compile(pattern: &Pattern, options: &CompileOptions) -> Result<Plan> {
    let n = pattern.size();
    ensure!(pattern.is_connected(), "pattern must be connected");
    for &(a, b) in &options.restrictions {
        ensure!(a < n && b < n && a != b, "invalid restriction ({a}, {b})");
    }

    let order = binding_order(pattern);
    let mut level_of = vec![0usize; n];
    for (k, &p) in order.iter().enumerate() {
        level_of[p] = k;
    }

    // less[x] has bit y set when v_x < v_y is implied by the restrictions (levels).
    let mut less: Vec<Mask> = vec![0; n];
    for &(a, b) in &options.restrictions {
        less[level_of[b]] |= 1 << level_of[a];
    }
    for mid in 0..n {
        for x in 0..n {
            if less[x] & (1 << mid) != 0 {
                less[x] |= less[mid];
            }
        }
    }

    let adjacent = |x: usize, y: usize| pattern.has_edge(order[x], order[y]);
    let earlier = |k: usize| -> Mask { (1 << k) - 1 };
    let nbrs = |k: usize| -> Mask {
        bits(earlier(k))
            .filter(|&j| adjacent(j, k))
            .fold(0, |m, j| m | 1 << j)
    };
    let uppers = |k: usize| -> Mask { less[k] & earlier(k) };
    let lowers = |k: usize| -> Mask {
        bits(earlier(k))
            .filter(|&j| less[j] & (1 << k) != 0)
            .fold(0, |m, j| m | 1 << j)
    };

    let mut levels = vec![Level::new(SetExpr::from_base(SetRef::All))];
    for k in 1..n {
        let nk = nbrs(k);
        let mk = earlier(k) & !nk;
        let base = (1..k).rev().find(|&p| {
            let np = nbrs(p);
            let implied = np & !nk == 0
                && uppers(p) & !uppers(k) == 0
                && lowers(p) & !lowers(k) == 0;
            // Vertex-induced candidates of p also subtract p's non-neighbors.
            implied && (!options.induced || nk & earlier(p) == np)
        });

        let (mut expr, covered_n, covered_m, covered_up, covered_lo) = match base {
            Some(p) => (
                SetExpr::from_base(SetRef::Candidates(p)),
                nbrs(p),
                earlier(p) & !nbrs(p),
                uppers(p),
                lowers(p),
            ),
            None => {
                let Some(first) = bits(nk).next() else {
                    bail!("position {} has no earlier neighbor", order[k]);
                };
                (SetExpr::from_base(SetRef::Adj(first)), 1 << first, 0, 0, 0)
            }
        };
        for j in bits(nk & !covered_n) {
            expr.ops.push(SetOp::Intersect(SetRef::Adj(j)));
        }
        for j in bits(mk & !covered_m) {
            if options.induced {
                expr.ops.push(SetOp::Subtract(SetRef::Adj(j)));
            }
            expr.exclude.push(j);
        }
        expr.upper.extend(bits(uppers(k) & !covered_up));
        expr.lower.extend(bits(lowers(k) & !covered_lo));
        levels.push(Level::new(expr));
    }

    if options.use_cache {
        route_through_caches(&mut levels);
    }
    Plan::new(levels)
}

/// Greedy binding order: highest-degree position first, then repeatedly the
/// position with the most bound neighbors (ties: higher degree, lower index).
fn binding_order(pattern: &Pattern) -> Vec<usize> {
    let n = pattern.size();
    let degree = |p: usize| pattern.neighbors(p).count();
    let mut order = Vec::with_capacity(n);
    let mut bound = vec![false; n];
    let first = (0..n).max_by_key(|&p| (degree(p), core::cmp::Reverse(p))).unwrap_or(0);
    order.push(first);
    bound[first] = true;
    while let Some(next) = (0..n).filter(|&p| !bound[p]).max_by_key(|&p| {
        let links = pattern.neighbors(p).filter(|&q| bound[q]).count();
        (links, degree(p), core::cmp::Reverse(p))
    }) {
        order.push(next);
        bound[next] = true;
    }
    order
}

fn chain_of(levels: &[Level], level: usize) -> Vec<usize> {
    let mut out = vec![level];
    let mut cur = level;
    while let SetRef::Candidates(q) = levels[cur].candidates.base {
        out.push(q);
        cur = q;
    }
    out
}

/// Replaces `Adj(j)` operands with cached lookups when a mini graph can answer them.
fn route_through_caches(levels: &mut [Level]) {
    for k in 1..levels.len() {
        let SetRef::Candidates(q) = levels[k].candidates.base else {
            continue;
        };
        let base_chain = chain_of(levels, q);
        for i in 0..levels[k].candidates.ops.len() {
            let op = levels[k].candidates.ops[i];
            let SetRef::Adj(j) = op.operand() else {
                continue;
            };
            if j == 0 {
                continue;
            }
            let pos_chain = chain_of(levels, j);
            // Shallowest level (>= 1) containing both the base and v_j.
            let Some(c) = base_chain
                .iter()
                .rev()
                .copied()
                .find(|&c| c >= 1 && pos_chain.contains(&c))
            else {
                continue;
            };
            let cached = SetRef::Cached { cache: c, pos: j };
            levels[k].candidates.ops[i] = match op {
                SetOp::Intersect(_) => SetOp::Intersect(cached),
                SetOp::Subtract(_) => SetOp::Subtract(cached),
            };
            levels[c].cache.get_or_insert_with(Default::default);
        }
    }

    // Derive each cache from the nearest enclosing one.
    for k in 1..levels.len() {
        if levels[k].cache.is_none() {
            continue;
        }
        let parent = chain_of(levels, k)
            .into_iter()
            .skip(1)
            .find(|&l| l >= 1 && levels[l].cache.is_some());
        if let Some(spec) = levels[k].cache.as_mut() {
            spec.parent = parent;
        }
    }
}
