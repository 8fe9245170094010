//! The generic recursive loop engine.
//!
//! One [`Interpreter`] walks any validated [`Plan`]. Each recursion level derives
//! its candidate set from the bound prefix, optionally builds a [`MiniGraph`] over
//! it, and iterates it, in parallel when the set is large enough. The last level
//! never iterates: it adds the cardinality of its candidate set.
//!
//! Bound vertices live in a chain of stack [`Frame`]s, one per level, each pointing
//! at its parent. Candidate sets and mini graphs are borrowed from the frame that
//! computed them and dropped when that branch returns.

use core::mem;

use rayon::prelude::*;

use crate::collections::{VertexSet, Vid};
use crate::concurrency::WorkUnit;
use crate::config::{CachePolicy, EngineConfig};
use crate::graph::mini_graph::{estimate_reuse_multiplier, MIN_REUSE};
use crate::graph::{HostGraph, MiniGraph};
use crate::plan::{Plan, SetExpr, SetOp, SetRef};

/// Reusable buffers for one recursion level.
#[derive(Debug, Default)]
pub(crate) struct LevelScratch {
    set: Vec<Vid>,
    tmp: Vec<Vid>,
    excluded: Vec<Vid>,
    positions: Vec<Vec<u32>>,
}

/// Buffers for every level below the root of a plan of `depth` levels.
pub(crate) fn scratch_for(depth: usize) -> Vec<LevelScratch> {
    (1..depth).map(|_| LevelScratch::default()).collect()
}

/// One bound vertex.
struct Frame<'f> {
    parent: Option<&'f Frame<'f>>,
    level: usize,
    vertex: Vid,
    /// Position of `vertex` in `candidates`.
    index: usize,
    candidates: VertexSet<'f>,
    /// Mini graph built over `candidates`, if any.
    cache: Option<&'f MiniGraph<'f>>,
    /// Per lookup of this level: mini-graph positions of every member of `candidates`.
    positions: &'f [Vec<u32>],
}

impl<'f> Frame<'f> {
    fn at(&self, level: usize) -> &Frame<'f> {
        let mut frame = self;
        while frame.level > level {
            match frame.parent {
                Some(parent) => frame = parent,
                None => break,
            }
        }
        debug_assert_eq!(frame.level, level, "frame chain is missing level {level}");
        frame
    }
}

/// Read-only state shared by every task of a run.
pub(crate) struct Interpreter<'g> {
    graph: &'g HostGraph,
    plan: &'g Plan,
    all: Vec<Vid>,
    threshold: usize,
    cache: CachePolicy,
}

impl<'g> Interpreter<'g> {
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn new(graph: &'g HostGraph, plan: &'g Plan, config: &EngineConfig) -> Self {
        Self {
            graph,
            plan,
            all: (0..graph.vertex_count() as Vid).collect(),
            threshold: config.fan_out.threshold(graph),
            cache: config.cache,
        }
    }

    /// Counts the embeddings whose level-0 vertex lies in `unit`.
    pub(crate) fn count_unit(&self, unit: WorkUnit, scratch: &mut [LevelScratch]) -> u64 {
        if self.plan.depth() == 1 {
            return unit.len() as u64;
        }
        let root = VertexSet::new(&self.all);
        unit.vertices()
            .map(|v| {
                let frame = Frame {
                    parent: None,
                    level: 0,
                    vertex: v,
                    index: v as usize,
                    candidates: root,
                    cache: None,
                    positions: &[],
                };
                self.descend(1, &frame, scratch)
            })
            .sum()
    }

    fn descend(&self, k: usize, parent: &Frame<'_>, scratch: &mut [LevelScratch]) -> u64 {
        let (mine, rest) = scratch.split_at_mut(1);
        let LevelScratch {
            set,
            tmp,
            excluded,
            positions,
        } = &mut mine[0];
        let expr = &self.plan.levels()[k].candidates;

        if k + 1 == self.plan.depth() {
            return self.count(expr, parent, tmp, set, excluded) as u64;
        }

        self.evaluate(expr, parent, set, tmp, excluded);
        if set.is_empty() {
            return 0;
        }
        let candidates = VertexSet::new(set);
        let info = self.plan.info(k);

        positions.resize_with(info.lookups.len(), Vec::new);
        for (slot, &c) in positions.iter_mut().zip(&info.lookups) {
            match parent.at(c).cache {
                Some(mg) => mg.indices(candidates, slot),
                None => slot.clear(),
            }
        }
        let positions: &[Vec<u32>] = positions;

        let mini = self.plan.levels()[k].cache.and_then(|spec| {
            let reuse = estimate_reuse_multiplier(candidates.len(), info.cache_distances.iter().copied());
            let wanted = match self.cache {
                CachePolicy::Always => true,
                CachePolicy::Never => false,
                CachePolicy::CostModel => reuse > MIN_REUSE,
            };
            if !wanted {
                return None;
            }
            let derived = spec.parent.and_then(|p| {
                let parent_mg = parent.at(p).cache?;
                let slot = info.lookups.iter().position(|&c| c == p)?;
                Some(MiniGraph::build_from_parent(parent_mg, &positions[slot], candidates, candidates))
            });
            let mut mg = derived.unwrap_or_else(|| MiniGraph::build(self.graph, candidates, candidates));
            mg.set_reuse_multiplier(reuse);
            Some(mg)
        });

        let child = |i: usize| Frame {
            parent: Some(parent),
            level: k,
            vertex: candidates[i],
            index: i,
            candidates,
            cache: mini.as_ref(),
            positions,
        };

        if candidates.len() > self.threshold {
            let below = rest.len();
            (0..candidates.len())
                .into_par_iter()
                .map_init(
                    || (0..below).map(|_| LevelScratch::default()).collect::<Vec<_>>(),
                    |local, i| self.descend(k + 1, &child(i), local),
                )
                .sum()
        } else {
            (0..candidates.len())
                .map(|i| self.descend(k + 1, &child(i), rest))
                .sum()
        }
    }

    fn resolve<'a>(&'a self, r: SetRef, frame: &'a Frame<'a>) -> VertexSet<'a> {
        match r {
            SetRef::All => VertexSet::new(&self.all),
            SetRef::Adj(p) => self.graph.neighbors(frame.at(p).vertex),
            SetRef::Candidates(l) => frame.at(l).candidates,
            SetRef::Cached { cache, pos } => {
                let bound = frame.at(pos);
                self.cached_row(frame.at(cache), bound, cache, pos)
                    .unwrap_or_else(|| self.graph.neighbors(bound.vertex))
            }
        }
    }

    /// The mini-graph row for the vertex at `pos`, or `None` if the cache was skipped.
    fn cached_row<'a>(
        &self,
        holder: &'a Frame<'a>,
        bound: &'a Frame<'a>,
        cache: usize,
        pos: usize,
    ) -> Option<VertexSet<'a>> {
        let mg = holder.cache?;
        let row = if pos == cache {
            bound.index
        } else {
            let slot = self.plan.info(pos).lookups.iter().position(|&c| c == cache)?;
            *bound.positions.get(slot)?.get(bound.index)? as usize
        };
        Some(mg.neighbors(row))
    }

    /// The base of `expr` narrowed by its ID bounds.
    fn bounded_base<'a>(&'a self, expr: &SetExpr, frame: &'a Frame<'a>) -> VertexSet<'a> {
        let mut base = self.resolve(expr.base, frame);
        for &p in &expr.upper {
            base = base.bounded(frame.at(p).vertex);
        }
        for &p in &expr.lower {
            base = base.bounded_below(frame.at(p).vertex);
        }
        base
    }

    fn collect_excluded(expr: &SetExpr, frame: &Frame<'_>, excluded: &mut Vec<Vid>) {
        excluded.clear();
        excluded.extend(expr.exclude.iter().map(|&p| frame.at(p).vertex));
        excluded.sort_unstable();
        excluded.dedup();
    }

    /// Applies every op except the last; the running set ends up in `out`.
    ///
    /// Returns the source the last op reads, or `None` when there are no ops.
    fn apply_prefix<'a>(
        &'a self,
        expr: &SetExpr,
        frame: &'a Frame<'a>,
        base: VertexSet<'a>,
        out: &'a mut Vec<Vid>,
        tmp: &mut Vec<Vid>,
    ) -> Option<VertexSet<'a>> {
        let (_, prefix) = expr.ops.split_last()?;
        let mut ops = prefix.iter();
        let Some(first) = ops.next() else {
            return Some(base);
        };
        self.apply(*first, base, frame, out);
        for &op in ops {
            self.apply(op, VertexSet::new(out), frame, tmp);
            mem::swap(out, tmp);
        }
        Some(VertexSet::new(&*out))
    }

    fn apply(&self, op: SetOp, src: VertexSet<'_>, frame: &Frame<'_>, dst: &mut Vec<Vid>) {
        match op {
            SetOp::Intersect(r) => src.intersect_into(self.resolve(r, frame), dst),
            SetOp::Subtract(r) => src.subtract_into(self.resolve(r, frame), dst),
        }
    }

    /// Materializes the candidate set of `expr` into `out`.
    fn evaluate(
        &self,
        expr: &SetExpr,
        frame: &Frame<'_>,
        out: &mut Vec<Vid>,
        tmp: &mut Vec<Vid>,
        excluded: &mut Vec<Vid>,
    ) {
        Self::collect_excluded(expr, frame, excluded);
        let base = self.bounded_base(expr, frame);
        let Some(last) = expr.ops.last().copied() else {
            out.clear();
            out.extend(base.iter().filter(|v| excluded.binary_search(v).is_err()));
            return;
        };

        // The last op reads from `tmp` so it can write into `out`.
        let src = self.apply_prefix(expr, frame, base, tmp, out).unwrap_or(base);
        match (last, excluded.as_slice()) {
            (SetOp::Intersect(r), &[x]) => src.intersect_except_into(self.resolve(r, frame), x, out),
            (SetOp::Subtract(r), &[x]) => src.subtract_except_into(self.resolve(r, frame), x, out),
            (op, rest) => {
                self.apply(op, src, frame, out);
                if !rest.is_empty() {
                    out.retain(|v| rest.binary_search(v).is_err());
                }
            }
        }
    }

    /// Cardinality of the candidate set of `expr`, materializing at most the prefix.
    fn count(
        &self,
        expr: &SetExpr,
        frame: &Frame<'_>,
        buf: &mut Vec<Vid>,
        tmp: &mut Vec<Vid>,
        excluded: &mut Vec<Vid>,
    ) -> usize {
        Self::collect_excluded(expr, frame, excluded);
        let base = self.bounded_base(expr, frame);
        let Some(last) = expr.ops.last().copied() else {
            return base.len() - excluded.iter().filter(|&&x| base.contains(x)).count();
        };

        let src = self.apply_prefix(expr, frame, base, buf, tmp).unwrap_or(base);
        let operand = self.resolve(last.operand(), frame);
        match (last, excluded.as_slice()) {
            (SetOp::Intersect(_), &[x]) => src.intersect_except_cnt(operand, x),
            (SetOp::Subtract(_), &[x]) => src.subtract_except_cnt(operand, x),
            (SetOp::Intersect(_), rest) => {
                let hits = rest
                    .iter()
                    .filter(|&&x| src.contains(x) && operand.contains(x))
                    .count();
                src.intersect_cnt(operand) - hits
            }
            (SetOp::Subtract(_), rest) => {
                let hits = rest
                    .iter()
                    .filter(|&&x| src.contains(x) && !operand.contains(x))
                    .count();
                src.subtract_cnt(operand) - hits
            }
        }
    }
}
