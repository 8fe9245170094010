//! Explicit execution plans.
//!
//! A [`Plan`] is a loop nest written down as data. Level `k` binds pattern
//! position `k`: its [`SetExpr`] derives the candidate set for that position from
//! vertices and sets bound at earlier levels, and its optional [`CacheSpec`] asks
//! the interpreter to build a [`MiniGraph`] over the level's candidates for deeper
//! levels to consult.
//!
//! Plans are validated on construction, so the interpreter can index into them
//! without re-checking references.
//!
//! [`MiniGraph`]: crate::graph::MiniGraph

mod compile;
mod pattern;

use core::fmt;

use anyhow::{bail, ensure, Context as _, Result};
use serde::{Deserialize, Serialize};

pub use compile::CompileOptions;
pub use pattern::Pattern;

/// A set an expression can read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetRef {
    /// Every host vertex. Only valid as the base of level 0.
    All,
    /// Host adjacency of the vertex bound at a position.
    Adj(usize),
    /// Candidate set of an earlier level.
    Candidates(usize),
    /// Adjacency of the vertex bound at `pos`, restricted to the candidate set of
    /// level `cache`, served by the mini graph built at that level.
    Cached {
        /// Level that built the cache.
        cache: usize,
        /// Position whose vertex is looked up.
        pos: usize,
    },
}

/// One merge step applied to the running set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOp {
    /// Keep members also in the operand.
    Intersect(SetRef),
    /// Drop members found in the operand.
    Subtract(SetRef),
}

impl SetOp {
    /// The operand set.
    pub fn operand(&self) -> SetRef {
        match *self {
            SetOp::Intersect(r) | SetOp::Subtract(r) => r,
        }
    }
}

/// How a level's candidate set is derived.
///
/// Evaluation order: take `base`, keep only IDs below every `upper` vertex and
/// above every `lower` vertex, apply `ops` left to right, then drop the vertices
/// bound at the `exclude` positions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetExpr {
    /// Starting set.
    pub base: SetRef,
    /// Merge steps.
    #[serde(default)]
    pub ops: Vec<SetOp>,
    /// Positions whose bound IDs are strict upper bounds.
    #[serde(default)]
    pub upper: Vec<usize>,
    /// Positions whose bound IDs are strict lower bounds.
    #[serde(default)]
    pub lower: Vec<usize>,
    /// Positions whose bound vertices may not be reused.
    #[serde(default)]
    pub exclude: Vec<usize>,
}

impl SetExpr {
    /// An expression that is just `base`.
    pub fn from_base(base: SetRef) -> Self {
        Self {
            base,
            ops: Vec::new(),
            upper: Vec::new(),
            lower: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Appends an intersection.
    #[must_use]
    pub fn intersect(mut self, with: SetRef) -> Self {
        self.ops.push(SetOp::Intersect(with));
        self
    }

    /// Appends a subtraction.
    #[must_use]
    pub fn subtract(mut self, with: SetRef) -> Self {
        self.ops.push(SetOp::Subtract(with));
        self
    }

    /// Bounds candidates strictly below the vertex at `pos`.
    #[must_use]
    pub fn below(mut self, pos: usize) -> Self {
        self.upper.push(pos);
        self
    }

    /// Bounds candidates strictly above the vertex at `pos`.
    #[must_use]
    pub fn above(mut self, pos: usize) -> Self {
        self.lower.push(pos);
        self
    }

    /// Excludes the vertex bound at `pos`.
    #[must_use]
    pub fn excluding(mut self, pos: usize) -> Self {
        self.exclude.push(pos);
        self
    }

    fn refs(&self) -> impl Iterator<Item = SetRef> + '_ {
        core::iter::once(self.base).chain(self.ops.iter().map(SetOp::operand))
    }
}

/// Request to cache restricted adjacency over a level's candidate set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSpec {
    /// An earlier caching level whose rows can be narrowed instead of the host graph.
    #[serde(default)]
    pub parent: Option<usize>,
}

/// One loop of the nest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Candidate set for this level's position.
    pub candidates: SetExpr,
    /// Cache to build over the candidates before iterating them.
    #[serde(default)]
    pub cache: Option<CacheSpec>,
}

impl Level {
    /// A level with no cache.
    pub fn new(candidates: SetExpr) -> Self {
        Self {
            candidates,
            cache: None,
        }
    }

    /// A level that builds a cache.
    pub fn cached(candidates: SetExpr, parent: Option<usize>) -> Self {
        Self {
            candidates,
            cache: Some(CacheSpec { parent }),
        }
    }
}

/// Facts about a level derived from the whole plan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct LevelInfo {
    /// Caching levels that look up this level's vertex (other than this level itself).
    pub lookups: Vec<usize>,
    /// For the cache built here: how many levels below each consulting term sits.
    pub cache_distances: Vec<usize>,
}

/// A validated loop nest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Level>", into = "Vec<Level>")]
pub struct Plan {
    levels: Vec<Level>,
    info: Vec<LevelInfo>,
}

impl Plan {
    /// Validates `levels` and builds a plan.
    pub fn new(levels: Vec<Level>) -> Result<Self> {
        validate(&levels)?;
        let info = analyze(&levels);
        Ok(Self { levels, info })
    }

    /// Compiles a plan for `pattern`.
    pub fn compile(pattern: &Pattern, options: &CompileOptions) -> Result<Self> {
        compile::compile(pattern, options)
    }

    /// Parses a JSON plan (an array of levels).
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid plan JSON")
    }

    /// Serializes the plan as JSON.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).context("failed to serialize plan")
    }

    /// Number of pattern positions.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// The levels, outermost first.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Number of levels that build a cache.
    pub fn cache_count(&self) -> usize {
        self.levels.iter().filter(|l| l.cache.is_some()).count()
    }

    pub(crate) fn info(&self, level: usize) -> &LevelInfo {
        &self.info[level]
    }
}

impl TryFrom<Vec<Level>> for Plan {
    type Error = anyhow::Error;

    fn try_from(levels: Vec<Level>) -> Result<Self> {
        Self::new(levels)
    }
}

impl From<Plan> for Vec<Level> {
    fn from(plan: Plan) -> Self {
        plan.levels
    }
}

/// Levels reachable by following `Candidates` bases from `level`, including itself.
fn chain(levels: &[Level], level: usize) -> impl Iterator<Item = usize> + '_ {
    let mut next = Some(level);
    core::iter::from_fn(move || {
        let cur = next?;
        next = match levels[cur].candidates.base {
            SetRef::Candidates(q) if q < cur => Some(q),
            _ => None,
        };
        Some(cur)
    })
}

fn validate(levels: &[Level]) -> Result<()> {
    ensure!(!levels.is_empty(), "plan has no levels");

    let root = &levels[0];
    ensure!(
        root.candidates == SetExpr::from_base(SetRef::All),
        "level 0 must iterate every vertex with no further constraints"
    );
    ensure!(root.cache.is_none(), "level 0 cannot build a cache");

    let last = levels.len() - 1;
    for (k, level) in levels.iter().enumerate().skip(1) {
        let expr = &level.candidates;
        let ctx = || format!("level {k}");

        match expr.base {
            SetRef::All => bail!("{}: only level 0 may start from every vertex", ctx()),
            SetRef::Cached { .. } => bail!("{}: a cached lookup cannot be a base", ctx()),
            _ => {}
        }
        for r in expr.refs() {
            check_ref(levels, k, expr, r).with_context(ctx)?;
        }
        for &p in expr.upper.iter().chain(&expr.lower).chain(&expr.exclude) {
            ensure!(p < k, "{}: constraint on unbound position {p}", ctx());
        }

        if let Some(spec) = level.cache {
            ensure!(k < last, "{}: the last level cannot build a cache", ctx());
            if let Some(parent) = spec.parent {
                ensure!(
                    parent < k && levels[parent].cache.is_some(),
                    "{}: cache parent {parent} is not an earlier caching level",
                    ctx()
                );
                ensure!(
                    chain(levels, k).any(|l| l == parent),
                    "{}: cache parent {parent} does not contain this level's candidates",
                    ctx()
                );
            }
        }
    }
    Ok(())
}

fn check_ref(levels: &[Level], k: usize, expr: &SetExpr, r: SetRef) -> Result<()> {
    match r {
        SetRef::All => bail!("every-vertex set used as an operand"),
        SetRef::Adj(p) => ensure!(p < k, "adjacency of unbound position {p}"),
        SetRef::Candidates(l) => ensure!(l < k, "candidates of later level {l}"),
        SetRef::Cached { cache, pos } => {
            ensure!(pos < k, "cached lookup of unbound position {pos}");
            ensure!(
                cache >= 1 && cache <= pos && levels[cache].cache.is_some(),
                "level {cache} builds no cache usable for position {pos}"
            );
            ensure!(
                chain(levels, pos).any(|l| l == cache),
                "vertex at position {pos} is not drawn from level {cache}'s candidates"
            );
            let SetRef::Candidates(q) = expr.base else {
                bail!("cached lookups need a candidate-set base");
            };
            ensure!(
                chain(levels, q).any(|l| l == cache),
                "base candidates of level {q} are not within level {cache}'s candidates"
            );
        }
    }
    Ok(())
}

fn analyze(levels: &[Level]) -> Vec<LevelInfo> {
    let mut info = vec![LevelInfo::default(); levels.len()];
    for (k, level) in levels.iter().enumerate() {
        for r in level.candidates.refs() {
            if let SetRef::Cached { cache, pos } = r {
                if pos != cache && !info[pos].lookups.contains(&cache) {
                    info[pos].lookups.push(cache);
                }
                info[cache].cache_distances.push(k - cache);
            }
        }
    }
    for (k, level) in levels.iter().enumerate() {
        // A derived cache looks up its own candidates in the parent.
        if let Some(CacheSpec { parent: Some(p) }) = level.cache {
            if !info[k].lookups.contains(&p) {
                info[k].lookups.push(p);
            }
        }
    }
    info
}

impl fmt::Display for SetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SetRef::All => write!(f, "V"),
            SetRef::Adj(p) => write!(f, "N(v{p})"),
            SetRef::Candidates(l) => write!(f, "C{l}"),
            SetRef::Cached { cache, pos } => write!(f, "M{cache}(v{pos})"),
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, level) in self.levels.iter().enumerate() {
            let e = &level.candidates;
            write!(f, "C{k} = {}", e.base)?;
            for op in &e.ops {
                match op {
                    SetOp::Intersect(r) => write!(f, " & {r}")?,
                    SetOp::Subtract(r) => write!(f, " - {r}")?,
                }
            }
            for p in &e.upper {
                write!(f, " <v{p}")?;
            }
            for p in &e.lower {
                write!(f, " >v{p}")?;
            }
            for p in &e.exclude {
                write!(f, " !v{p}")?;
            }
            if let Some(spec) = level.cache {
                match spec.parent {
                    Some(p) => write!(f, " [cache from M{p}]")?,
                    None => write!(f, " [cache]")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
