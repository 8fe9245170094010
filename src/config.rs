//! Run configuration.
//!
//! Configs are plain serde structs so drivers can keep them next to their datasets
//! as JSON:
//!
//! ```json
//! { "num_threads": 8, "fan_out": { "mode": "adaptive", "factor": 32 }, "cache": "cost_model" }
//! ```
//!
//! Every field has a default, so `{}` is a valid config.

use std::path::Path;

use anyhow::{ensure, Context as _, Result};
use serde::{Deserialize, Serialize};

use crate::concurrency::DEFAULT_QUEUE_CAPACITY;
use crate::graph::HostGraph;

/// Default multiple of the average degree above which a level fans out.
pub const DEFAULT_FAN_OUT_FACTOR: usize = 32;

/// When an inner recursion level is handed to the work-stealing scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FanOut {
    /// Fan out when the candidate set is larger than `factor` times the average degree.
    Adaptive {
        /// Multiple of the (rounded up) average degree.
        factor: usize,
    },
    /// Fan out every non-empty inner level.
    Always,
    /// Never fan out below the top level.
    Never,
}

impl FanOut {
    /// Candidate-set size a level must exceed to run in parallel.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn threshold(&self, graph: &HostGraph) -> usize {
        match *self {
            FanOut::Adaptive { factor } => {
                let degree = graph.average_degree().ceil().max(1.0) as usize;
                factor.saturating_mul(degree).max(1)
            }
            FanOut::Always => 0,
            FanOut::Never => usize::MAX,
        }
    }
}

impl Default for FanOut {
    fn default() -> Self {
        FanOut::Adaptive {
            factor: DEFAULT_FAN_OUT_FACTOR,
        }
    }
}

/// Whether planned mini-graph caches are actually built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Build a cache when its estimated reuse multiplier pays for it.
    #[default]
    CostModel,
    /// Build every planned cache.
    Always,
    /// Never build caches; recompute from host adjacency.
    Never,
}

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker threads per rank; `0` uses the available parallelism.
    pub num_threads: usize,
    /// Inner-level parallelization policy.
    pub fan_out: FanOut,
    /// Mini-graph build policy.
    pub cache: CachePolicy,
    /// Top-level vertices per work unit.
    pub chunk_size: usize,
    /// Capacity of the relinquished-work queue.
    pub queue_capacity: usize,
    /// Maximum number of units one steal takes from a peer.
    pub steal_batch: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_threads: 0,
            fan_out: FanOut::default(),
            cache: CachePolicy::default(),
            chunk_size: 64,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            steal_batch: 8,
        }
    }
}

impl EngineConfig {
    /// Parses a JSON config and validates it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("invalid engine config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("in {}", path.display()))
    }

    /// Serializes the config as pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize engine config")
    }

    /// Rejects configurations the scheduler cannot run.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.chunk_size > 0, "chunk_size must be > 0");
        ensure!(self.queue_capacity > 0, "queue_capacity must be > 0");
        ensure!(self.steal_batch > 0, "steal_batch must be > 0");
        if let FanOut::Adaptive { factor } = self.fan_out {
            ensure!(factor > 0, "fan_out factor must be > 0");
        }
        Ok(())
    }

    /// Worker count after resolving `0` to the available parallelism.
    pub fn resolved_threads(&self) -> usize {
        match self.num_threads {
            0 => std::thread::available_parallelism().map_or(1, usize::from),
            n => n,
        }
    }

    /// Builder-style setter for `num_threads`.
    #[must_use]
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Builder-style setter for `fan_out`.
    #[must_use]
    pub fn with_fan_out(mut self, fan_out: FanOut) -> Self {
        self.fan_out = fan_out;
        self
    }

    /// Builder-style setter for `cache`.
    #[must_use]
    pub fn with_cache(mut self, cache: CachePolicy) -> Self {
        self.cache = cache;
        self
    }

    /// Builder-style setter for `chunk_size`.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}
