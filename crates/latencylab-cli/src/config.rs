//! The TOML run configuration for a `latencylab run` invocation.

use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Complete configuration for a `latencylab run` invocation. Parsed from
/// TOML; any field also settable via a CLI flag is overridden by that flag
/// when both are present.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Path to the model JSON file to simulate.
    pub model: String,
    /// Number of independent runs in the batch.
    #[serde(default = "default_runs")]
    pub runs: u64,
    /// Master seed every run's seed is derived from.
    #[serde(default)]
    pub base_seed: u64,
    /// Caps how many runs may execute concurrently. Unset means unbounded.
    #[serde(default)]
    pub max_parallelism: Option<usize>,
    /// Directory `trace.csv`, `runs.csv`, and `summary.json` are written
    /// into.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// If false, per-instance traces are dropped after each run's summary
    /// fields are derived, bounding memory for very large batches.
    #[serde(default = "default_collect_traces")]
    pub collect_traces: bool,
    /// `top_critical_paths` truncation, default 10.
    #[serde(default)]
    pub top_k: Option<usize>,
    /// If set, no run is started once this many milliseconds have elapsed
    /// since the batch began; in-flight runs still complete.
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

fn default_runs() -> u64 {
    1
}

fn default_output_dir() -> String {
    "out".to_string()
}

fn default_collect_traces() -> bool {
    true
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}
