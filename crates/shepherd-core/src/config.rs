//! shepherd.toml configuration parser.
//!
//! Every field can also be set from the command line; the binary loads
//! the file first (if given) and applies flag overrides on top.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::WorkloadId;

/// Default per-call node cap for start-workload calls. Control planes
/// commonly cap this at 10 nodes per call; the launcher always chunks.
pub const DEFAULT_MAX_NODES_PER_CALL: usize = 10;

/// Default originator tag stamped on every launch call.
pub const DEFAULT_STARTED_BY: &str = "shepd";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Name of the target cluster. Required.
    #[serde(default)]
    pub cluster: String,
    /// Provider region or endpoint. Required.
    #[serde(default)]
    pub region: String,
    /// Daemon workload identifiers to keep present on every node.
    #[serde(default)]
    pub tasks: Vec<WorkloadId>,
    /// Maximum nodes per start-workload call.
    #[serde(default = "default_max_nodes_per_call")]
    pub max_nodes_per_call: usize,
    /// Originator tag for launch calls.
    #[serde(default = "default_started_by")]
    pub started_by: String,
    /// Refresh/reconcile interval in minutes. Minimum 1.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    /// When false, periodic ticks only refresh the snapshot and never
    /// launch anything.
    #[serde(default = "default_reconcile_on_tick")]
    pub reconcile_on_tick: bool,
    /// HTTP port for the control surface.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_max_nodes_per_call() -> usize {
    DEFAULT_MAX_NODES_PER_CALL
}

fn default_started_by() -> String {
    DEFAULT_STARTED_BY.to_string()
}

fn default_interval_minutes() -> u64 {
    5
}

fn default_reconcile_on_tick() -> bool {
    true
}

fn default_port() -> u16 {
    7777
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cluster: String::new(),
            region: String::new(),
            tasks: Vec::new(),
            max_nodes_per_call: DEFAULT_MAX_NODES_PER_CALL,
            started_by: DEFAULT_STARTED_BY.to_string(),
            interval_minutes: 5,
            reconcile_on_tick: true,
            port: 7777,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Validate startup requirements. A missing cluster name or region is
    /// fatal; everything else has a usable default.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.cluster.is_empty() {
            anyhow::bail!("no target cluster configured (set `cluster` or --cluster)");
        }
        if self.region.is_empty() {
            anyhow::bail!("no provider region configured (set `region` or --region)");
        }
        if self.interval_minutes < 1 {
            anyhow::bail!("interval_minutes must be at least 1");
        }
        if self.max_nodes_per_call < 1 {
            anyhow::bail!("max_nodes_per_call must be at least 1");
        }
        Ok(())
    }
}
