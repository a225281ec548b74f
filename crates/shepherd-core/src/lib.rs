//! shepherd-core — shared domain types and configuration.
//!
//! Everything else in the workspace builds on the cluster model defined
//! here: a `Cluster` owns an ordered list of `Node`s, each node carries
//! the `WorkloadInstance`s currently running on it. Snapshots of this
//! model are produced by `shepherd-state` and consumed read-only by the
//! reconciliation core and the control surface.

pub mod config;
pub mod time;
pub mod types;

pub use config::Config;
pub use time::epoch_secs;
pub use types::*;
