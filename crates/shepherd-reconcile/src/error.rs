//! Reconciliation error types.

use thiserror::Error;

use shepherd_core::ClusterStatus;
use shepherd_provider::ProviderError;

/// Errors that fail a whole workload's reconciliation.
///
/// These are recorded per workload in the pass outcome; they never abort
/// the pass. Per-node launch failures are data on `LaunchResult`, not
/// errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReconcileError {
    #[error("cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("cluster {cluster} is not active (status {status:?})")]
    ClusterNotActive {
        cluster: String,
        status: ClusterStatus,
    },

    #[error("provider unavailable: {0}")]
    ProviderUnavailable(#[from] ProviderError),

    #[error("reconciliation cancelled")]
    Cancelled,
}
