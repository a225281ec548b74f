//! Workload registry — the managed daemon set.
//!
//! Holds the workload identifiers the operator asked to keep present,
//! plus the last reconciliation outcome per workload. This is what makes
//! asynchronous submissions observable: `POST /daemons` returns 202
//! immediately, and the outcome lands here for `GET /daemons` to report.

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

use shepherd_core::{NodeId, WorkloadId, epoch_secs};

use crate::driver::WorkloadOutcome;
use crate::launcher::NodeFailure;

/// Flattened, serializable record of one workload's last reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeRecord {
    /// Unix timestamp (seconds) when the pass completed.
    pub completed_at: u64,
    pub succeeded: Vec<NodeId>,
    pub failed: Vec<NodeFailure>,
    /// Pass-level error, when the workload never got as far as launching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutcomeRecord {
    fn from_outcome(outcome: &WorkloadOutcome) -> Self {
        match &outcome.result {
            Ok(launch) => OutcomeRecord {
                completed_at: epoch_secs(),
                succeeded: launch.succeeded.clone(),
                failed: launch.failed.clone(),
                error: None,
            },
            Err(e) => OutcomeRecord {
                completed_at: epoch_secs(),
                succeeded: Vec::new(),
                failed: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }
}

/// One registered daemon workload and its last known outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaemonStatus {
    pub workload_id: WorkloadId,
    /// Unix timestamp (seconds) of registration.
    pub registered_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_outcome: Option<OutcomeRecord>,
}

/// The managed set of daemon workloads, in registration order.
///
/// Removal is advisory: it stops future reconciliation of the workload
/// but does not stop instances already running on nodes.
#[derive(Default)]
pub struct WorkloadRegistry {
    entries: RwLock<Vec<DaemonStatus>>,
}

impl WorkloadRegistry {
    /// Create a registry pre-populated with the configured workload list.
    pub fn new(initial: &[WorkloadId]) -> Self {
        let now = epoch_secs();
        let entries = initial
            .iter()
            .map(|id| DaemonStatus {
                workload_id: id.clone(),
                registered_at: now,
                last_outcome: None,
            })
            .collect();
        WorkloadRegistry {
            entries: RwLock::new(entries),
        }
    }

    /// Register a workload. Returns `false` if it was already present.
    pub async fn register(&self, workload_id: &str) -> bool {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|e| e.workload_id == workload_id) {
            return false;
        }
        entries.push(DaemonStatus {
            workload_id: workload_id.to_string(),
            registered_at: epoch_secs(),
            last_outcome: None,
        });
        info!(workload = %workload_id, "workload registered");
        true
    }

    /// Remove a workload from the managed set. Returns `false` if it was
    /// not registered.
    pub async fn remove(&self, workload_id: &str) -> bool {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.workload_id != workload_id);
        let removed = entries.len() < before;
        if removed {
            info!(workload = %workload_id, "workload removed from managed set");
        }
        removed
    }

    /// The managed workload identifiers, in registration order.
    pub async fn workload_ids(&self) -> Vec<WorkloadId> {
        self.entries
            .read()
            .await
            .iter()
            .map(|e| e.workload_id.clone())
            .collect()
    }

    /// Record pass outcomes against their workloads. Outcomes for
    /// workloads removed mid-pass are dropped.
    pub async fn record_outcomes(&self, outcomes: &[WorkloadOutcome]) {
        let mut entries = self.entries.write().await;
        for outcome in outcomes {
            if let Some(entry) = entries
                .iter_mut()
                .find(|e| e.workload_id == outcome.workload_id)
            {
                entry.last_outcome = Some(OutcomeRecord::from_outcome(outcome));
            }
        }
    }

    /// Current view of every registered workload.
    pub async fn statuses(&self) -> Vec<DaemonStatus> {
        self.entries.read().await.clone()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
