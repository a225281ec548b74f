//! Launcher — turns a placement gap into batched start calls.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use shepherd_core::{Cluster, NodeId};
use shepherd_provider::TaskLaunchApi;

use crate::error::ReconcileError;

/// Why a node failed to launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The control plane accepted the call but rejected this node.
    Rejected,
    /// The batch call itself failed; nothing is known about the node.
    Transport,
    /// The batch was never issued because the pass was cancelled.
    Cancelled,
}

/// A node that did not get the workload, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeFailure {
    pub node: NodeId,
    pub reason: String,
    pub kind: FailureKind,
}

/// Aggregated outcome of one launch across all batches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaunchResult {
    pub succeeded: Vec<NodeId>,
    pub failed: Vec<NodeFailure>,
}

impl LaunchResult {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Issues start-workload calls for a placement gap, chunked to the
/// control plane's per-call node cap, and aggregates per-node outcomes
/// in batch order.
pub struct Launcher {
    api: Arc<dyn TaskLaunchApi>,
    max_nodes_per_call: usize,
    started_by: String,
}

impl Launcher {
    pub fn new(api: Arc<dyn TaskLaunchApi>, max_nodes_per_call: usize, started_by: &str) -> Self {
        Launcher {
            api,
            max_nodes_per_call: max_nodes_per_call.max(1),
            started_by: started_by.to_string(),
        }
    }

    /// Launch `workload_id` on every node in `gap`.
    ///
    /// An empty gap is a no-op success and never consults cluster status.
    /// A non-active cluster fails before any call is made. Each batch is
    /// independent: a transport error fails only that batch's nodes and
    /// the remaining batches still run. Cancellation marks not-yet-issued
    /// batches as `Cancelled` rather than `Transport`.
    pub async fn launch(
        &self,
        gap: &[NodeId],
        workload_id: &str,
        cluster: &Cluster,
        cancel: &CancellationToken,
    ) -> Result<LaunchResult, ReconcileError> {
        if gap.is_empty() {
            debug!(workload = %workload_id, "no gap, nothing to launch");
            return Ok(LaunchResult::default());
        }

        if !cluster.status.accepts_launches() {
            return Err(ReconcileError::ClusterNotActive {
                cluster: cluster.name.clone(),
                status: cluster.status,
            });
        }

        let mut result = LaunchResult::default();
        let batches: Vec<&[NodeId]> = gap.chunks(self.max_nodes_per_call).collect();
        let total = batches.len();

        info!(
            workload = %workload_id,
            cluster = %cluster.name,
            nodes = gap.len(),
            batches = total,
            "launching"
        );

        for (index, batch) in batches.into_iter().enumerate() {
            if cancel.is_cancelled() {
                // Everything from this batch onward was never issued.
                let unsent = &gap[index * self.max_nodes_per_call..];
                warn!(
                    workload = %workload_id,
                    batch = index + 1,
                    total,
                    unsent = unsent.len(),
                    "launch cancelled, marking remaining batches"
                );
                result.failed.extend(unsent.iter().map(|node| NodeFailure {
                    node: node.clone(),
                    reason: "cancelled".to_string(),
                    kind: FailureKind::Cancelled,
                }));
                break;
            }

            match self
                .api
                .start_workload(&cluster.id, workload_id, batch, &self.started_by)
                .await
            {
                Ok(outcome) => {
                    if !outcome.failures.is_empty() {
                        warn!(
                            workload = %workload_id,
                            batch = index + 1,
                            total,
                            rejected = outcome.failures.len(),
                            "batch partially rejected"
                        );
                    }
                    result.succeeded.extend(outcome.succeeded);
                    result.failed.extend(outcome.failures.into_iter().map(|f| NodeFailure {
                        node: f.node,
                        reason: f.reason,
                        kind: FailureKind::Rejected,
                    }));
                }
                Err(e) => {
                    // Batch-level failure: the call itself errored, so every
                    // node of this batch is unaccounted for. Later batches
                    // are independent and still run.
                    warn!(
                        workload = %workload_id,
                        batch = index + 1,
                        total,
                        error = %e,
                        "batch call failed"
                    );
                    result.failed.extend(batch.iter().map(|node| NodeFailure {
                        node: node.clone(),
                        reason: format!("transport: {e}"),
                        kind: FailureKind::Transport,
                    }));
                }
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use shepherd_core::{ClusterStatus, Node, NodeStatus};
    use shepherd_provider::{ProviderResult, SimControlPlane, StartOutcome};

    fn cluster(status: ClusterStatus, node_count: usize) -> Cluster {
        Cluster {
            id: "sim:cluster/prod".to_string(),
            name: "prod".to_string(),
            status,
            nodes: (1..=node_count)
                .map(|i| Node {
                    id: format!("node-{i}"),
                    status: NodeStatus::Connected,
                    workloads: Vec::new(),
                })
                .collect(),
        }
    }

    fn gap_of(n: usize) -> Vec<NodeId> {
        (1..=n).map(|i| format!("node-{i}")).collect()
    }

    #[tokio::test]
    async fn empty_gap_is_noop_regardless_of_status() {
        let plane = SimControlPlane::seeded("prod", 3);
        let launcher = Launcher::new(Arc::new(plane.clone()), 10, "shepd");
        let cluster = cluster(ClusterStatus::Provisioning, 3);

        let result = launcher
            .launch(&[], "agent", &cluster, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result, LaunchResult::default());
        assert!(plane.start_calls().await.is_empty());
    }

    #[tokio::test]
    async fn inactive_cluster_fails_without_calls() {
        let plane = SimControlPlane::seeded("prod", 3);
        let launcher = Launcher::new(Arc::new(plane.clone()), 10, "shepd");
        let cluster = cluster(ClusterStatus::Provisioning, 3);

        let err = launcher
            .launch(&gap_of(3), "agent", &cluster, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::ClusterNotActive { .. }));
        assert!(plane.start_calls().await.is_empty());
    }

    #[tokio::test]
    async fn oversized_gap_is_chunked_without_duplicates() {
        let plane = SimControlPlane::seeded("prod", 25);
        let launcher = Launcher::new(Arc::new(plane.clone()), 10, "shepd");
        let gap = gap_of(25);

        let result = launcher
            .launch(&gap, "agent", &cluster(ClusterStatus::Active, 25), &CancellationToken::new())
            .await
            .unwrap();

        let calls = plane.start_calls().await;
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].nodes.len(), 10);
        assert_eq!(calls[1].nodes.len(), 10);
        assert_eq!(calls[2].nodes.len(), 5);

        // Union of batches equals the gap, no node issued twice.
        let mut union: Vec<NodeId> = calls.iter().flat_map(|c| c.nodes.clone()).collect();
        assert_eq!(union.len(), 25);
        union.sort();
        union.dedup();
        assert_eq!(union.len(), 25);

        assert_eq!(result.succeeded.len(), 25);
        assert!(result.is_clean());
    }

    #[tokio::test]
    async fn per_node_rejections_are_aggregated() {
        let plane = SimControlPlane::seeded("prod", 3);
        plane.reject_node("node-3", "InsufficientResources").await;
        let launcher = Launcher::new(Arc::new(plane.clone()), 10, "shepd");

        let result = launcher
            .launch(
                &["node-2".to_string(), "node-3".to_string()],
                "agent",
                &cluster(ClusterStatus::Active, 3),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.succeeded, vec!["node-2".to_string()]);
        assert_eq!(
            result.failed,
            vec![NodeFailure {
                node: "node-3".to_string(),
                reason: "InsufficientResources".to_string(),
                kind: FailureKind::Rejected,
            }]
        );
    }

    #[tokio::test]
    async fn transport_error_fails_only_its_batch() {
        let plane = SimControlPlane::seeded("prod", 12);
        plane.fail_start_call(1).await; // second batch
        let launcher = Launcher::new(Arc::new(plane.clone()), 5, "shepd");
        let gap = gap_of(12);

        let result = launcher
            .launch(&gap, "agent", &cluster(ClusterStatus::Active, 12), &CancellationToken::new())
            .await
            .unwrap();

        // Batches 1 and 3 (5 + 2 nodes) succeeded; batch 2's 5 nodes failed.
        assert_eq!(plane.start_calls().await.len(), 3);
        assert_eq!(result.succeeded.len(), 7);
        assert_eq!(result.failed.len(), 5);
        assert!(result
            .failed
            .iter()
            .all(|f| f.kind == FailureKind::Transport));
        assert_eq!(result.failed[0].node, "node-6");
    }

    /// Launch API that fires the cancellation token while serving its
    /// first call.
    struct CancellingApi {
        inner: SimControlPlane,
        token: CancellationToken,
    }

    #[async_trait]
    impl TaskLaunchApi for CancellingApi {
        async fn start_workload(
            &self,
            cluster: &String,
            workload: &str,
            nodes: &[NodeId],
            started_by: &str,
        ) -> ProviderResult<StartOutcome> {
            self.token.cancel();
            self.inner
                .start_workload(cluster, workload, nodes, started_by)
                .await
        }
    }

    #[tokio::test]
    async fn cancellation_marks_unsent_batches_cancelled() {
        let plane = SimControlPlane::seeded("prod", 10);
        let token = CancellationToken::new();
        let api = CancellingApi {
            inner: plane.clone(),
            token: token.clone(),
        };
        let launcher = Launcher::new(Arc::new(api), 5, "shepd");
        let gap = gap_of(10);

        let result = launcher
            .launch(&gap, "agent", &cluster(ClusterStatus::Active, 10), &token)
            .await
            .unwrap();

        // First batch was in flight when the token fired and completed
        // normally; the second was never issued.
        assert_eq!(plane.start_calls().await.len(), 1);
        assert_eq!(result.succeeded.len(), 5);
        assert_eq!(result.failed.len(), 5);
        assert!(result
            .failed
            .iter()
            .all(|f| f.kind == FailureKind::Cancelled && f.reason == "cancelled"));
        assert_eq!(result.failed[0].node, "node-6");
    }

    #[tokio::test]
    async fn already_cancelled_issues_nothing() {
        let plane = SimControlPlane::seeded("prod", 3);
        let launcher = Launcher::new(Arc::new(plane.clone()), 10, "shepd");
        let token = CancellationToken::new();
        token.cancel();

        let result = launcher
            .launch(&gap_of(3), "agent", &cluster(ClusterStatus::Active, 3), &token)
            .await
            .unwrap();

        assert!(plane.start_calls().await.is_empty());
        assert_eq!(result.failed.len(), 3);
        assert!(result.failed.iter().all(|f| f.kind == FailureKind::Cancelled));
    }
}
