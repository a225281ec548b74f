//! Reconcile driver — one pass over the configured workloads.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use shepherd_core::WorkloadId;
use shepherd_state::StateCache;

use crate::error::ReconcileError;
use crate::gap::compute_gap;
use crate::launcher::{LaunchResult, Launcher};

/// Outcome of reconciling one workload.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadOutcome {
    pub workload_id: WorkloadId,
    pub result: Result<LaunchResult, ReconcileError>,
}

/// Ties the state cache, gap detection, and launcher into one
/// reconciliation pass.
///
/// Workloads are independent: one workload's failure (cluster missing,
/// cluster inactive, launch errors) is recorded in its own outcome and
/// the pass continues with the rest. The cluster is looked up once per
/// pass, from one snapshot, so every gap in a pass is computed against
/// the same view of the cluster.
pub struct ReconcileDriver {
    cache: Arc<StateCache>,
    launcher: Launcher,
}

impl ReconcileDriver {
    pub fn new(cache: Arc<StateCache>, launcher: Launcher) -> Self {
        ReconcileDriver { cache, launcher }
    }

    /// Run one reconciliation pass, returning one outcome per workload in
    /// input order.
    pub async fn reconcile(
        &self,
        workload_ids: &[WorkloadId],
        cancel: &CancellationToken,
    ) -> Vec<WorkloadOutcome> {
        let cluster_name = self.cache.cluster_name().to_string();
        let cluster = self.cache.find_cluster(&cluster_name).await;

        let mut outcomes = Vec::with_capacity(workload_ids.len());
        for workload_id in workload_ids {
            if cancel.is_cancelled() {
                outcomes.push(WorkloadOutcome {
                    workload_id: workload_id.clone(),
                    result: Err(ReconcileError::Cancelled),
                });
                continue;
            }

            let result = match &cluster {
                None => Err(ReconcileError::ClusterNotFound(cluster_name.clone())),
                Some(cluster) => {
                    let gap = compute_gap(&cluster.nodes, workload_id);
                    debug!(
                        workload = %workload_id,
                        cluster = %cluster.name,
                        gap = gap.len(),
                        "gap computed"
                    );
                    self.launcher.launch(&gap, workload_id, cluster, cancel).await
                }
            };

            match &result {
                Ok(launch) => info!(
                    workload = %workload_id,
                    launched = launch.succeeded.len(),
                    failed = launch.failed.len(),
                    "workload reconciled"
                ),
                Err(e) => warn!(workload = %workload_id, error = %e, "workload reconcile failed"),
            }

            outcomes.push(WorkloadOutcome {
                workload_id: workload_id.clone(),
                result,
            });
        }
        outcomes
    }

    /// Refresh the snapshot, then reconcile.
    ///
    /// Used by one-shot submissions so a workload registered after the
    /// last tick still sees current cluster state. A refresh failure is
    /// recorded as `ProviderUnavailable` on every requested workload.
    pub async fn refresh_and_reconcile(
        &self,
        workload_ids: &[WorkloadId],
        cancel: &CancellationToken,
    ) -> Vec<WorkloadOutcome> {
        if let Err(e) = self.cache.refresh().await {
            warn!(error = %e, "refresh failed, skipping reconcile");
            return workload_ids
                .iter()
                .map(|id| WorkloadOutcome {
                    workload_id: id.clone(),
                    result: Err(ReconcileError::ProviderUnavailable(e.clone())),
                })
                .collect();
        }
        self.reconcile(workload_ids, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use shepherd_core::ClusterStatus;
    use shepherd_provider::SimControlPlane;

    use crate::launcher::FailureKind;

    fn driver_for(plane: &SimControlPlane, max_per_call: usize) -> ReconcileDriver {
        let cache = Arc::new(StateCache::new("prod", Arc::new(plane.clone())));
        let launcher = Launcher::new(Arc::new(plane.clone()), max_per_call, "shepd");
        ReconcileDriver::new(cache, launcher)
    }

    #[tokio::test]
    async fn prod_scenario_partial_failure() {
        // Cluster "prod", 3 nodes; node-1 runs agent:v3, nodes 2 and 3 run
        // nothing; node-3 rejects with InsufficientResources.
        let plane = SimControlPlane::seeded("prod", 3);
        plane.run_instance("node-1", "agent:v3").await;
        plane.reject_node("node-3", "InsufficientResources").await;

        let driver = driver_for(&plane, 10);
        let outcomes = driver
            .refresh_and_reconcile(&["agent".to_string()], &CancellationToken::new())
            .await;

        assert_eq!(outcomes.len(), 1);
        let result = outcomes[0].result.as_ref().unwrap();
        assert_eq!(result.succeeded, vec!["node-2".to_string()]);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].node, "node-3");
        assert_eq!(result.failed[0].reason, "InsufficientResources");

        // The launch named exactly the gap.
        let calls = plane.start_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].nodes, vec!["node-2".to_string(), "node-3".to_string()]);
        assert_eq!(calls[0].workload, "agent");
    }

    #[tokio::test]
    async fn provisioning_cluster_rejected_without_calls() {
        let plane = SimControlPlane::seeded("prod", 3);
        plane.set_cluster_status(ClusterStatus::Provisioning).await;

        let driver = driver_for(&plane, 10);
        let outcomes = driver
            .refresh_and_reconcile(&["agent".to_string()], &CancellationToken::new())
            .await;

        assert!(matches!(
            outcomes[0].result,
            Err(ReconcileError::ClusterNotActive { .. })
        ));
        assert!(plane.start_calls().await.is_empty());
    }

    #[tokio::test]
    async fn workloads_are_reconciled_independently() {
        let plane = SimControlPlane::seeded("prod", 2);
        // First workload's single batch fails at the transport level; the
        // second workload's launch is unaffected.
        plane.fail_start_call(0).await;

        let driver = driver_for(&plane, 10);
        let outcomes = driver
            .refresh_and_reconcile(
                &["agent".to_string(), "log-shipper".to_string()],
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].workload_id, "agent");
        let first = outcomes[0].result.as_ref().unwrap();
        assert!(first.succeeded.is_empty());
        assert!(first.failed.iter().all(|f| f.kind == FailureKind::Transport));

        let second = outcomes[1].result.as_ref().unwrap();
        assert_eq!(second.succeeded.len(), 2);
        assert!(second.is_clean());
    }

    #[tokio::test]
    async fn missing_snapshot_reports_cluster_not_found() {
        let plane = SimControlPlane::seeded("prod", 2);
        let driver = driver_for(&plane, 10);

        // No refresh has happened; the cache has no snapshot.
        let outcomes = driver
            .reconcile(&["agent".to_string()], &CancellationToken::new())
            .await;
        assert!(matches!(
            outcomes[0].result,
            Err(ReconcileError::ClusterNotFound(_))
        ));
    }

    #[tokio::test]
    async fn refresh_failure_marks_all_workloads() {
        let plane = SimControlPlane::seeded("prod", 2);
        plane.fail_cluster_fetch(true).await;

        let driver = driver_for(&plane, 10);
        let outcomes = driver
            .refresh_and_reconcile(
                &["agent".to_string(), "log-shipper".to_string()],
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(outcomes.len(), 2);
        for outcome in &outcomes {
            assert!(matches!(
                outcome.result,
                Err(ReconcileError::ProviderUnavailable(_))
            ));
        }
        assert!(plane.start_calls().await.is_empty());
    }

    #[tokio::test]
    async fn covered_cluster_is_a_clean_noop() {
        let plane = SimControlPlane::seeded("prod", 2);
        plane.run_instance("node-1", "agent:v3").await;
        plane.run_instance("node-2", "agent:v3").await;

        let driver = driver_for(&plane, 10);
        let outcomes = driver
            .refresh_and_reconcile(&["agent".to_string()], &CancellationToken::new())
            .await;

        let result = outcomes[0].result.as_ref().unwrap();
        assert_eq!(result, &LaunchResult::default());
        assert!(plane.start_calls().await.is_empty());
    }

    #[tokio::test]
    async fn cancelled_pass_records_cancelled_outcomes() {
        let plane = SimControlPlane::seeded("prod", 2);
        let driver = driver_for(&plane, 10);
        driver.cache.refresh().await.unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let outcomes = driver
            .reconcile(&["agent".to_string(), "log-shipper".to_string()], &token)
            .await;

        assert_eq!(outcomes.len(), 2);
        for outcome in &outcomes {
            assert_eq!(outcome.result, Err(ReconcileError::Cancelled));
        }
        assert!(plane.start_calls().await.is_empty());
    }
}
