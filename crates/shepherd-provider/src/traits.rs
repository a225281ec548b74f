//! Control-plane boundary traits.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use shepherd_core::{ClusterId, ClusterStatus, NodeId, NodeStatus, WorkloadInstance};

use crate::error::ProviderResult;

/// Cluster metadata as reported by the control plane, without the node
/// inventory (fetched separately).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterDescription {
    pub id: ClusterId,
    pub name: String,
    pub status: ClusterStatus,
}

/// Node metadata without its workload inventory (fetched separately).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescription {
    pub id: NodeId,
    pub status: NodeStatus,
}

/// Read-only view of cluster state, consumed by the state cache.
///
/// Refresh fetches in dependency order: cluster, then nodes, then the
/// workload instances keyed by the node identities just resolved.
#[async_trait]
pub trait ClusterStateProvider: Send + Sync {
    /// Describe a cluster by name or identifier.
    async fn describe_cluster(&self, cluster: &str) -> ProviderResult<ClusterDescription>;

    /// List the nodes registered in a cluster, in control-plane order.
    async fn list_nodes(&self, cluster: &str) -> ProviderResult<Vec<NodeDescription>>;

    /// List running workload instances, grouped by node.
    async fn list_workload_instances(
        &self,
        cluster: &str,
    ) -> ProviderResult<HashMap<NodeId, Vec<WorkloadInstance>>>;
}

/// Per-node rejection inside an otherwise successful start call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartFailure {
    pub node: NodeId,
    /// Provider-supplied reason, e.g. "InsufficientResources".
    pub reason: String,
}

/// Result of one start-workload call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartOutcome {
    pub succeeded: Vec<NodeId>,
    pub failures: Vec<StartFailure>,
}

/// The start-workload call, consumed by the launcher.
#[async_trait]
pub trait TaskLaunchApi: Send + Sync {
    /// Start `workload` on the given nodes of `cluster`.
    ///
    /// `nodes` must not exceed the control plane's per-call cap; the
    /// launcher chunks before calling. A transport-level `Err` means the
    /// call itself failed and says nothing about individual nodes;
    /// per-node rejections come back inside an `Ok` outcome.
    async fn start_workload(
        &self,
        cluster: &ClusterId,
        workload: &str,
        nodes: &[NodeId],
        started_by: &str,
    ) -> ProviderResult<StartOutcome>;
}
