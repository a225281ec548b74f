//! Cluster domain model.
//!
//! These types mirror what the control plane reports: a cluster, its
//! registered nodes (container instances), and the workload instances
//! running on each node. They are plain data — the reconciliation core
//! never mutates a node in place, it only replaces whole snapshots.

use serde::{Deserialize, Serialize};

/// Control-plane identifier for a cluster (ARN or name).
pub type ClusterId = String;

/// Control-plane identifier for a node (container instance ARN).
pub type NodeId = String;

/// Identifier of a desired daemon workload, as supplied by the operator.
///
/// May be a bare family name ("log-shipper") or a fully versioned
/// identifier ("log-shipper:4" / a full ARN). Matching against running
/// instances is by substring containment, see `compute_gap`.
pub type WorkloadId = String;

/// Lifecycle status of a cluster as reported by the control plane.
///
/// Only `Active` clusters accept launch calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterStatus {
    Active,
    Provisioning,
    Deprovisioning,
    Inactive,
}

impl ClusterStatus {
    /// Whether the control plane will accept start-workload calls.
    pub fn accepts_launches(&self) -> bool {
        matches!(self, ClusterStatus::Active)
    }
}

/// Connectivity status of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    Connected,
    Disconnected,
}

/// A running workload record attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadInstance {
    /// Control-plane identifier of this running instance.
    pub id: String,
    /// The workload-definition identifier this instance was started from.
    /// Usually a fully versioned identifier, sometimes a bare family name.
    pub definition: String,
}

/// A cluster-managed compute unit capable of running workloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub status: NodeStatus,
    /// Workload instances currently running on this node.
    pub workloads: Vec<WorkloadInstance>,
}

/// A cluster and its full node inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    pub name: String,
    pub status: ClusterStatus,
    /// Nodes in control-plane listing order.
    pub nodes: Vec<Node>,
}
