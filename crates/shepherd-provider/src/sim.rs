//! Simulated control plane.
//!
//! An in-memory implementation of both boundary traits, used by the test
//! suites and by `shepd --provider sim` for local runs. Failures are
//! scriptable: individual refresh stages can be made to error, specific
//! start calls can fail at the transport level, and individual nodes can
//! be set to reject launches with a given reason.
//!
//! Successful starts are applied to the simulated state, so repeated
//! reconciliation passes converge the same way they would against a real
//! control plane.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use shepherd_core::{ClusterId, ClusterStatus, NodeId, NodeStatus, WorkloadInstance};

use crate::error::{ProviderError, ProviderResult};
use crate::traits::{
    ClusterDescription, ClusterStateProvider, NodeDescription, StartFailure, StartOutcome,
    TaskLaunchApi,
};

/// One recorded start-workload call, for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct StartCall {
    pub cluster: ClusterId,
    pub workload: String,
    pub nodes: Vec<NodeId>,
    pub started_by: String,
}

#[derive(Debug, Default)]
struct SimState {
    cluster: Option<ClusterDescription>,
    nodes: Vec<NodeDescription>,
    running: HashMap<NodeId, Vec<WorkloadInstance>>,
    /// Nodes that reject launches, with the rejection reason.
    reject: HashMap<NodeId, String>,
    fail_cluster_fetch: bool,
    fail_node_fetch: bool,
    fail_instance_fetch: bool,
    /// Zero-based indices of start calls that fail at the transport level.
    fail_start_calls: HashSet<usize>,
    start_calls: Vec<StartCall>,
    next_instance: u64,
}

/// In-memory control plane serving one cluster.
#[derive(Clone, Default)]
pub struct SimControlPlane {
    inner: Arc<Mutex<SimState>>,
}

impl SimControlPlane {
    /// Create a simulated control plane hosting an active cluster with no
    /// nodes.
    pub fn new(cluster_name: &str) -> Self {
        let state = SimState {
            cluster: Some(ClusterDescription {
                id: format!("sim:cluster/{cluster_name}"),
                name: cluster_name.to_string(),
                status: ClusterStatus::Active,
            }),
            ..SimState::default()
        };
        SimControlPlane {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Create a cluster pre-populated with `node_count` empty nodes
    /// ("node-1".."node-N").
    pub fn seeded(cluster_name: &str, node_count: usize) -> Self {
        let state = SimState {
            cluster: Some(ClusterDescription {
                id: format!("sim:cluster/{cluster_name}"),
                name: cluster_name.to_string(),
                status: ClusterStatus::Active,
            }),
            nodes: (1..=node_count)
                .map(|i| NodeDescription {
                    id: format!("node-{i}"),
                    status: NodeStatus::Connected,
                })
                .collect(),
            ..SimState::default()
        };
        SimControlPlane {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub async fn set_cluster_status(&self, status: ClusterStatus) {
        let mut state = self.inner.lock().await;
        if let Some(cluster) = state.cluster.as_mut() {
            cluster.status = status;
        }
    }

    pub async fn add_node(&self, id: &str) {
        let mut state = self.inner.lock().await;
        state.nodes.push(NodeDescription {
            id: id.to_string(),
            status: NodeStatus::Connected,
        });
    }

    /// Record a workload instance as already running on a node.
    pub async fn run_instance(&self, node: &str, definition: &str) {
        let mut state = self.inner.lock().await;
        state.next_instance += 1;
        let instance = WorkloadInstance {
            id: format!("sim:task/{}", state.next_instance),
            definition: definition.to_string(),
        };
        state.running.entry(node.to_string()).or_default().push(instance);
    }

    /// Make a node reject future launches with the given reason.
    pub async fn reject_node(&self, node: &str, reason: &str) {
        let mut state = self.inner.lock().await;
        state.reject.insert(node.to_string(), reason.to_string());
    }

    /// Fail the Nth start call (zero-based) at the transport level.
    pub async fn fail_start_call(&self, index: usize) {
        let mut state = self.inner.lock().await;
        state.fail_start_calls.insert(index);
    }

    pub async fn fail_cluster_fetch(&self, fail: bool) {
        self.inner.lock().await.fail_cluster_fetch = fail;
    }

    pub async fn fail_node_fetch(&self, fail: bool) {
        self.inner.lock().await.fail_node_fetch = fail;
    }

    pub async fn fail_instance_fetch(&self, fail: bool) {
        self.inner.lock().await.fail_instance_fetch = fail;
    }

    /// All start calls issued so far, in order.
    pub async fn start_calls(&self) -> Vec<StartCall> {
        self.inner.lock().await.start_calls.clone()
    }

    /// Workload instances currently running on a node.
    pub async fn instances_on(&self, node: &str) -> Vec<WorkloadInstance> {
        self.inner
            .lock()
            .await
            .running
            .get(node)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ClusterStateProvider for SimControlPlane {
    async fn describe_cluster(&self, cluster: &str) -> ProviderResult<ClusterDescription> {
        let state = self.inner.lock().await;
        if state.fail_cluster_fetch {
            return Err(ProviderError::Unavailable(
                "simulated cluster fetch failure".to_string(),
            ));
        }
        match &state.cluster {
            Some(desc) if desc.name == cluster || desc.id == cluster => Ok(desc.clone()),
            _ => Err(ProviderError::UnknownCluster(cluster.to_string())),
        }
    }

    async fn list_nodes(&self, _cluster: &str) -> ProviderResult<Vec<NodeDescription>> {
        let state = self.inner.lock().await;
        if state.fail_node_fetch {
            return Err(ProviderError::Unavailable(
                "simulated node fetch failure".to_string(),
            ));
        }
        Ok(state.nodes.clone())
    }

    async fn list_workload_instances(
        &self,
        _cluster: &str,
    ) -> ProviderResult<HashMap<NodeId, Vec<WorkloadInstance>>> {
        let state = self.inner.lock().await;
        if state.fail_instance_fetch {
            return Err(ProviderError::Unavailable(
                "simulated instance fetch failure".to_string(),
            ));
        }
        Ok(state.running.clone())
    }
}

#[async_trait]
impl TaskLaunchApi for SimControlPlane {
    async fn start_workload(
        &self,
        cluster: &ClusterId,
        workload: &str,
        nodes: &[NodeId],
        started_by: &str,
    ) -> ProviderResult<StartOutcome> {
        let mut state = self.inner.lock().await;
        let call_index = state.start_calls.len();
        state.start_calls.push(StartCall {
            cluster: cluster.clone(),
            workload: workload.to_string(),
            nodes: nodes.to_vec(),
            started_by: started_by.to_string(),
        });

        if state.fail_start_calls.contains(&call_index) {
            debug!(call_index, "simulating transport failure");
            return Err(ProviderError::Unavailable(
                "simulated start transport failure".to_string(),
            ));
        }

        let mut outcome = StartOutcome::default();
        for node in nodes {
            if !state.nodes.iter().any(|n| &n.id == node) {
                outcome.failures.push(StartFailure {
                    node: node.clone(),
                    reason: "NodeMissing".to_string(),
                });
                continue;
            }
            if let Some(reason) = state.reject.get(node) {
                outcome.failures.push(StartFailure {
                    node: node.clone(),
                    reason: reason.clone(),
                });
                continue;
            }
            state.next_instance += 1;
            let instance = WorkloadInstance {
                id: format!("sim:task/{}", state.next_instance),
                definition: workload.to_string(),
            };
            state.running.entry(node.clone()).or_default().push(instance);
            outcome.succeeded.push(node.clone());
        }
        Ok(outcome)
    }
}
