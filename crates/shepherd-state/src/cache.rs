//! State cache — replace-on-write cluster snapshots.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use shepherd_core::{Cluster, Node, epoch_secs};
use shepherd_provider::{ClusterStateProvider, ProviderError, ProviderResult};

/// An immutable point-in-time view of the cluster.
///
/// Gaps computed from a snapshot are only valid against that snapshot; a
/// stale snapshot may under- or over-report. The periodic tick bounds the
/// staleness window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSnapshot {
    pub cluster: Cluster,
    /// Unix timestamp (seconds) when the fetch sequence completed.
    pub fetched_at: u64,
}

/// Holds the last-known cluster snapshot, refreshed on demand.
///
/// The snapshot is shared, append-free, replace-on-write state: readers
/// always get a consistent `Arc<ClusterSnapshot>`, and a refresh swaps
/// the whole thing in only after every fetch succeeded. Overlapping
/// refreshes are serialized by a mutex, so at most one fetch sequence is
/// in flight at a time.
pub struct StateCache {
    cluster_name: String,
    provider: Arc<dyn ClusterStateProvider>,
    snapshot: RwLock<Option<Arc<ClusterSnapshot>>>,
    /// Serializes fetch sequences.
    refresh_lock: Mutex<()>,
}

impl StateCache {
    pub fn new(cluster_name: &str, provider: Arc<dyn ClusterStateProvider>) -> Self {
        StateCache {
            cluster_name: cluster_name.to_string(),
            provider,
            snapshot: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Fetch cluster, nodes, then workload instances, and atomically
    /// replace the snapshot.
    ///
    /// The fetch order matters: instance listings are keyed by the node
    /// identities resolved in the same sequence. Any fetch failing leaves
    /// the previous snapshot untouched and surfaces the provider error.
    pub async fn refresh(&self) -> ProviderResult<()> {
        let _guard = self.refresh_lock.lock().await;
        self.fetch_and_swap().await
    }

    /// Like [`refresh`](Self::refresh), but skips instead of waiting when
    /// another refresh is already in flight. Returns `false` on skip.
    pub async fn try_refresh(&self) -> ProviderResult<bool> {
        let Ok(_guard) = self.refresh_lock.try_lock() else {
            debug!("refresh already in flight, skipping");
            return Ok(false);
        };
        self.fetch_and_swap().await?;
        Ok(true)
    }

    async fn fetch_and_swap(&self) -> Result<(), ProviderError> {
        let desc = self.provider.describe_cluster(&self.cluster_name).await?;
        let node_descs = self.provider.list_nodes(&self.cluster_name).await?;
        let mut instances = self
            .provider
            .list_workload_instances(&self.cluster_name)
            .await?;

        let nodes: Vec<Node> = node_descs
            .into_iter()
            .map(|n| {
                let workloads = instances.remove(&n.id).unwrap_or_default();
                Node {
                    id: n.id,
                    status: n.status,
                    workloads,
                }
            })
            .collect();

        let snapshot = Arc::new(ClusterSnapshot {
            cluster: Cluster {
                id: desc.id,
                name: desc.name,
                status: desc.status,
                nodes,
            },
            fetched_at: epoch_secs(),
        });

        let node_count = snapshot.cluster.nodes.len();
        *self.snapshot.write().await = Some(snapshot);
        info!(cluster = %self.cluster_name, nodes = node_count, "snapshot refreshed");
        Ok(())
    }

    /// The current snapshot, if at least one refresh has succeeded.
    pub async fn snapshot(&self) -> Option<Arc<ClusterSnapshot>> {
        self.snapshot.read().await.clone()
    }

    /// Look up the cached cluster by name.
    pub async fn find_cluster(&self, name: &str) -> Option<Cluster> {
        let snapshot = self.snapshot.read().await;
        snapshot
            .as_ref()
            .filter(|s| s.cluster.name == name)
            .map(|s| s.cluster.clone())
    }

    /// Name of the cluster this cache tracks.
    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }
}
