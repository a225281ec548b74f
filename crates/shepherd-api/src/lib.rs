//! shepherd-api — HTTP control surface.
//!
//! A thin request/response shim over the reconciliation core. Launches
//! are asynchronous and best-effort: submission endpoints always reply
//! 2xx, and failures are visible only through the inspection endpoints
//! or logs.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/cluster` | Current cluster snapshot |
//! | GET | `/daemons` | Managed workloads + last reconcile outcomes |
//! | POST | `/daemons` | Register a workload, enqueue a one-shot reconcile (202) |
//! | DELETE | `/daemons/{id}` | Remove a workload from the managed set |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::sync::mpsc;

use shepherd_core::WorkloadId;
use shepherd_reconcile::WorkloadRegistry;
use shepherd_state::StateCache;

/// Shared state for the control surface handlers.
#[derive(Clone)]
pub struct ApiState {
    pub cache: Arc<StateCache>,
    pub registry: Arc<WorkloadRegistry>,
    /// One-shot reconcile queue, drained by the submission worker.
    pub submissions: mpsc::Sender<WorkloadId>,
}

/// Build the control-surface router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/cluster", get(handlers::get_cluster))
        .route(
            "/daemons",
            get(handlers::list_daemons).post(handlers::submit_daemon),
        )
        .route("/daemons/{id}", axum::routing::delete(handlers::delete_daemon))
        .with_state(state)
}
