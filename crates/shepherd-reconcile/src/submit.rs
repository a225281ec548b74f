//! One-shot submission worker.
//!
//! The control surface replies 202 to `POST /daemons` before any launch
//! happens. The submission lands on an mpsc queue consumed here: each
//! submitted workload gets a refresh + single-workload reconcile, and the
//! outcome is recorded in the registry where `GET /daemons` can see it.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use shepherd_core::WorkloadId;

use crate::driver::ReconcileDriver;
use crate::registry::WorkloadRegistry;

/// Consume one-shot reconcile submissions until the queue closes or the
/// token fires.
pub async fn run_submission_worker(
    driver: Arc<ReconcileDriver>,
    registry: Arc<WorkloadRegistry>,
    mut submissions: mpsc::Receiver<WorkloadId>,
    cancel: CancellationToken,
) {
    info!("submission worker started");
    loop {
        let workload_id = tokio::select! {
            received = submissions.recv() => match received {
                Some(id) => id,
                None => break,
            },
            _ = cancel.cancelled() => break,
        };

        debug!(workload = %workload_id, "one-shot reconcile submitted");
        let outcomes = driver
            .refresh_and_reconcile(std::slice::from_ref(&workload_id), &cancel)
            .await;
        registry.record_outcomes(&outcomes).await;
    }
    info!("submission worker stopped");
}
