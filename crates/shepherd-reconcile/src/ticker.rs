//! Ticker — the periodic refresh/reconcile driver.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use shepherd_state::StateCache;

use crate::driver::ReconcileDriver;
use crate::registry::WorkloadRegistry;

/// Fires a snapshot refresh (and, unless configured refresh-only, a full
/// reconciliation pass) on a fixed interval.
///
/// At most one pass is in flight: a tick that lands while the previous
/// pass is still running is skipped, not queued. Reconciliation errors
/// are logged and recorded in the registry; they never stop the loop.
pub struct Ticker {
    cache: Arc<StateCache>,
    driver: Arc<ReconcileDriver>,
    registry: Arc<WorkloadRegistry>,
    interval: Duration,
    reconcile_on_tick: bool,
    /// Overlap guard: held for the duration of one pass.
    pass_lock: Mutex<()>,
}

impl Ticker {
    pub fn new(
        cache: Arc<StateCache>,
        driver: Arc<ReconcileDriver>,
        registry: Arc<WorkloadRegistry>,
        interval: Duration,
        reconcile_on_tick: bool,
    ) -> Self {
        Ticker {
            cache,
            driver,
            registry,
            interval,
            reconcile_on_tick,
            pass_lock: Mutex::new(()),
        }
    }

    /// Run the periodic loop until the shutdown channel fires.
    ///
    /// The first pass runs immediately: readers of the snapshot (and the
    /// first reconcile) should not wait out a full interval after
    /// startup.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>, cancel: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            reconcile_on_tick = self.reconcile_on_tick,
            "ticker started"
        );

        self.tick(&cancel).await;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    self.tick(&cancel).await;
                }
                _ = shutdown.changed() => {
                    info!("ticker shutting down");
                    break;
                }
            }
        }
    }

    /// Run one tick: refresh, then (in the canonical mode) reconcile the
    /// registered workloads. Skips if the previous pass is still running.
    pub async fn tick(&self, cancel: &CancellationToken) {
        let Ok(_guard) = self.pass_lock.try_lock() else {
            debug!("previous pass still in flight, skipping tick");
            return;
        };

        match self.cache.try_refresh().await {
            Ok(true) => {}
            Ok(false) => {
                // Another refresh (e.g. a one-shot submission's) is mid-
                // sequence; its snapshot will be as fresh as ours.
                debug!("refresh already in flight elsewhere, skipping tick");
                return;
            }
            Err(e) => {
                warn!(error = %e, "snapshot refresh failed, keeping previous snapshot");
                return;
            }
        }

        if !self.reconcile_on_tick {
            return;
        }

        let workload_ids = self.registry.workload_ids().await;
        if workload_ids.is_empty() {
            debug!("no workloads registered, nothing to reconcile");
            return;
        }

        let outcomes = self.driver.reconcile(&workload_ids, cancel).await;
        let failed_workloads = outcomes.iter().filter(|o| o.result.is_err()).count();
        let launched: usize = outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|r| r.succeeded.len())
            .sum();
        info!(
            workloads = outcomes.len(),
            failed_workloads,
            launched,
            "reconciliation pass complete"
        );
        self.registry.record_outcomes(&outcomes).await;
    }
}
