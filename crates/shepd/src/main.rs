//! shepd — the Shepherd daemon.
//!
//! Single binary that assembles the reconciliation engine:
//! - State cache (replace-on-write cluster snapshots)
//! - Reconcile driver (gap detection + batched launches)
//! - Ticker (periodic refresh + reconcile)
//! - Submission worker (one-shot reconciles from the control surface)
//! - Control surface (axum)
//!
//! # Usage
//!
//! ```text
//! shepd --cluster prod --region us-west-1 --task log-shipper
//! shepd --cluster prod --region us-west-1 --task log-shipper serve --port 7777
//! ```
//!
//! The default action runs a single refresh + reconcile pass and exits;
//! `serve` keeps reconciling on an interval and exposes the HTTP control
//! surface.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use shepherd_core::Config;
use shepherd_provider::SimControlPlane;
use shepherd_reconcile::{Launcher, ReconcileDriver, Ticker, WorkloadRegistry};
use shepherd_state::StateCache;

#[derive(Parser)]
#[command(name = "shepd", about = "Keeps daemon workloads present on every cluster node")]
struct Cli {
    /// Name of the target cluster.
    #[arg(long)]
    cluster: Option<String>,

    /// Provider region or endpoint.
    #[arg(long)]
    region: Option<String>,

    /// Path to a shepherd.toml config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Daemon workload identifier to manage (repeatable).
    #[arg(long = "task")]
    tasks: Vec<String>,

    /// Maximum nodes per start-workload call.
    #[arg(long)]
    max_nodes_per_call: Option<usize>,

    /// Originator tag stamped on launch calls.
    #[arg(long)]
    started_by: Option<String>,

    /// Control-plane provider. Only "sim" ships with this binary; real
    /// clients plug in behind the provider traits.
    #[arg(long, default_value = "sim")]
    provider: String,

    /// Node count for the simulated control plane.
    #[arg(long, default_value = "3")]
    sim_nodes: usize,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP control surface and the periodic reconciler.
    Serve {
        /// Port for the control surface.
        #[arg(long)]
        port: Option<u16>,

        /// Refresh/reconcile interval in minutes (minimum 1).
        #[arg(long)]
        interval_minutes: Option<u64>,

        /// Only refresh the snapshot on each tick; never launch.
        #[arg(long)]
        refresh_only: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,shepd=debug,shepherd=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(cluster) = &cli.cluster {
        config.cluster = cluster.clone();
    }
    if let Some(region) = &cli.region {
        config.region = region.clone();
    }
    if !cli.tasks.is_empty() {
        config.tasks = cli.tasks.clone();
    }
    if let Some(cap) = cli.max_nodes_per_call {
        config.max_nodes_per_call = cap;
    }
    if let Some(started_by) = &cli.started_by {
        config.started_by = started_by.clone();
    }

    if cli.provider != "sim" {
        anyhow::bail!("unknown provider {:?} (only \"sim\" is built in)", cli.provider);
    }

    match cli.command {
        None => {
            config.validate()?;
            run_once(config, cli.sim_nodes).await
        }
        Some(Command::Serve {
            port,
            interval_minutes,
            refresh_only,
        }) => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(minutes) = interval_minutes {
                config.interval_minutes = minutes;
            }
            if refresh_only {
                config.reconcile_on_tick = false;
            }
            config.validate()?;
            run_serve(config, cli.sim_nodes).await
        }
    }
}

fn wire_core(config: &Config, sim_nodes: usize) -> (Arc<StateCache>, Arc<ReconcileDriver>) {
    let plane = SimControlPlane::seeded(&config.cluster, sim_nodes);
    let cache = Arc::new(StateCache::new(&config.cluster, Arc::new(plane.clone())));
    let launcher = Launcher::new(
        Arc::new(plane),
        config.max_nodes_per_call,
        &config.started_by,
    );
    let driver = Arc::new(ReconcileDriver::new(cache.clone(), launcher));
    (cache, driver)
}

/// One refresh + one reconcile pass over the configured workloads.
async fn run_once(config: Config, sim_nodes: usize) -> anyhow::Result<()> {
    if config.tasks.is_empty() {
        anyhow::bail!("no tasks configured (set `tasks` or --task)");
    }

    info!(cluster = %config.cluster, tasks = config.tasks.len(), "one-shot reconcile");

    let (_cache, driver) = wire_core(&config, sim_nodes);
    let cancel = CancellationToken::new();
    let outcomes = driver.refresh_and_reconcile(&config.tasks, &cancel).await;

    let mut any_ok = false;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(launch) => {
                any_ok = true;
                info!(
                    workload = %outcome.workload_id,
                    launched = launch.succeeded.len(),
                    failed = launch.failed.len(),
                    "reconciled"
                );
            }
            Err(e) => warn!(workload = %outcome.workload_id, error = %e, "reconcile failed"),
        }
    }

    if !any_ok {
        anyhow::bail!("every workload failed to reconcile");
    }
    Ok(())
}

/// Periodic reconciler + control surface.
async fn run_serve(config: Config, sim_nodes: usize) -> anyhow::Result<()> {
    info!(cluster = %config.cluster, port = config.port, "shepd starting");

    let (cache, driver) = wire_core(&config, sim_nodes);
    let registry = Arc::new(WorkloadRegistry::new(&config.tasks));
    info!(tasks = config.tasks.len(), "workload registry initialized");

    let ticker = Arc::new(Ticker::new(
        cache.clone(),
        driver.clone(),
        registry.clone(),
        Duration::from_secs(config.interval_minutes * 60),
        config.reconcile_on_tick,
    ));

    // ── Shutdown wiring ────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let cancel = CancellationToken::new();

    // ── Background tasks ───────────────────────────────────────
    let ticker_handle = {
        let ticker = ticker.clone();
        let shutdown = shutdown_rx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            ticker.run(shutdown, cancel).await;
        })
    };

    let (submit_tx, submit_rx) = mpsc::channel(32);
    let worker_handle = tokio::spawn(shepherd_reconcile::run_submission_worker(
        driver.clone(),
        registry.clone(),
        submit_rx,
        cancel.clone(),
    ));

    // ── Control surface ────────────────────────────────────────
    let router = shepherd_api::build_router(shepherd_api::ApiState {
        cache,
        registry,
        submissions: submit_tx,
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "control surface starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("failed to install CTRL+C handler, shutting down");
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
        cancel.cancel();
    });

    server.await?;

    let _ = ticker_handle.await;
    let _ = worker_handle.await;

    info!("shepd stopped");
    Ok(())
}
