//! shepherd-reconcile — the reconciliation engine.
//!
//! One reconciliation pass, for each configured workload:
//!
//! ```text
//! StateCache snapshot
//!   └── compute_gap(nodes, workload)      which nodes lack it
//!         └── Launcher::launch(gap, ...)  batched start calls
//!               └── WorkloadOutcome       per-node success/failure
//! ```
//!
//! The [`Ticker`] drives refresh + reconcile on a fixed interval; the
//! [`WorkloadRegistry`] holds the managed daemon set and the last outcome
//! per workload; [`run_submission_worker`] services one-shot submissions
//! from the control surface.
//!
//! Failure semantics: per-workload outcomes are independent, per-batch
//! launch calls are independent, and nothing in here ever terminates the
//! process. The only retry mechanism is the next periodic pass.

pub mod driver;
pub mod error;
pub mod gap;
pub mod launcher;
pub mod registry;
pub mod submit;
pub mod ticker;

pub use driver::{ReconcileDriver, WorkloadOutcome};
pub use error::ReconcileError;
pub use gap::compute_gap;
pub use launcher::{FailureKind, LaunchResult, Launcher, NodeFailure};
pub use registry::{DaemonStatus, OutcomeRecord, WorkloadRegistry};
pub use submit::run_submission_worker;
pub use ticker::Ticker;
