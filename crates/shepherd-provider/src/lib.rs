//! shepherd-provider — the boundary with the remote control plane.
//!
//! The reconciliation core never talks to a concrete control plane
//! directly. It sees two traits:
//!
//! - [`ClusterStateProvider`] — read-only cluster/node/workload listings,
//!   consumed by the state cache during refresh.
//! - [`TaskLaunchApi`] — the start-workload call, consumed by the
//!   launcher. Callers must chunk node lists; control planes cap the
//!   number of nodes accepted per call.
//!
//! [`SimControlPlane`] implements both against in-memory state and backs
//! the test suites and local `--provider sim` runs. A real client
//! (AWS/GCP/whatever the deployment targets) plugs in behind the same
//! traits.

pub mod error;
pub mod sim;
pub mod traits;

pub use error::{ProviderError, ProviderResult};
pub use sim::SimControlPlane;
pub use traits::{
    ClusterDescription, ClusterStateProvider, NodeDescription, StartFailure, StartOutcome,
    TaskLaunchApi,
};
