//! shepherd-state — the last-known cluster snapshot.
//!
//! [`StateCache`] owns the one piece of shared state in the system: an
//! immutable [`ClusterSnapshot`] behind an `Arc`, replaced wholesale on
//! each successful refresh. Readers (gap detection, the control surface)
//! always see a fully formed snapshot; a failed refresh leaves the
//! previous one intact.

pub mod cache;

pub use cache::{ClusterSnapshot, StateCache};
