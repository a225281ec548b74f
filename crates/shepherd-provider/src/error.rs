//! Provider error types.

use thiserror::Error;

/// Errors surfaced by a control-plane provider.
///
/// Provider errors are recoverable-but-reported: a failed refresh leaves
/// the previous snapshot intact, a failed launch call fails only its own
/// batch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("control plane unavailable: {0}")]
    Unavailable(String),

    #[error("malformed control plane response: {0}")]
    Malformed(String),

    #[error("unknown cluster: {0}")]
    UnknownCluster(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;
