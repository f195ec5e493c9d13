//! Typed error enum for the service layer.

use mountainwatch_storage::StorageError;
use thiserror::Error;

/// Service-layer error unifying store and collaborator failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage operation failed.
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// The condition source could not deliver a record or the candidate list.
    #[error("source: {0:#}")]
    Source(#[source] anyhow::Error),

    /// The action mode needs a transport that was not configured.
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// The upstream data contradicts what was asked for.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ServiceError {
    /// Whether this error is likely transient (worth retrying).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            _ => false,
        }
    }
}
