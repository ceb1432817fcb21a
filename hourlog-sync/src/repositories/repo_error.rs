use thiserror::Error;

use hourlog_core::domain::ValidationError;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl RepositoryError {
    /// Whether the failure is a transient remote problem the caller
    /// may recover from locally.
    pub fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Store(StoreError::Unavailable(_)))
    }
}

/// A best-effort side effect that failed. Callers log it and move on;
/// it never aborts the primary operation it piggybacks on.
#[derive(Debug, Error)]
#[error("non-fatal: {0}")]
pub struct NonFatalError(pub String);
