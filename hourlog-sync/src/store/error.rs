use thiserror::Error;

use super::MAX_BATCH_OPS;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("batch of {0} writes exceeds the {MAX_BATCH_OPS}-op limit")]
    BatchTooLarge(usize),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
