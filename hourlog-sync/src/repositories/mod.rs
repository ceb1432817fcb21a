mod log_repo;
mod notification_repo;
mod repo_error;
mod report_repo;
mod supervisor_repo;
mod user_repo;

pub use log_repo::*;
pub use notification_repo::*;
pub use repo_error::{NonFatalError, RepositoryError};
pub use report_repo::*;
pub use supervisor_repo::*;
pub use user_repo::*;

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use hourlog_core::domain::DocumentId;

use crate::store::StoreError;

pub(crate) fn fresh_document_id() -> DocumentId {
    DocumentId::new(Uuid::new_v4().to_string())
}

/// Application-level ISO timestamp for merge writes, matching the
/// RFC 3339 representation the entities serialize with.
pub(crate) fn iso_value(ts: OffsetDateTime) -> Value {
    Value::String(ts.format(&Rfc3339).unwrap_or_default())
}

/// Single-document mutations surface a missing target as
/// [`RepositoryError::NotFound`] rather than a raw store error.
pub(crate) fn not_found_as(err: StoreError, what: impl Into<String>) -> RepositoryError {
    match err {
        StoreError::NotFound(_) => RepositoryError::NotFound(what.into()),
        other => other.into(),
    }
}
