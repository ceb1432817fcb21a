use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{DocumentId, UserId};

/// A cross-user supervisor directory entry.
///
/// Lives in a shared top-level collection; the per-user flow only
/// reads it as a lookup table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supervisor {
    #[serde(default)]
    pub id: DocumentId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    pub added_by: UserId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
