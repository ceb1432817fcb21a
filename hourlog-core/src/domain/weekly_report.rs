use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use super::{DailyLog, DocumentId, UserId};

/// A Monday–Sunday reflection with a denormalized snapshot of the
/// week's daily logs.
///
/// At most one report exists per `(user_id, week_start)`; saving again
/// overwrites in place, preserving the original `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    #[serde(default)]
    pub id: DocumentId,
    pub user_id: UserId,
    pub week_start: Date,
    pub week_end: Date,
    pub reflection: String,
    #[serde(default)]
    pub logs: Vec<DailyLog>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
