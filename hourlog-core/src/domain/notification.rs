use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;

use super::{DocumentId, UserId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    Reminder,
    System,
    Achievement,
    ReportDue,
}

/// A per-user notification; only the `read` flag is ever mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default)]
    pub id: DocumentId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_snake_case() {
        let json = serde_json::to_string(&NotificationKind::ReportDue).unwrap();
        assert_eq!(json, "\"report_due\"");
        let back: NotificationKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, NotificationKind::ReportDue);
    }
}
