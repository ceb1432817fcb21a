use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::{Date, OffsetDateTime};

use super::{DocumentId, UserId, ValidationError};

/// The fixed set of activity tags a daily log can carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum ActivityType {
    Technical,
    Administrative,
    Meeting,
    #[serde(rename = "Field Work")]
    #[strum(serialize = "Field Work")]
    FieldWork,
    Coding,
    Documentation,
    Research,
    Training,
    Presentation,
    Other,
}

/// One day's worth of logged work.
///
/// `entry_date` is date-only; `daily_hours` is expected to land in
/// 0.5–12 by the UI but storage only enforces non-negativity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    #[serde(default)]
    pub id: DocumentId,
    pub user_id: UserId,
    pub entry_date: Date,
    pub activity_types: Vec<ActivityType>,
    pub task_description: String,
    pub supervisor: String,
    pub daily_hours: f64,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl DailyLog {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.activity_types.is_empty() {
            return Err(ValidationError::EmptyActivityTypes);
        }
        if !self.daily_hours.is_finite() {
            return Err(ValidationError::NonFiniteHours);
        }
        if self.daily_hours < 0.0 {
            return Err(ValidationError::NegativeHours(self.daily_hours));
        }
        Ok(())
    }
}
