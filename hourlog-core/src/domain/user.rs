use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use super::{Email, UserId, ValidationError};

/// An OJT trainee profile.
///
/// `id` equals the authentication subject identifier and never changes;
/// exactly one profile exists per authenticated subject. Created at
/// signup completion, mutated by settings updates and by auto-appended
/// supervisor names, never hard-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub total_required_hours: f64,
    pub start_date: Date,
    #[serde(default)]
    pub end_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub supervisors: Vec<String>,
    #[serde(default)]
    pub reminder_enabled: bool,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

impl User {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.total_required_hours.is_finite() || self.total_required_hours < 0.0 {
            return Err(ValidationError::InvalidRequiredHours(
                self.total_required_hours,
            ));
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(ValidationError::EndBeforeStart {
                    start: self.start_date,
                    end,
                });
            }
        }
        Ok(())
    }

    /// Whether `supervisor` is already known for this user, compared
    /// case-insensitively so "Jane Doe" and "jane doe" don't duplicate.
    pub fn knows_supervisor(&self, supervisor: &str) -> bool {
        let needle = supervisor.trim();
        self.supervisors
            .iter()
            .any(|s| s.trim().eq_ignore_ascii_case(needle))
    }
}
