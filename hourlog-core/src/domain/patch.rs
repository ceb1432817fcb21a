use serde::Serialize;
use serde_json::{Map, Value};
use time::Date;

use super::{ActivityType, DailyLog, User};

/// Partial update for a user profile.
///
/// Each entity gets its own patch struct listing exactly the fields it
/// permits partial updates on, so an invalid-field patch is a compile
/// error rather than a silently merged map.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_required_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisors: Option<Vec<String>>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// The set fields as a JSON object, ready for a merge write.
    pub fn fields(&self) -> Map<String, Value> {
        to_fields(self)
    }

    /// Applies the patch to an in-memory profile (the optimistic half
    /// of apply-then-sync).
    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(hours) = self.total_required_hours {
            user.total_required_hours = hours;
        }
        if let Some(start) = self.start_date {
            user.start_date = start;
        }
        if let Some(end) = self.end_date {
            user.end_date = Some(end);
        }
        if let Some(enabled) = self.reminder_enabled {
            user.reminder_enabled = enabled;
        }
        if let Some(url) = &self.profile_image_url {
            user.profile_image_url = Some(url.clone());
        }
        if let Some(supervisors) = &self.supervisors {
            user.supervisors = supervisors.clone();
        }
    }
}

/// Partial update for a daily log.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_types: Option<Vec<ActivityType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,
}

impl DailyLogPatch {
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    pub fn fields(&self) -> Map<String, Value> {
        to_fields(self)
    }

    pub fn apply(&self, log: &mut DailyLog) {
        if let Some(date) = self.entry_date {
            log.entry_date = date;
        }
        if let Some(types) = &self.activity_types {
            log.activity_types = types.clone();
        }
        if let Some(description) = &self.task_description {
            log.task_description = description.clone();
        }
        if let Some(supervisor) = &self.supervisor {
            log.supervisor = supervisor.clone();
        }
        if let Some(hours) = self.daily_hours {
            log.daily_hours = hours;
        }
        if let Some(attachments) = &self.attachments {
            log.attachments = attachments.clone();
        }
    }
}

/// Partial update for a weekly report (only the reflection text is
/// editable after the fact; the log snapshot is replaced by upsert).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReportPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection: Option<String>,
}

impl WeeklyReportPatch {
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    pub fn fields(&self) -> Map<String, Value> {
        to_fields(self)
    }
}

fn to_fields<T: Serialize>(patch: &T) -> Map<String, Value> {
    match serde_json::to_value(patch) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_fields_are_omitted_from_the_merge() {
        let patch = DailyLogPatch {
            daily_hours: Some(6.0),
            ..Default::default()
        };
        let fields = patch.fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["dailyHours"], 6.0);
    }

    #[test]
    fn empty_patch_reports_empty() {
        assert!(UserPatch::default().is_empty());
        assert!(!UserPatch {
            name: Some("Ada".to_string()),
            ..Default::default()
        }
        .is_empty());
    }
}
