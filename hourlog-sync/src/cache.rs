//! Browser-persistent-storage stand-in: a key-value cache holding the
//! current user, their logs, and their reports for instant reads and
//! offline fallback.

use moka::sync::Cache;
use serde::{de::DeserializeOwned, Serialize};

use hourlog_core::domain::{DailyLog, User, UserId, WeeklyReport};

const CURRENT_USER_KEY: &str = "current_user";

#[derive(Clone)]
pub struct LocalCache {
    entries: Cache<String, String>,
}

impl Default for LocalCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalCache {
    pub fn new() -> Self {
        Self {
            // Unbounded for practical purposes; one user's data is tiny.
            entries: Cache::new(10_000),
        }
    }

    pub fn set_current_user(&self, user: &User) {
        self.entries
            .insert(CURRENT_USER_KEY.to_string(), user.id.as_str().to_string());
        self.put_user(user);
    }

    /// The cached profile of whoever was last signed in, if any.
    pub fn current_user(&self) -> Option<User> {
        let id = self.entries.get(CURRENT_USER_KEY)?;
        self.user(&UserId::new(id))
    }

    /// Logout semantics: drop the "current user" marker but keep the
    /// historical per-user entries for legacy fallback.
    pub fn clear_current_user(&self) {
        self.entries.invalidate(CURRENT_USER_KEY);
    }

    pub fn put_user(&self, user: &User) {
        self.put_json(user_key(&user.id), user);
    }

    pub fn user(&self, id: &UserId) -> Option<User> {
        self.get_json(&user_key(id))
    }

    pub fn put_logs(&self, id: &UserId, logs: &[DailyLog]) {
        self.put_json(logs_key(id), &logs.to_vec());
    }

    pub fn logs(&self, id: &UserId) -> Option<Vec<DailyLog>> {
        self.get_json(&logs_key(id))
    }

    pub fn put_reports(&self, id: &UserId, reports: &[WeeklyReport]) {
        self.put_json(reports_key(id), &reports.to_vec());
    }

    pub fn reports(&self, id: &UserId) -> Option<Vec<WeeklyReport>> {
        self.get_json(&reports_key(id))
    }

    fn put_json<T: Serialize>(&self, key: String, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.entries.insert(key, json),
            Err(err) => tracing::warn!("failed to cache {key}: {err}"),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let json = self.entries.get(key)?;
        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("dropping corrupt cache entry {key}: {err}");
                self.entries.invalidate(key);
                None
            }
        }
    }
}

fn user_key(id: &UserId) -> String {
    format!("user:{id}")
}

fn logs_key(id: &UserId) -> String {
    format!("logs:{id}")
}

fn reports_key(id: &UserId) -> String {
    format!("reports:{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hourlog_core::domain::{DocumentId, Email};
    use time::macros::date;
    use time::OffsetDateTime;

    fn user(id: &str) -> User {
        User {
            id: UserId::new(id),
            name: "Ada Trainee".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
            total_required_hours: 480.0,
            start_date: date!(2025 - 01 - 06),
            end_date: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            supervisors: vec![],
            reminder_enabled: false,
            profile_image_url: None,
        }
    }

    #[test]
    fn current_user_round_trips() {
        let cache = LocalCache::new();
        assert!(cache.current_user().is_none());

        cache.set_current_user(&user("auth-1"));
        assert_eq!(cache.current_user().unwrap().id, UserId::new("auth-1"));
    }

    #[test]
    fn report_history_round_trips() {
        let cache = LocalCache::new();
        let report = WeeklyReport {
            id: DocumentId::new("r1"),
            user_id: UserId::new("auth-1"),
            week_start: date!(2025 - 01 - 06),
            week_end: date!(2025 - 01 - 12),
            reflection: "Solid week.".to_string(),
            logs: vec![],
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };

        cache.put_reports(&UserId::new("auth-1"), std::slice::from_ref(&report));
        let cached = cache.reports(&UserId::new("auth-1")).unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].week_start, report.week_start);
        assert_eq!(cached[0].reflection, "Solid week.");
    }

    #[test]
    fn logout_keeps_historical_entries() {
        let cache = LocalCache::new();
        cache.set_current_user(&user("auth-1"));
        cache.put_logs(&UserId::new("auth-1"), &[]);

        cache.clear_current_user();
        assert!(cache.current_user().is_none());
        // The per-user entries survive for legacy fallback.
        assert!(cache.user(&UserId::new("auth-1")).is_some());
        assert!(cache.logs(&UserId::new("auth-1")).is_some());
    }
}
