use std::fmt;

use hourlog_core::domain::UserId;

/// A slash-separated collection path within the hierarchical store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn users() -> Self {
        Self("users".to_string())
    }

    pub fn supervisors() -> Self {
        Self("supervisors".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three entity collections that exist both in the legacy flat
/// layout and in the per-user subcollection layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerUserCollection {
    DailyLogs,
    WeeklyReports,
    Notifications,
}

impl PerUserCollection {
    pub const ALL: [PerUserCollection; 3] = [
        PerUserCollection::DailyLogs,
        PerUserCollection::WeeklyReports,
        PerUserCollection::Notifications,
    ];

    fn name(&self) -> &'static str {
        match self {
            PerUserCollection::DailyLogs => "daily_logs",
            PerUserCollection::WeeklyReports => "weekly_reports",
            PerUserCollection::Notifications => "notifications",
        }
    }

    /// The legacy flat layout: one shared top-level collection,
    /// disambiguated only by a `userId` field.
    pub fn flat(&self) -> CollectionPath {
        CollectionPath(self.name().to_string())
    }

    /// The post-migration layout: nested under the owning user.
    pub fn scoped(&self, user: &UserId) -> CollectionPath {
        CollectionPath(format!("users/{}/{}", user.as_str(), self.name()))
    }
}

impl fmt::Display for PerUserCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
