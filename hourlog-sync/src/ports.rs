//! Contracts for the services the core calls into but does not own:
//! the authentication session, outbound email, object storage, and the
//! PDF renderer. Demo implementations keep the whole stack runnable
//! in-process.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use hourlog_core::domain::{DailyLog, UserId};

#[derive(Debug, Error)]
#[error("external service error: {0}")]
pub struct PortError(pub String);

/// The live authentication session. The adapter layer always prefers
/// the session's subject id over a caller-supplied one, so a stale or
/// forged owner id can't widen the scope of a write.
pub trait AuthSession: Send + Sync {
    fn current_subject(&self) -> Option<UserId>;
}

/// The session's subject when signed in, otherwise the supplied id
/// (pre-login and legacy paths).
pub fn resolve_owner(session: &dyn AuthSession, supplied: &UserId) -> UserId {
    session.current_subject().unwrap_or_else(|| supplied.clone())
}

/// Demo/test session: a subject id behind a lock.
#[derive(Default)]
pub struct StaticAuthSession {
    subject: RwLock<Option<UserId>>,
}

impl StaticAuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(subject: UserId) -> Self {
        Self {
            subject: RwLock::new(Some(subject)),
        }
    }

    pub fn sign_in(&self, subject: UserId) {
        *self.subject.write().unwrap() = Some(subject);
    }

    pub fn sign_out(&self) {
        *self.subject.write().unwrap() = None;
    }
}

impl AuthSession for StaticAuthSession {
    fn current_subject(&self) -> Option<UserId> {
        self.subject.read().unwrap().clone()
    }
}

/// Outbound email delivery for verification codes.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_verification(&self, to: &str, code: &str) -> Result<(), PortError>;
}

/// Demo mailer: logs instead of sending.
pub struct LogMailer;

#[async_trait]
impl EmailSender for LogMailer {
    async fn send_verification(&self, to: &str, code: &str) -> Result<(), PortError> {
        tracing::info!("verification email to {to}: your code is {code}");
        Ok(())
    }
}

/// Binary upload returning a publicly resolvable URL.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, name: &str, bytes: &[u8]) -> Result<String, PortError>;
}

/// Demo storage: keeps uploads in a map and fabricates URLs.
pub struct InMemoryObjectStorage {
    base_url: String,
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryObjectStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn upload(&self, name: &str, bytes: &[u8]) -> Result<String, PortError> {
        self.objects
            .write()
            .unwrap()
            .insert(name.to_string(), bytes.to_vec());
        Ok(format!("{}/{}", self.base_url, name))
    }
}

/// Renders a weekly report document: header, tabular daily breakdown,
/// totals row, reflection section.
pub trait ReportRenderer: Send + Sync {
    fn render_weekly(
        &self,
        user_name: &str,
        week_label: &str,
        reflection: &str,
        logs: &[DailyLog],
    ) -> Result<Vec<u8>, PortError>;
}

/// Demo renderer producing a plain-text layout with the same sections
/// a PDF export carries.
pub struct TextReportRenderer;

impl ReportRenderer for TextReportRenderer {
    fn render_weekly(
        &self,
        user_name: &str,
        week_label: &str,
        reflection: &str,
        logs: &[DailyLog],
    ) -> Result<Vec<u8>, PortError> {
        let mut out = String::new();
        out.push_str(&format!("Weekly Accomplishment Report — {user_name}\n"));
        out.push_str(&format!("{week_label}\n\n"));
        out.push_str("Date        Hours  Supervisor        Activities\n");

        let mut total = 0.0;
        for log in logs {
            let activities = log
                .activity_types
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!(
                "{}  {:>5.2}  {:<16}  {}\n",
                log.entry_date, log.daily_hours, log.supervisor, activities
            ));
            total += log.daily_hours;
        }
        out.push_str(&format!("Total       {total:>5.2}\n\n"));
        out.push_str("Reflection:\n");
        out.push_str(reflection);
        out.push('\n');

        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hourlog_core::domain::{ActivityType, DocumentId};
    use time::macros::date;
    use time::OffsetDateTime;

    #[test]
    fn owner_resolution_prefers_the_live_session() {
        let session = StaticAuthSession::signed_in(UserId::new("session-user"));
        assert_eq!(
            resolve_owner(&session, &UserId::new("supplied-user")),
            UserId::new("session-user")
        );

        session.sign_out();
        assert_eq!(
            resolve_owner(&session, &UserId::new("supplied-user")),
            UserId::new("supplied-user")
        );
    }

    #[tokio::test]
    async fn uploads_return_resolvable_urls() {
        let storage = InMemoryObjectStorage::new("https://cdn.example.com");
        let url = storage.upload("avatar.png", b"bytes").await.unwrap();
        assert_eq!(url, "https://cdn.example.com/avatar.png");
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn rendered_report_carries_a_totals_row_and_reflection() {
        let logs = vec![
            DailyLog {
                id: DocumentId::default(),
                user_id: UserId::new("auth-1"),
                entry_date: date!(2025 - 01 - 06),
                activity_types: vec![ActivityType::Coding],
                task_description: String::new(),
                supervisor: "Jane Doe".to_string(),
                daily_hours: 4.0,
                attachments: vec![],
                created_at: OffsetDateTime::UNIX_EPOCH,
                updated_at: OffsetDateTime::UNIX_EPOCH,
            },
            DailyLog {
                id: DocumentId::default(),
                user_id: UserId::new("auth-1"),
                entry_date: date!(2025 - 01 - 07),
                activity_types: vec![ActivityType::Meeting],
                task_description: String::new(),
                supervisor: "Jane Doe".to_string(),
                daily_hours: 3.5,
                attachments: vec![],
                created_at: OffsetDateTime::UNIX_EPOCH,
                updated_at: OffsetDateTime::UNIX_EPOCH,
            },
        ];

        let rendered = TextReportRenderer
            .render_weekly("Ada Trainee", "Week 1: 2025-01-06 - 2025-01-12", "Solid week.", &logs)
            .unwrap();
        let text = String::from_utf8(rendered).unwrap();
        assert!(text.contains("Ada Trainee"));
        assert!(text.contains("Total        7.50"));
        assert!(text.contains("Solid week."));
    }
}
