use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;

use hourlog_core::domain::{DailyLog, DailyLogPatch, DocumentId, UserId};

use crate::store::{Document, DocumentStore, PerUserCollection};

use super::repo_error::RepositoryError;
use super::user_repo::{UserRepository, UserRepositoryImpl};
use super::{fresh_document_id, iso_value, not_found_as};

#[async_trait]
pub trait DailyLogRepository: Send + Sync {
    /// All logs for a user, newest entry date first.
    async fn get_logs(&self, user: &UserId) -> Result<Vec<DailyLog>, RepositoryError>;
    async fn create_log(&self, log: &DailyLog) -> Result<DailyLog, RepositoryError>;
    async fn update_log(
        &self,
        user: &UserId,
        id: &DocumentId,
        patch: &DailyLogPatch,
    ) -> Result<DailyLog, RepositoryError>;
    /// Idempotent; deleting a nonexistent log is a no-op.
    async fn delete_log(&self, user: &UserId, id: &DocumentId) -> Result<(), RepositoryError>;
}

pub struct DailyLogRepositoryImpl {
    store: Arc<dyn DocumentStore>,
    users: UserRepositoryImpl,
}

impl DailyLogRepositoryImpl {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            users: UserRepositoryImpl::new(store.clone()),
            store,
        }
    }

    /// Supervisor auto-append is enrichment, not part of the log write:
    /// failures are logged and swallowed.
    async fn record_supervisor(&self, user: &UserId, supervisor: &str) {
        if let Err(e) = self.users.append_supervisor(user, supervisor).await {
            tracing::warn!("failed to record supervisor for {user}: {e}");
        }
    }
}

#[async_trait]
impl DailyLogRepository for DailyLogRepositoryImpl {
    async fn get_logs(&self, user: &UserId) -> Result<Vec<DailyLog>, RepositoryError> {
        let docs = self
            .store
            .list_ordered(
                &PerUserCollection::DailyLogs.scoped(user),
                "entryDate",
                true,
                None,
            )
            .await?;
        docs.iter()
            .map(|doc| doc.to_entity().map_err(RepositoryError::from))
            .collect()
    }

    async fn create_log(&self, log: &DailyLog) -> Result<DailyLog, RepositoryError> {
        log.validate()?;

        let now = OffsetDateTime::now_utc();
        let mut log = log.clone();
        if log.id.is_empty() {
            log.id = fresh_document_id();
        }
        log.created_at = now;
        log.updated_at = now;

        let path = PerUserCollection::DailyLogs.scoped(&log.user_id);
        let doc = Document::from_entity(log.id.clone(), &log)?;
        self.store.set(&path, doc).await?;

        self.record_supervisor(&log.user_id, &log.supervisor).await;
        Ok(log)
    }

    async fn update_log(
        &self,
        user: &UserId,
        id: &DocumentId,
        patch: &DailyLogPatch,
    ) -> Result<DailyLog, RepositoryError> {
        let path = PerUserCollection::DailyLogs.scoped(user);
        let mut log: DailyLog = self
            .store
            .get(&path, id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("log {id} of {user}")))?
            .to_entity()?;

        let now = OffsetDateTime::now_utc();
        patch.apply(&mut log);
        log.updated_at = now;
        log.validate()?;

        let mut fields = patch.fields();
        fields.insert("updatedAt".to_string(), iso_value(now));
        self.store
            .merge(&path, id, fields)
            .await
            .map_err(|e| not_found_as(e, format!("log {id} of {user}")))?;

        if let Some(supervisor) = &patch.supervisor {
            self.record_supervisor(user, supervisor).await;
        }
        Ok(log)
    }

    async fn delete_log(&self, user: &UserId, id: &DocumentId) -> Result<(), RepositoryError> {
        self.store
            .delete(&PerUserCollection::DailyLogs.scoped(user), id)
            .await?;
        Ok(())
    }
}
