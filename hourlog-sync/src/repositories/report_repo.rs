use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;

use hourlog_core::domain::{DocumentId, UserId, WeeklyReport, WeeklyReportPatch};

use crate::store::{Document, DocumentStore, PerUserCollection};

use super::repo_error::RepositoryError;
use super::{fresh_document_id, iso_value, not_found_as};

#[async_trait]
pub trait WeeklyReportRepository: Send + Sync {
    /// All reports for a user, most recent week first.
    async fn get_reports(&self, user: &UserId) -> Result<Vec<WeeklyReport>, RepositoryError>;
    /// Upsert keyed on `(user_id, week_start)`: a second save for the
    /// same week overwrites in place, preserving the original
    /// `created_at`.
    async fn upsert_report(&self, report: &WeeklyReport) -> Result<WeeklyReport, RepositoryError>;
    /// Edits the reflection text of an existing report in place.
    async fn update_report(
        &self,
        user: &UserId,
        id: &DocumentId,
        patch: &WeeklyReportPatch,
    ) -> Result<WeeklyReport, RepositoryError>;
    async fn delete_report(&self, user: &UserId, id: &DocumentId) -> Result<(), RepositoryError>;
}

pub struct WeeklyReportRepositoryImpl {
    store: Arc<dyn DocumentStore>,
}

impl WeeklyReportRepositoryImpl {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl WeeklyReportRepository for WeeklyReportRepositoryImpl {
    async fn get_reports(&self, user: &UserId) -> Result<Vec<WeeklyReport>, RepositoryError> {
        let docs = self
            .store
            .list_ordered(
                &PerUserCollection::WeeklyReports.scoped(user),
                "weekStart",
                true,
                None,
            )
            .await?;
        docs.iter()
            .map(|doc| doc.to_entity().map_err(RepositoryError::from))
            .collect()
    }

    async fn upsert_report(&self, report: &WeeklyReport) -> Result<WeeklyReport, RepositoryError> {
        let path = PerUserCollection::WeeklyReports.scoped(&report.user_id);
        let week_value = serde_json::to_value(report.week_start)?;
        let existing = self.store.query_eq(&path, "weekStart", &week_value).await?;

        let now = OffsetDateTime::now_utc();
        let mut persisted = report.clone();
        persisted.updated_at = now;

        match existing.first() {
            Some(doc) => {
                let previous: WeeklyReport = doc.to_entity()?;
                persisted.id = previous.id;
                persisted.created_at = previous.created_at;
            }
            None => {
                if persisted.id.is_empty() {
                    persisted.id = fresh_document_id();
                }
                persisted.created_at = now;
            }
        }

        let doc = Document::from_entity(persisted.id.clone(), &persisted)?;
        self.store.set(&path, doc).await?;
        Ok(persisted)
    }

    async fn update_report(
        &self,
        user: &UserId,
        id: &DocumentId,
        patch: &WeeklyReportPatch,
    ) -> Result<WeeklyReport, RepositoryError> {
        let path = PerUserCollection::WeeklyReports.scoped(user);
        let mut report: WeeklyReport = self
            .store
            .get(&path, id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("report {id} of {user}")))?
            .to_entity()?;

        if let Some(reflection) = &patch.reflection {
            report.reflection = reflection.clone();
        }
        let now = OffsetDateTime::now_utc();
        report.updated_at = now;

        let mut fields = patch.fields();
        fields.insert("updatedAt".to_string(), iso_value(now));
        self.store
            .merge(&path, id, fields)
            .await
            .map_err(|e| not_found_as(e, format!("report {id} of {user}")))?;
        Ok(report)
    }

    async fn delete_report(&self, user: &UserId, id: &DocumentId) -> Result<(), RepositoryError> {
        self.store
            .delete(&PerUserCollection::WeeklyReports.scoped(user), id)
            .await?;
        Ok(())
    }
}
