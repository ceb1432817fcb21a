//! One-time migration from the legacy flat collection layout into the
//! per-user subcollection layout.
//!
//! Safe to run on every login and from several sessions at once:
//! destination existence is re-checked by id before every copy, so a
//! repeated or concurrent pass never duplicates documents. Originals
//! are never deleted here; that is a separate administrative step.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use tracing::instrument;

use hourlog_core::domain::UserId;

use crate::store::{BatchWrite, DocumentStore, PerUserCollection, StoreError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
    /// Documents copied into the subcollection in this pass.
    pub copied: usize,
    /// Documents already present at the destination or schema markers.
    pub skipped: usize,
    /// Documents left for a later pass because the batch cap was hit.
    pub remaining: usize,
}

pub struct LegacyMigrator {
    store: Arc<dyn DocumentStore>,
    batch_cap: usize,
}

impl LegacyMigrator {
    pub fn new(store: Arc<dyn DocumentStore>, batch_cap: usize) -> Self {
        Self {
            store,
            batch_cap: batch_cap.max(1),
        }
    }

    /// Migrates all three legacy collections for one user. Cheap in
    /// the steady state: an empty flat query short-circuits.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn migrate_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<(PerUserCollection, MigrationReport)>, StoreError> {
        let mut reports = Vec::with_capacity(PerUserCollection::ALL.len());
        for collection in PerUserCollection::ALL {
            let report = self.migrate_collection(user, collection).await?;
            reports.push((collection, report));
        }
        Ok(reports)
    }

    async fn migrate_collection(
        &self,
        user: &UserId,
        collection: PerUserCollection,
    ) -> Result<MigrationReport, StoreError> {
        let flat_docs = self
            .store
            .query_eq(&collection.flat(), "userId", &json!(user.as_str()))
            .await?;
        if flat_docs.is_empty() {
            return Ok(MigrationReport::default());
        }

        let destination = collection.scoped(user);
        let existing: HashSet<String> = self
            .store
            .list_ids(&destination)
            .await?
            .into_iter()
            .map(|id| id.as_str().to_string())
            .collect();

        let mut report = MigrationReport::default();
        let mut writes = Vec::new();
        for doc in flat_docs {
            if doc.is_schema_marker() || existing.contains(doc.id.as_str()) {
                report.skipped += 1;
                continue;
            }
            if writes.len() == self.batch_cap {
                // Over-cap documents migrate on a later login.
                report.remaining += 1;
                continue;
            }
            writes.push(BatchWrite::Set {
                path: destination.clone(),
                doc,
            });
        }

        report.copied = writes.len();
        if !writes.is_empty() {
            self.store.commit_batch(writes).await?;
        }

        tracing::info!(
            collection = %collection,
            copied = report.copied,
            skipped = report.skipped,
            remaining = report.remaining,
            "migrated legacy collection for {user}"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CollectionPath, Document, MemoryStore};
    use hourlog_core::domain::DocumentId;
    use serde_json::Map;

    fn flat_log(id: &str, user: &str) -> Document {
        let mut fields = Map::new();
        fields.insert("userId".to_string(), json!(user));
        fields.insert("entryDate".to_string(), json!("2025-01-06"));
        fields.insert("dailyHours".to_string(), json!(4.0));
        Document::new(DocumentId::new(id), fields)
    }

    fn marker() -> Document {
        let mut fields = Map::new();
        fields.insert("userId".to_string(), json!("auth-1"));
        fields.insert("schemaMarker".to_string(), json!(true));
        Document::new(DocumentId::new("_schema"), fields)
    }

    async fn seed(store: &MemoryStore, docs: Vec<Document>) {
        let path = PerUserCollection::DailyLogs.flat();
        for doc in docs {
            store.set(&path, doc).await.unwrap();
        }
    }

    #[tokio::test]
    async fn migration_copies_only_the_requested_user() {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            vec![
                flat_log("a", "auth-1"),
                flat_log("b", "auth-1"),
                flat_log("c", "other-user"),
            ],
        )
        .await;

        let migrator = LegacyMigrator::new(store.clone(), 490);
        let reports = migrator.migrate_user(&UserId::new("auth-1")).await.unwrap();

        let (_, logs_report) = &reports[0];
        assert_eq!(logs_report.copied, 2);
        assert_eq!(
            store.len(&PerUserCollection::DailyLogs.scoped(&UserId::new("auth-1"))),
            2
        );
        // Originals stay in place.
        assert_eq!(store.len(&PerUserCollection::DailyLogs.flat()), 3);
    }

    #[tokio::test]
    async fn running_twice_yields_the_same_destination_count() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, vec![flat_log("a", "auth-1"), flat_log("b", "auth-1")]).await;

        let migrator = LegacyMigrator::new(store.clone(), 490);
        let user = UserId::new("auth-1");
        migrator.migrate_user(&user).await.unwrap();
        let reports = migrator.migrate_user(&user).await.unwrap();

        let (_, second_pass) = &reports[0];
        assert_eq!(second_pass.copied, 0);
        assert_eq!(second_pass.skipped, 2);
        assert_eq!(store.len(&PerUserCollection::DailyLogs.scoped(&user)), 2);
    }

    #[tokio::test]
    async fn schema_markers_are_never_copied() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, vec![flat_log("a", "auth-1"), marker()]).await;

        let migrator = LegacyMigrator::new(store.clone(), 490);
        let user = UserId::new("auth-1");
        migrator.migrate_user(&user).await.unwrap();

        let destination = PerUserCollection::DailyLogs.scoped(&user);
        assert_eq!(store.len(&destination), 1);
        assert!(store
            .get(&destination, &DocumentId::new("_schema"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn overflow_beyond_the_batch_cap_migrates_on_a_later_pass() {
        let store = Arc::new(MemoryStore::new());
        let docs = (0..5).map(|i| flat_log(&format!("d{i}"), "auth-1")).collect();
        seed(&store, docs).await;

        let migrator = LegacyMigrator::new(store.clone(), 3);
        let user = UserId::new("auth-1");

        let first = migrator.migrate_user(&user).await.unwrap();
        assert_eq!(first[0].1.copied, 3);
        assert_eq!(first[0].1.remaining, 2);

        let second = migrator.migrate_user(&user).await.unwrap();
        assert_eq!(second[0].1.copied, 2);
        assert_eq!(second[0].1.remaining, 0);
        assert_eq!(store.len(&PerUserCollection::DailyLogs.scoped(&user)), 5);
    }

    #[tokio::test]
    async fn empty_flat_collection_is_a_no_op() {
        let store = Arc::new(MemoryStore::new());
        let migrator = LegacyMigrator::new(store.clone(), 490);
        let reports = migrator.migrate_user(&UserId::new("auth-1")).await.unwrap();
        assert!(reports.iter().all(|(_, r)| *r == MigrationReport::default()));
        assert!(store.is_empty(&CollectionPath::users()));
    }
}
