use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map};
use time::OffsetDateTime;

use hourlog_core::domain::{DocumentId, Notification, UserId};

use crate::store::{Document, DocumentStore, PerUserCollection};

use super::repo_error::RepositoryError;
use super::{fresh_document_id, not_found_as};

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Latest notifications first, capped at the configured page size.
    async fn get_notifications(&self, user: &UserId) -> Result<Vec<Notification>, RepositoryError>;
    async fn create_notification(
        &self,
        notification: &Notification,
    ) -> Result<Notification, RepositoryError>;
    async fn mark_read(&self, user: &UserId, id: &DocumentId) -> Result<(), RepositoryError>;
    async fn mark_all_read(&self, user: &UserId) -> Result<(), RepositoryError>;
    async fn delete_notification(
        &self,
        user: &UserId,
        id: &DocumentId,
    ) -> Result<(), RepositoryError>;
}

pub struct NotificationRepositoryImpl {
    store: Arc<dyn DocumentStore>,
    page_size: usize,
}

impl NotificationRepositoryImpl {
    pub fn new(store: Arc<dyn DocumentStore>, page_size: usize) -> Self {
        Self { store, page_size }
    }
}

#[async_trait]
impl NotificationRepository for NotificationRepositoryImpl {
    async fn get_notifications(&self, user: &UserId) -> Result<Vec<Notification>, RepositoryError> {
        let docs = self
            .store
            .list_ordered(
                &PerUserCollection::Notifications.scoped(user),
                "createdAt",
                true,
                Some(self.page_size),
            )
            .await?;
        docs.iter()
            .map(|doc| doc.to_entity().map_err(RepositoryError::from))
            .collect()
    }

    async fn create_notification(
        &self,
        notification: &Notification,
    ) -> Result<Notification, RepositoryError> {
        let mut notification = notification.clone();
        if notification.id.is_empty() {
            notification.id = fresh_document_id();
        }
        // Creation time is repository-assigned; a caller-supplied
        // value would corrupt the newest-first listing order.
        notification.created_at = OffsetDateTime::now_utc();

        let path = PerUserCollection::Notifications.scoped(&notification.user_id);
        let doc = Document::from_entity(notification.id.clone(), &notification)?;
        self.store.set(&path, doc).await?;
        Ok(notification)
    }

    async fn mark_read(&self, user: &UserId, id: &DocumentId) -> Result<(), RepositoryError> {
        let mut fields = Map::new();
        fields.insert("read".to_string(), json!(true));
        self.store
            .merge(&PerUserCollection::Notifications.scoped(user), id, fields)
            .await
            .map_err(|e| not_found_as(e, format!("notification {id} of {user}")))
    }

    async fn mark_all_read(&self, user: &UserId) -> Result<(), RepositoryError> {
        let path = PerUserCollection::Notifications.scoped(user);
        let docs = self
            .store
            .list_ordered(&path, "createdAt", true, None)
            .await?;

        for doc in docs {
            let already_read = doc
                .fields
                .get("read")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false);
            if already_read {
                continue;
            }
            let mut fields = Map::new();
            fields.insert("read".to_string(), json!(true));
            self.store.merge(&path, &doc.id, fields).await?;
        }
        Ok(())
    }

    async fn delete_notification(
        &self,
        user: &UserId,
        id: &DocumentId,
    ) -> Result<(), RepositoryError> {
        self.store
            .delete(&PerUserCollection::Notifications.scoped(user), id)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use hourlog_core::domain::NotificationKind;
    use time::{Duration, OffsetDateTime};

    fn notification(title: &str, age_minutes: i64) -> Notification {
        Notification {
            id: DocumentId::default(),
            user_id: UserId::new("auth-1"),
            kind: NotificationKind::Reminder,
            title: title.to_string(),
            message: "Don't forget to log today's hours".to_string(),
            read: false,
            link: None,
            created_at: OffsetDateTime::UNIX_EPOCH + Duration::minutes(10_000 - age_minutes),
        }
    }

    fn repo(page_size: usize) -> (NotificationRepositoryImpl, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (
            NotificationRepositoryImpl::new(store.clone(), page_size),
            store,
        )
    }

    /// Writes a notification document as-is, bypassing the
    /// repository's timestamp stamping.
    async fn seed(store: &MemoryStore, title: &str, age_minutes: i64) {
        let mut n = notification(title, age_minutes);
        n.id = DocumentId::new(title);
        let doc = Document::from_entity(n.id.clone(), &n).unwrap();
        store
            .set(&PerUserCollection::Notifications.scoped(&n.user_id), doc)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_capped() {
        let (repo, store) = repo(2);
        for i in 0..3 {
            seed(&store, &format!("n{i}"), i).await;
        }

        let listed = repo.get_notifications(&UserId::new("auth-1")).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "n0");
        assert_eq!(listed[1].title, "n1");
    }

    #[tokio::test]
    async fn create_overrides_a_stale_creation_time() {
        let (repo, _) = repo(50);
        let created = repo
            .create_notification(&notification("n0", 0))
            .await
            .unwrap();
        assert!(created.created_at > OffsetDateTime::UNIX_EPOCH + Duration::minutes(10_000));

        let listed = repo.get_notifications(&UserId::new("auth-1")).await.unwrap();
        assert_eq!(listed[0].created_at, created.created_at);
    }

    #[tokio::test]
    async fn mark_read_flips_only_the_flag() {
        let (repo, _) = repo(50);
        let created = repo.create_notification(&notification("n0", 0)).await.unwrap();
        repo.mark_read(&UserId::new("auth-1"), &created.id).await.unwrap();

        let listed = repo.get_notifications(&UserId::new("auth-1")).await.unwrap();
        assert!(listed[0].read);
        assert_eq!(listed[0].title, "n0");
    }

    #[tokio::test]
    async fn mark_read_on_missing_notification_is_not_found() {
        let (repo, _) = repo(50);
        let err = repo
            .mark_read(&UserId::new("auth-1"), &DocumentId::new("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn mark_all_read_covers_every_unread() {
        let (repo, _) = repo(50);
        for i in 0..3 {
            repo.create_notification(&notification(&format!("n{i}"), i))
                .await
                .unwrap();
        }
        repo.mark_all_read(&UserId::new("auth-1")).await.unwrap();

        let listed = repo.get_notifications(&UserId::new("auth-1")).await.unwrap();
        assert!(listed.iter().all(|n| n.read));
    }
}
