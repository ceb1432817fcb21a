use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Map;

use hourlog_core::domain::{DocumentId, User, UserId, UserPatch};

use crate::store::{CollectionPath, Document, DocumentStore};

use super::repo_error::{NonFatalError, RepositoryError};
use super::not_found_as;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
    async fn upsert_user(&self, user: &User) -> Result<User, RepositoryError>;
    async fn update_user(&self, id: &UserId, patch: &UserPatch) -> Result<User, RepositoryError>;
    /// Best-effort: records a supervisor name on the profile if it is
    /// new. Failure must never fail the operation this piggybacks on.
    async fn append_supervisor(&self, id: &UserId, name: &str) -> Result<(), NonFatalError>;
}

pub struct UserRepositoryImpl {
    store: Arc<dyn DocumentStore>,
}

impl UserRepositoryImpl {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn doc_id(id: &UserId) -> DocumentId {
        DocumentId::new(id.as_str())
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn get_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let doc = self
            .store
            .get(&CollectionPath::users(), &Self::doc_id(id))
            .await?;
        match doc {
            Some(doc) => Ok(Some(doc.to_entity()?)),
            None => Ok(None),
        }
    }

    async fn upsert_user(&self, user: &User) -> Result<User, RepositoryError> {
        user.validate()?;
        let doc = Document::from_entity(Self::doc_id(&user.id), user)?;
        self.store.set(&CollectionPath::users(), doc).await?;
        Ok(user.clone())
    }

    async fn update_user(&self, id: &UserId, patch: &UserPatch) -> Result<User, RepositoryError> {
        let mut user = self
            .get_user(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("user {id}")))?;

        if patch.is_empty() {
            return Ok(user);
        }

        patch.apply(&mut user);
        user.validate()?;

        self.store
            .merge(&CollectionPath::users(), &Self::doc_id(id), patch.fields())
            .await
            .map_err(|e| not_found_as(e, format!("user {id}")))?;
        Ok(user)
    }

    async fn append_supervisor(&self, id: &UserId, name: &str) -> Result<(), NonFatalError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }

        let user = self
            .get_user(id)
            .await
            .map_err(|e| NonFatalError(format!("loading profile of {id}: {e}")))?
            .ok_or_else(|| NonFatalError(format!("no profile for {id}")))?;

        if user.knows_supervisor(name) {
            return Ok(());
        }

        let mut supervisors = user.supervisors.clone();
        supervisors.push(name.to_string());

        let mut fields = Map::new();
        fields.insert(
            "supervisors".to_string(),
            serde_json::to_value(&supervisors)
                .map_err(|e| NonFatalError(format!("encoding supervisors: {e}")))?,
        );
        self.store
            .merge(&CollectionPath::users(), &Self::doc_id(id), fields)
            .await
            .map_err(|e| NonFatalError(format!("recording supervisor for {id}: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use hourlog_core::domain::Email;
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
            supervisors: vec!["Jane Doe".to_string()],
            reminder_enabled: false,
            profile_image_url: None,
        }
    }

    fn repo() -> (UserRepositoryImpl, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (UserRepositoryImpl::new(store.clone()), store)
    }

    #[tokio::test]
    async fn missing_user_reads_as_none() {
        let (repo, _) = repo();
        assert!(repo.get_user(&UserId::new("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let (repo, _) = repo();
        repo.upsert_user(&user("auth-1")).await.unwrap();
        let loaded = repo.get_user(&UserId::new("auth-1")).await.unwrap().unwrap();
        assert_eq!(loaded, user("auth-1"));
    }

    #[tokio::test]
    async fn update_of_missing_user_is_not_found() {
        let (repo, _) = repo();
        let patch = UserPatch {
            name: Some("Grace".to_string()),
            ..Default::default()
        };
        let err = repo.update_user(&UserId::new("nope"), &patch).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_merges_only_patched_fields() {
        let (repo, _) = repo();
        repo.upsert_user(&user("auth-1")).await.unwrap();

        let patch = UserPatch {
            total_required_hours: Some(600.0),
            ..Default::default()
        };
        let updated = repo.update_user(&UserId::new("auth-1"), &patch).await.unwrap();
        assert_eq!(updated.total_required_hours, 600.0);
        assert_eq!(updated.name, "Ada Trainee");

        let reloaded = repo.get_user(&UserId::new("auth-1")).await.unwrap().unwrap();
        assert_eq!(reloaded.total_required_hours, 600.0);
        assert_eq!(reloaded.supervisors, vec!["Jane Doe".to_string()]);
    }

    #[tokio::test]
    async fn append_supervisor_skips_known_names() {
        let (repo, _) = repo();
        repo.upsert_user(&user("auth-1")).await.unwrap();

        repo.append_supervisor(&UserId::new("auth-1"), "jane doe")
            .await
            .unwrap();
        repo.append_supervisor(&UserId::new("auth-1"), "John Roe")
            .await
            .unwrap();

        let loaded = repo.get_user(&UserId::new("auth-1")).await.unwrap().unwrap();
        assert_eq!(
            loaded.supervisors,
            vec!["Jane Doe".to_string(), "John Roe".to_string()]
        );
    }

    #[tokio::test]
    async fn append_supervisor_without_profile_is_non_fatal() {
        let (repo, _) = repo();
        let err = repo
            .append_supervisor(&UserId::new("nope"), "Jane Doe")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no profile"));
    }
}
