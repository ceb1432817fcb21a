use std::sync::Arc;

use async_trait::async_trait;

use hourlog_core::domain::Supervisor;

use crate::store::{CollectionPath, Document, DocumentStore};

use super::repo_error::RepositoryError;
use super::fresh_document_id;

/// The shared supervisor directory. Cross-user, read-mostly; the main
/// per-user flow only consults it as a lookup table.
#[async_trait]
pub trait SupervisorRepository: Send + Sync {
    async fn list_supervisors(&self) -> Result<Vec<Supervisor>, RepositoryError>;
    /// Deduplicates on case-insensitive name: adding a known name
    /// returns the existing entry.
    async fn add_supervisor(&self, supervisor: &Supervisor) -> Result<Supervisor, RepositoryError>;
}

pub struct SupervisorRepositoryImpl {
    store: Arc<dyn DocumentStore>,
}

impl SupervisorRepositoryImpl {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SupervisorRepository for SupervisorRepositoryImpl {
    async fn list_supervisors(&self) -> Result<Vec<Supervisor>, RepositoryError> {
        let docs = self
            .store
            .list_ordered(&CollectionPath::supervisors(), "name", false, None)
            .await?;
        docs.iter()
            .map(|doc| doc.to_entity().map_err(RepositoryError::from))
            .collect()
    }

    async fn add_supervisor(&self, supervisor: &Supervisor) -> Result<Supervisor, RepositoryError> {
        let name = supervisor.name.trim();
        let existing = self.list_supervisors().await?;
        if let Some(known) = existing
            .into_iter()
            .find(|s| s.name.trim().eq_ignore_ascii_case(name))
        {
            return Ok(known);
        }

        let mut supervisor = supervisor.clone();
        if supervisor.id.is_empty() {
            supervisor.id = fresh_document_id();
        }
        let doc = Document::from_entity(supervisor.id.clone(), &supervisor)?;
        self.store.set(&CollectionPath::supervisors(), doc).await?;
        Ok(supervisor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use hourlog_core::domain::{DocumentId, UserId};
    use time::OffsetDateTime;

    fn supervisor(name: &str) -> Supervisor {
        Supervisor {
            id: DocumentId::default(),
            name: name.to_string(),
            email: None,
            department: None,
            added_by: UserId::new("auth-1"),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn duplicate_names_resolve_to_the_existing_entry() {
        let repo = SupervisorRepositoryImpl::new(Arc::new(MemoryStore::new()));
        let first = repo.add_supervisor(&supervisor("Jane Doe")).await.unwrap();
        let second = repo.add_supervisor(&supervisor("jane doe ")).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(repo.list_supervisors().await.unwrap().len(), 1);
    }
}
