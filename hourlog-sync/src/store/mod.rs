//! The hosted document store, abstracted.
//!
//! The real backend is a hierarchical collections/documents service;
//! everything above this module only talks to the [`DocumentStore`]
//! trait so repositories, the migrator, and the session controller can
//! run against [`MemoryStore`] in tests and the demo.

mod document;
mod error;
mod memory;
mod paths;

use async_trait::async_trait;
use serde_json::{Map, Value};

use hourlog_core::domain::DocumentId;

pub use document::{BatchWrite, Document, SERVER_TIMESTAMP_FIELD};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use paths::{CollectionPath, PerUserCollection};

/// Hard per-batch operation limit of the backing store.
pub const MAX_BATCH_OPS: usize = 500;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Single-document lookup; a missing document is `None`, never an
    /// error.
    async fn get(
        &self,
        path: &CollectionPath,
        id: &DocumentId,
    ) -> Result<Option<Document>, StoreError>;

    /// Full write (create or replace). Implementations stamp
    /// [`SERVER_TIMESTAMP_FIELD`] with their own clock.
    async fn set(&self, path: &CollectionPath, doc: Document) -> Result<(), StoreError>;

    /// Partial field merge. Fails with [`StoreError::NotFound`] when
    /// the document does not exist.
    async fn merge(
        &self,
        path: &CollectionPath,
        id: &DocumentId,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError>;

    /// Idempotent delete; removing a nonexistent id is a no-op.
    async fn delete(&self, path: &CollectionPath, id: &DocumentId) -> Result<(), StoreError>;

    /// All documents whose `field` equals `value`.
    async fn query_eq(
        &self,
        path: &CollectionPath,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError>;

    /// Documents ordered by `order_field`, optionally capped.
    async fn list_ordered(
        &self,
        path: &CollectionPath,
        order_field: &str,
        descending: bool,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Just the ids present in a collection (cheap existence diffing
    /// for the migrator).
    async fn list_ids(&self, path: &CollectionPath) -> Result<Vec<DocumentId>, StoreError>;

    /// Atomic batch, rejected with [`StoreError::BatchTooLarge`] above
    /// [`MAX_BATCH_OPS`] operations.
    async fn commit_batch(&self, writes: Vec<BatchWrite>) -> Result<(), StoreError>;
}
