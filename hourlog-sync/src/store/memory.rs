//! In-memory document store used by tests and the demo binary.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use hourlog_core::domain::DocumentId;

use super::{
    BatchWrite, CollectionPath, Document, DocumentStore, StoreError, MAX_BATCH_OPS,
    SERVER_TIMESTAMP_FIELD,
};

type Collections = HashMap<String, BTreeMap<String, Document>>;

/// Hierarchical store backed by nested maps.
///
/// `set_offline(true)` makes every subsequent call fail with
/// [`StoreError::Unavailable`], which is how tests exercise the
/// cache-fallback paths.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    /// Document count in one collection (for test assertions).
    pub fn len(&self, path: &CollectionPath) -> usize {
        self.collections
            .read()
            .unwrap()
            .get(path.as_str())
            .map(|c| c.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, path: &CollectionPath) -> bool {
        self.len(path) == 0
    }

    fn guard(&self) -> Result<(), StoreError> {
        if self.offline.load(AtomicOrdering::SeqCst) {
            Err(StoreError::Unavailable("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }

    fn stamp(doc: &mut Document) {
        let now = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        doc.fields
            .insert(SERVER_TIMESTAMP_FIELD.to_string(), Value::String(now));
    }

    fn apply_set(collections: &mut Collections, path: &CollectionPath, mut doc: Document) {
        Self::stamp(&mut doc);
        collections
            .entry(path.as_str().to_string())
            .or_default()
            .insert(doc.id.as_str().to_string(), doc);
    }
}

fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(
        &self,
        path: &CollectionPath,
        id: &DocumentId,
    ) -> Result<Option<Document>, StoreError> {
        self.guard()?;
        let collections = self.collections.read().unwrap();
        Ok(collections
            .get(path.as_str())
            .and_then(|c| c.get(id.as_str()))
            .cloned())
    }

    async fn set(&self, path: &CollectionPath, doc: Document) -> Result<(), StoreError> {
        self.guard()?;
        let mut collections = self.collections.write().unwrap();
        Self::apply_set(&mut collections, path, doc);
        Ok(())
    }

    async fn merge(
        &self,
        path: &CollectionPath,
        id: &DocumentId,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        self.guard()?;
        let mut collections = self.collections.write().unwrap();
        let doc = collections
            .get_mut(path.as_str())
            .and_then(|c| c.get_mut(id.as_str()))
            .ok_or_else(|| StoreError::NotFound(format!("{path}/{id}")))?;
        for (key, value) in fields {
            doc.fields.insert(key, value);
        }
        Self::stamp(doc);
        Ok(())
    }

    async fn delete(&self, path: &CollectionPath, id: &DocumentId) -> Result<(), StoreError> {
        self.guard()?;
        let mut collections = self.collections.write().unwrap();
        if let Some(collection) = collections.get_mut(path.as_str()) {
            collection.remove(id.as_str());
        }
        Ok(())
    }

    async fn query_eq(
        &self,
        path: &CollectionPath,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        self.guard()?;
        let collections = self.collections.read().unwrap();
        Ok(collections
            .get(path.as_str())
            .map(|c| {
                c.values()
                    .filter(|doc| doc.fields.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_ordered(
        &self,
        path: &CollectionPath,
        order_field: &str,
        descending: bool,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        self.guard()?;
        let collections = self.collections.read().unwrap();
        let mut docs: Vec<Document> = collections
            .get(path.as_str())
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default();

        docs.sort_by(|a, b| {
            let ordering = cmp_values(
                a.fields.get(order_field).unwrap_or(&Value::Null),
                b.fields.get(order_field).unwrap_or(&Value::Null),
            );
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });

        if let Some(limit) = limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    async fn list_ids(&self, path: &CollectionPath) -> Result<Vec<DocumentId>, StoreError> {
        self.guard()?;
        let collections = self.collections.read().unwrap();
        Ok(collections
            .get(path.as_str())
            .map(|c| c.keys().map(|k| DocumentId::new(k.clone())).collect())
            .unwrap_or_default())
    }

    async fn commit_batch(&self, writes: Vec<BatchWrite>) -> Result<(), StoreError> {
        self.guard()?;
        if writes.len() > MAX_BATCH_OPS {
            return Err(StoreError::BatchTooLarge(writes.len()));
        }
        let mut collections = self.collections.write().unwrap();
        for write in writes {
            match write {
                BatchWrite::Set { path, doc } => Self::apply_set(&mut collections, &path, doc),
                BatchWrite::Delete { path, id } => {
                    if let Some(collection) = collections.get_mut(path.as_str()) {
                        collection.remove(id.as_str());
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, fields: Vec<(&str, Value)>) -> Document {
        let mut map = Map::new();
        for (k, v) in fields {
            map.insert(k.to_string(), v);
        }
        Document::new(DocumentId::new(id), map)
    }

    #[tokio::test]
    async fn set_and_get_round_trip() {
        let store = MemoryStore::new();
        let path = CollectionPath::users();
        store
            .set(&path, doc("u1", vec![("name", json!("Ada"))]))
            .await
            .unwrap();

        let loaded = store.get(&path, &DocumentId::new("u1")).await.unwrap();
        let loaded = loaded.unwrap();
        assert_eq!(loaded.get_str("name"), Some("Ada"));
        assert!(loaded.fields.contains_key(SERVER_TIMESTAMP_FIELD));
    }

    #[tokio::test]
    async fn missing_document_is_none_not_an_error() {
        let store = MemoryStore::new();
        let found = store
            .get(&CollectionPath::users(), &DocumentId::new("nope"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn merge_on_missing_document_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .merge(&CollectionPath::users(), &DocumentId::new("nope"), Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        let path = CollectionPath::users();
        store.set(&path, doc("u1", vec![])).await.unwrap();
        store.delete(&path, &DocumentId::new("u1")).await.unwrap();
        store.delete(&path, &DocumentId::new("u1")).await.unwrap();
        assert!(store.is_empty(&path));
    }

    #[tokio::test]
    async fn list_ordered_sorts_by_string_field() {
        let store = MemoryStore::new();
        let path = CollectionPath::users();
        for (id, date) in [("a", "2025-01-07"), ("b", "2025-01-13"), ("c", "2025-01-06")] {
            store
                .set(&path, doc(id, vec![("entryDate", json!(date))]))
                .await
                .unwrap();
        }

        let docs = store
            .list_ordered(&path, "entryDate", true, Some(2))
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].get_str("entryDate"), Some("2025-01-13"));
        assert_eq!(docs[1].get_str("entryDate"), Some("2025-01-07"));
    }

    #[tokio::test]
    async fn oversized_batches_are_rejected() {
        let store = MemoryStore::new();
        let path = CollectionPath::users();
        let writes: Vec<BatchWrite> = (0..=MAX_BATCH_OPS)
            .map(|i| BatchWrite::Set {
                path: path.clone(),
                doc: doc(&format!("d{i}"), vec![]),
            })
            .collect();
        let err = store.commit_batch(writes).await.unwrap_err();
        assert!(matches!(err, StoreError::BatchTooLarge(n) if n == MAX_BATCH_OPS + 1));
        assert!(store.is_empty(&path));
    }

    #[tokio::test]
    async fn offline_store_reports_unavailable() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let err = store
            .get(&CollectionPath::users(), &DocumentId::new("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
