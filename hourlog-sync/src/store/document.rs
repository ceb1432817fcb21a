use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use hourlog_core::domain::DocumentId;

use super::CollectionPath;

/// Name of the server-authoritative timestamp the store stamps on
/// every write, alongside the application-level ISO timestamps the
/// entities carry themselves.
pub const SERVER_TIMESTAMP_FIELD: &str = "_serverUpdatedAt";

/// A raw store document: an id plus a JSON field map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: DocumentId, fields: Map<String, Value>) -> Self {
        Self { id, fields }
    }

    /// Serializes an entity into a document keyed by `id`. The entity's
    /// own id field stays in the payload; the store key and payload id
    /// are kept equal by the repositories.
    pub fn from_entity<T: Serialize>(id: DocumentId, entity: &T) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(entity)? {
            Value::Object(fields) => Ok(Self { id, fields }),
            other => Err(serde::ser::Error::custom(format!(
                "expected an object document, got {other}"
            ))),
        }
    }

    pub fn to_entity<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.fields.clone()))
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Whether this is a schema-marker placeholder (kept only to make
    /// an empty collection visible in store tooling).
    pub fn is_schema_marker(&self) -> bool {
        self.id.as_str() == "_schema"
            || self
                .fields
                .get("schemaMarker")
                .and_then(Value::as_bool)
                .unwrap_or(false)
    }
}

/// One operation of an atomic batch.
#[derive(Debug, Clone)]
pub enum BatchWrite {
    Set {
        path: CollectionPath,
        doc: Document,
    },
    Delete {
        path: CollectionPath,
        id: DocumentId,
    },
}
