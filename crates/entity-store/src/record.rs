use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EntityId;

/// A record as handed to [`Transaction::save`](crate::Transaction::save).
///
/// With `id: None` the store inserts a new record and allocates its id;
/// with `Some(id)` it replaces the existing record of the same kind.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub kind: String,
    pub id: Option<EntityId>,
    pub code: Option<String>,
    pub foreign_keys: BTreeMap<String, EntityId>,
    pub payload: serde_json::Value,
}

impl RecordDraft {
    /// Creates a draft for a new record of the given kind.
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            code: None,
            foreign_keys: BTreeMap::new(),
            payload,
        }
    }

    /// Targets an existing record.
    pub fn with_id(mut self, id: Option<EntityId>) -> Self {
        self.id = id;
        self
    }

    /// Sets the business code, unique per kind.
    pub fn with_code(mut self, code: Option<String>) -> Self {
        self.code = code;
        self
    }

    /// Adds a foreign key that can later be matched by
    /// [`Transaction::list_by_foreign_key`](crate::Transaction::list_by_foreign_key).
    pub fn with_foreign_key(mut self, field: impl Into<String>, value: EntityId) -> Self {
        self.foreign_keys.insert(field.into(), value);
        self
    }
}

/// A persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub kind: String,
    pub id: EntityId,
    pub code: Option<String>,
    pub foreign_keys: BTreeMap<String, EntityId>,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord {
    /// Returns the value of a foreign key, if the record holds it.
    pub fn foreign_key(&self, field: &str) -> Option<EntityId> {
        self.foreign_keys.get(field).copied()
    }
}
