use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    EntityId, RecordDraft, Result, StoreError, StoredRecord,
    store::{EntityStore, Transaction},
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    /// Keyed by id; ids are allocated monotonically so key order is
    /// insertion order.
    records: BTreeMap<EntityId, StoredRecord>,
    last_id: i64,
}

impl MemoryState {
    fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a StoredRecord> + 'a {
        self.records.values().filter(move |r| r.kind == kind)
    }
}

/// In-memory entity store implementation for testing.
///
/// Transactions are serialized: `begin` waits for the previous transaction
/// to finish, then works on a private copy of the state which replaces the
/// shared state on commit.
#[derive(Clone, Default)]
pub struct InMemoryEntityStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryEntityStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of committed records of a kind.
    pub async fn record_count(&self, kind: &str) -> usize {
        self.state.lock().await.of_kind(kind).count()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.records.clear();
        state.last_id = 0;
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<InMemoryTransaction> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryTransaction { guard, working })
    }
}

/// Transaction over an [`InMemoryEntityStore`].
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn get(&mut self, kind: &str, id: EntityId) -> Result<Option<StoredRecord>> {
        Ok(self
            .working
            .records
            .get(&id)
            .filter(|r| r.kind == kind)
            .cloned())
    }

    async fn get_by_code(&mut self, kind: &str, code: &str) -> Result<Option<StoredRecord>> {
        Ok(self
            .working
            .of_kind(kind)
            .find(|r| r.code.as_deref() == Some(code))
            .cloned())
    }

    async fn list_all(&mut self, kind: &str) -> Result<Vec<StoredRecord>> {
        Ok(self.working.of_kind(kind).cloned().collect())
    }

    async fn list_by_foreign_key(
        &mut self,
        kind: &str,
        field: &str,
        value: EntityId,
    ) -> Result<Vec<StoredRecord>> {
        Ok(self
            .working
            .of_kind(kind)
            .filter(|r| r.foreign_key(field) == Some(value))
            .cloned()
            .collect())
    }

    async fn save(&mut self, record: RecordDraft) -> Result<StoredRecord> {
        if let Some(ref code) = record.code
            && self
                .working
                .of_kind(&record.kind)
                .any(|r| r.code.as_ref() == Some(code) && Some(r.id) != record.id)
        {
            return Err(StoreError::DuplicateCode {
                kind: record.kind,
                code: code.clone(),
            });
        }

        let now = Utc::now();
        let stored = match record.id {
            Some(id) => {
                let existing = self
                    .working
                    .records
                    .get(&id)
                    .filter(|r| r.kind == record.kind)
                    .ok_or_else(|| StoreError::RecordNotFound {
                        kind: record.kind.clone(),
                        id,
                    })?;
                StoredRecord {
                    kind: record.kind,
                    id,
                    code: record.code,
                    foreign_keys: record.foreign_keys,
                    payload: record.payload,
                    created_at: existing.created_at,
                    updated_at: now,
                }
            }
            None => {
                let id = EntityId::new(self.working.last_id + 1)?;
                self.working.last_id = id.as_i64();
                StoredRecord {
                    kind: record.kind,
                    id,
                    code: record.code,
                    foreign_keys: record.foreign_keys,
                    payload: record.payload,
                    created_at: now,
                    updated_at: now,
                }
            }
        };

        self.working.records.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&mut self, kind: &str, id: EntityId) -> Result<()> {
        match self.working.records.get(&id) {
            Some(r) if r.kind == kind => {
                self.working.records.remove(&id);
                Ok(())
            }
            _ => Err(StoreError::RecordNotFound {
                kind: kind.to_string(),
                id,
            }),
        }
    }

    async fn commit(mut self) -> Result<()> {
        *self.guard = self.working;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: i64) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    fn draft(kind: &str, code: Option<&str>) -> RecordDraft {
        RecordDraft::new(kind, serde_json::json!({"name": code}))
            .with_code(code.map(str::to_owned))
    }

    #[tokio::test]
    async fn save_allocates_sequential_ids() {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();

        let first = tx.save(draft("Client", Some("C001"))).await.unwrap();
        let second = tx.save(draft("Article", Some("A001"))).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(first.id, id(1));
        assert_eq!(second.id, id(2));
        assert_eq!(store.record_count("Client").await, 1);
    }

    #[tokio::test]
    async fn get_is_scoped_to_kind() {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();
        let saved = tx.save(draft("Client", Some("C001"))).await.unwrap();

        assert!(tx.get("Client", saved.id).await.unwrap().is_some());
        assert!(tx.get("Supplier", saved.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_by_code_finds_record() {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.save(draft("Client", Some("C001"))).await.unwrap();
        let c2 = tx.save(draft("Client", Some("C002"))).await.unwrap();

        let found = tx.get_by_code("Client", "C002").await.unwrap().unwrap();
        assert_eq!(found.id, c2.id);
        assert!(tx.get_by_code("Client", "C999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_keeps_creation_time_and_position() {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();
        let first = tx.save(draft("Client", Some("C001"))).await.unwrap();
        tx.save(draft("Client", Some("C002"))).await.unwrap();

        let updated = tx
            .save(
                RecordDraft::new("Client", serde_json::json!({"name": "renamed"}))
                    .with_id(Some(first.id))
                    .with_code(Some("C001".to_string())),
            )
            .await
            .unwrap();

        assert_eq!(updated.id, first.id);
        assert_eq!(updated.created_at, first.created_at);
        let all = tx.list_all("Client").await.unwrap();
        assert_eq!(all[0].payload["name"], "renamed");
    }

    #[tokio::test]
    async fn update_of_missing_record_fails() {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();
        let result = tx
            .save(draft("Client", Some("C001")).with_id(Some(id(12))))
            .await;

        assert!(matches!(result, Err(StoreError::RecordNotFound { .. })));
    }

    #[tokio::test]
    async fn duplicate_code_is_rejected_per_kind() {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.save(draft("Client", Some("X1"))).await.unwrap();

        let duplicate = tx.save(draft("Client", Some("X1"))).await;
        assert!(matches!(duplicate, Err(StoreError::DuplicateCode { .. })));

        // Same code on another kind is fine
        tx.save(draft("Supplier", Some("X1"))).await.unwrap();
    }

    #[tokio::test]
    async fn list_by_foreign_key_preserves_insertion_order() {
        let store = InMemoryEntityStore::new();
        let article = id(100);
        let other = id(200);
        let mut tx = store.begin().await.unwrap();

        for (n, target) in [(1, article), (2, other), (3, article)] {
            tx.save(
                RecordDraft::new("SaleLine", serde_json::json!({ "n": n }))
                    .with_foreign_key("article_id", target),
            )
            .await
            .unwrap();
        }

        let lines = tx
            .list_by_foreign_key("SaleLine", "article_id", article)
            .await
            .unwrap();
        let order: Vec<_> = lines.iter().map(|r| r.payload["n"].clone()).collect();
        assert_eq!(order, vec![serde_json::json!(1), serde_json::json!(3)]);
        assert_eq!(
            tx.count_by_foreign_key("SaleLine", "article_id", other)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn delete_missing_record_fails() {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();

        let result = tx.delete("Client", id(5)).await;
        assert!(matches!(result, Err(StoreError::RecordNotFound { .. })));
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = InMemoryEntityStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.save(draft("Client", Some("C001"))).await.unwrap();
        }

        assert_eq!(store.record_count("Client").await, 0);
    }

    #[tokio::test]
    async fn rollback_discards_writes() {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.save(draft("Client", Some("C001"))).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(store.record_count("Client").await, 0);
    }

    #[tokio::test]
    async fn clear_resets_ids() {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.save(draft("Client", Some("C001"))).await.unwrap();
        tx.commit().await.unwrap();

        store.clear().await;

        let mut tx = store.begin().await.unwrap();
        let saved = tx.save(draft("Client", Some("C001"))).await.unwrap();
        assert_eq!(saved.id, id(1));
    }
}
