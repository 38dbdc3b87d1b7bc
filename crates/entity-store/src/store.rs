use async_trait::async_trait;

use crate::{Entity, EntityId, RecordDraft, Result, StoredRecord};

/// Core trait for entity store implementations.
///
/// All implementations must be thread-safe (Send + Sync). Every read and
/// write goes through a transaction so that a check and the write that
/// depends on it observe the same state.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Transaction type handed out by [`begin`](Self::begin).
    type Tx: Transaction;

    /// Opens a transaction.
    ///
    /// The transaction must be finished with [`Transaction::commit`];
    /// dropping it (including on an early `?` return) rolls it back.
    async fn begin(&self) -> Result<Self::Tx>;
}

/// A scoped unit of work against the entity store.
#[async_trait]
pub trait Transaction: Send {
    /// Retrieves a record by id.
    async fn get(&mut self, kind: &str, id: EntityId) -> Result<Option<StoredRecord>>;

    /// Retrieves a record by business code.
    async fn get_by_code(&mut self, kind: &str, code: &str) -> Result<Option<StoredRecord>>;

    /// Lists every record of a kind, in insertion order.
    async fn list_all(&mut self, kind: &str) -> Result<Vec<StoredRecord>>;

    /// Lists the records of a kind whose foreign key `field` equals `value`,
    /// in insertion order.
    async fn list_by_foreign_key(
        &mut self,
        kind: &str,
        field: &str,
        value: EntityId,
    ) -> Result<Vec<StoredRecord>>;

    /// Counts the records of a kind whose foreign key `field` equals `value`.
    async fn count_by_foreign_key(
        &mut self,
        kind: &str,
        field: &str,
        value: EntityId,
    ) -> Result<u64> {
        Ok(self.list_by_foreign_key(kind, field, value).await?.len() as u64)
    }

    /// Inserts or replaces a record.
    ///
    /// Fails with `DuplicateCode` if another record of the same kind uses
    /// the draft's code, and with `RecordNotFound` if the draft targets an
    /// id that does not exist.
    async fn save(&mut self, record: RecordDraft) -> Result<StoredRecord>;

    /// Deletes a record, failing with `RecordNotFound` if it does not exist.
    async fn delete(&mut self, kind: &str, id: EntityId) -> Result<()>;

    /// Makes every write of this transaction durable.
    async fn commit(self) -> Result<()>
    where
        Self: Sized;

    /// Discards every write of this transaction.
    async fn rollback(self) -> Result<()>
    where
        Self: Sized;
}

/// Typed access to records through [`Entity`] implementations.
#[async_trait]
pub trait TransactionExt: Transaction {
    /// Loads an entity by id.
    async fn find<E: Entity>(&mut self, id: EntityId) -> Result<Option<E>> {
        self.get(E::KIND, id).await?.map(E::from_record).transpose()
    }

    /// Loads an entity by business code.
    async fn find_by_code<E: Entity>(&mut self, code: &str) -> Result<Option<E>> {
        self.get_by_code(E::KIND, code)
            .await?
            .map(E::from_record)
            .transpose()
    }

    /// Loads every entity of a type.
    async fn find_all<E: Entity>(&mut self) -> Result<Vec<E>> {
        self.list_all(E::KIND)
            .await?
            .into_iter()
            .map(E::from_record)
            .collect()
    }

    /// Loads the entities of a type referencing `value` through `field`.
    async fn find_by_foreign_key<E: Entity>(
        &mut self,
        field: &str,
        value: EntityId,
    ) -> Result<Vec<E>> {
        self.list_by_foreign_key(E::KIND, field, value)
            .await?
            .into_iter()
            .map(E::from_record)
            .collect()
    }

    /// Saves an entity and returns it with its id set.
    async fn persist<E: Entity>(&mut self, mut entity: E) -> Result<E> {
        let stored = self.save(entity.to_record()?).await?;
        entity.set_id(stored.id);
        Ok(entity)
    }

    /// Deletes an entity by id.
    async fn remove<E: Entity>(&mut self, id: EntityId) -> Result<()> {
        self.delete(E::KIND, id).await
    }
}

impl<T: Transaction> TransactionExt for T {}
