use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{EntityId, RecordDraft, Result, StoredRecord};

/// A type that can be persisted in the entity store.
///
/// Implementors declare their record kind, expose their business code and
/// the foreign keys they hold; the store never looks inside the payload.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Record kind under which values of this type are stored.
    const KIND: &'static str;

    /// Surrogate id, `None` until first saved.
    fn id(&self) -> Option<EntityId>;

    /// Sets the surrogate id after a save.
    fn set_id(&mut self, id: EntityId);

    /// Business code, unique per kind.
    fn code(&self) -> Option<&str> {
        None
    }

    /// Foreign keys held by this value, as `(field, id)` pairs.
    fn foreign_keys(&self) -> Vec<(&'static str, EntityId)> {
        Vec::new()
    }

    /// Builds the record draft for saving this value.
    fn to_record(&self) -> Result<RecordDraft> {
        let draft = RecordDraft::new(Self::KIND, serde_json::to_value(self)?)
            .with_id(self.id())
            .with_code(self.code().map(str::to_owned));

        Ok(self
            .foreign_keys()
            .into_iter()
            .fold(draft, |draft, (field, value)| {
                draft.with_foreign_key(field, value)
            }))
    }

    /// Rebuilds a value from a stored record.
    fn from_record(record: StoredRecord) -> Result<Self> {
        let mut value: Self = serde_json::from_value(record.payload)?;
        value.set_id(record.id);
        Ok(value)
    }
}
