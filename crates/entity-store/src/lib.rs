//! Entity store boundary for the stock management core.
//!
//! Every entity type is persisted as a keyed record: a surrogate id, an
//! optional unique business code, the foreign keys it holds, and a JSON
//! payload. Callers work through a [`Transaction`] obtained from
//! [`EntityStore::begin`]; dropping a transaction without committing it
//! discards everything written through it.

pub mod config;
pub mod entity;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::EntityId;
pub use config::StoreConfig;
pub use entity::Entity;
pub use error::{Result, StoreError};
pub use memory::{InMemoryEntityStore, InMemoryTransaction};
pub use postgres::{PostgresEntityStore, PostgresTransaction};
pub use record::{RecordDraft, StoredRecord};
pub use store::{EntityStore, Transaction, TransactionExt};
