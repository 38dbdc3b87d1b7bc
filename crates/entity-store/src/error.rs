use common::{EntityId, InvalidEntityId};
use thiserror::Error;

/// Errors that can occur when interacting with the entity store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record of the given kind exists with this id.
    #[error("Record not found: {kind} with id {id}")]
    RecordNotFound { kind: String, id: EntityId },

    /// Another record of the same kind already uses this business code.
    #[error("Duplicate code for {kind}: {code}")]
    DuplicateCode { kind: String, code: String },

    /// A stored id could not be turned into an [`EntityId`].
    #[error("Invalid stored id: {0}")]
    InvalidId(#[from] InvalidEntityId),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store could not be configured.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for entity store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
