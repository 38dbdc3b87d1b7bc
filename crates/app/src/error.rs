//! Application error types.

use thiserror::Error;

/// Errors raised while assembling the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// The entity store could not be opened or migrated.
    #[error("Entity store error: {0}")]
    Store(#[from] entity_store::StoreError),

    /// A tracing subscriber was already installed, or the filter is invalid.
    #[error("Tracing setup failed: {0}")]
    Tracing(String),

    /// The metrics recorder could not be installed.
    #[error("Metrics setup failed: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

pub type Result<T> = std::result::Result<T, AppError>;
