//! Photo store error types.

use thiserror::Error;

/// Errors reported by a [`PhotoStore`](crate::PhotoStore).
#[derive(Debug, Error)]
pub enum PhotoStoreError {
    /// The photo host could not be reached.
    #[error("Photo store unavailable: {0}")]
    Unavailable(String),

    /// The photo host refused the upload.
    #[error("Photo rejected: {0}")]
    Rejected(String),
}
