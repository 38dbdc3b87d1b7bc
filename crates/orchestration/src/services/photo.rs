//! Photo store trait and in-memory implementation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::PhotoStoreError;

/// Trait for hosting uploaded photos.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Stores the photo and returns the URL it is served from.
    async fn store(&self, bytes: &[u8], title: &str) -> Result<String, PhotoStoreError>;
}

#[derive(Debug, Default)]
struct InMemoryPhotoState {
    photos: Vec<(String, usize)>,
    fail_on_store: bool,
    return_empty_url: bool,
}

/// In-memory photo store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPhotoStore {
    state: Arc<Mutex<InMemoryPhotoState>>,
}

impl InMemoryPhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, InMemoryPhotoState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Configures the store to fail on the next store calls.
    pub fn set_fail_on_store(&self, fail: bool) {
        self.state().fail_on_store = fail;
    }

    /// Configures the store to answer with an empty URL.
    pub fn set_return_empty_url(&self, empty: bool) {
        self.state().return_empty_url = empty;
    }

    /// Returns the number of stored photos.
    pub fn photo_count(&self) -> usize {
        self.state().photos.len()
    }
}

#[async_trait]
impl PhotoStore for InMemoryPhotoStore {
    async fn store(&self, bytes: &[u8], title: &str) -> Result<String, PhotoStoreError> {
        let mut state = self.state();

        if state.fail_on_store {
            return Err(PhotoStoreError::Unavailable("photo host offline".to_string()));
        }
        if state.return_empty_url {
            return Ok(String::new());
        }

        state.photos.push((title.to_string(), bytes.len()));
        Ok(format!("memory://photos/{:04}", state.photos.len()))
    }
}
