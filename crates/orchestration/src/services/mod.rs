//! External collaborators and in-memory implementations.

pub mod photo;

pub use photo::{InMemoryPhotoStore, PhotoStore};
