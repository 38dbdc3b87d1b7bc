//! Shared types used across the stock management crates.

mod types;

pub use types::{EntityId, InvalidEntityId};
