//! Multi-entity operations of the stock management system.
//!
//! Each operation runs in one store transaction:
//! - [`OrderOrchestrator`] creates an order with its lines, moves it through
//!   `EN_PREPARATION → VALIDEE → LIVREE` and applies stock on delivery
//! - [`SaleOrchestrator`] records sales, which take stock out immediately
//! - [`SupplierPhotoService`] attaches a photo URL from a [`PhotoStore`]

pub mod error;
pub mod order;
pub mod sale;
pub mod services;
pub mod supplier_photo;

pub use error::PhotoStoreError;
pub use order::{ClientOrderOrchestrator, OrderOrchestrator, SupplierOrderOrchestrator};
pub use sale::SaleOrchestrator;
pub use services::{InMemoryPhotoStore, PhotoStore};
pub use supplier_photo::SupplierPhotoService;
