//! Domain layer for the stock management system.
//!
//! This crate provides:
//! - The entities (articles, parties, orders, sales) and their validators
//! - Consistency guards checked before deletes
//! - Order status state machine and stock movements
//! - Services for articles, categories, clients and suppliers

pub mod error;
pub mod guard;
pub mod model;
pub mod services;
pub mod state;
pub mod stock;
pub mod validation;

pub use error::{DomainError, ErrorCode, Result, require_id};
pub use guard::{ConsistencyGuard, DeleteTarget, DeleteVerdict, Dependents, check_delete};
pub use model::{
    Address, Article, Category, Client, ClientOrder, ClientOrderLine, ClientSide, LineDraft,
    Money, Order, OrderDraft, OrderLine, OrderSide, OrderWithLines, Sale, SaleDraft, SaleLine,
    SaleWithLines, Supplier, SupplierOrder, SupplierOrderLine, SupplierSide,
};
pub use services::{
    ArticleService, CategoryService, ClientService, EntityRepository, ManagedEntity,
    SupplierService,
};
pub use state::OrderStatus;
pub use stock::{StockDirection, apply_stock_movement};
pub use validation::{Validate, Violation, ViolationReason, ensure_valid};
