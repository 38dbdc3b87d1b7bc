//! Domain error types.

use common::EntityId;
use entity_store::StoreError;
use serde::Serialize;
use thiserror::Error;

use crate::guard::Dependents;
use crate::state::OrderStatus;
use crate::validation::Violation;

/// Stable reason codes attached to every [`DomainError`].
///
/// Codes are grouped by entity, in blocks of a thousand, so callers can
/// switch on either the symbolic name or the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ArticleNotFound,
    ArticleNotValid,
    ArticleAlreadyInUse,
    CategoryNotFound,
    CategoryNotValid,
    CategoryAlreadyInUse,
    ClientNotFound,
    ClientNotValid,
    ClientAlreadyInUse,
    ClientOrderNotFound,
    ClientOrderNotValid,
    ClientOrderNotModifiable,
    ClientOrderStatusNotValid,
    SupplierOrderNotFound,
    SupplierOrderNotValid,
    SupplierOrderNotModifiable,
    SupplierOrderStatusNotValid,
    SupplierNotFound,
    SupplierNotValid,
    SupplierAlreadyInUse,
    SaleNotFound,
    SaleNotValid,
    StockInsufficient,
    StockOverflow,
    UpdatePhotoFailed,
    IdRequired,
    StoreFailure,
}

impl ErrorCode {
    /// Numeric value of the code.
    pub fn value(&self) -> u32 {
        match self {
            ErrorCode::ArticleNotFound => 1000,
            ErrorCode::ArticleNotValid => 1001,
            ErrorCode::ArticleAlreadyInUse => 1002,
            ErrorCode::CategoryNotFound => 2000,
            ErrorCode::CategoryNotValid => 2001,
            ErrorCode::CategoryAlreadyInUse => 2002,
            ErrorCode::ClientNotFound => 3000,
            ErrorCode::ClientNotValid => 3001,
            ErrorCode::ClientAlreadyInUse => 3002,
            ErrorCode::ClientOrderNotFound => 4000,
            ErrorCode::ClientOrderNotValid => 4001,
            ErrorCode::ClientOrderNotModifiable => 4002,
            ErrorCode::ClientOrderStatusNotValid => 4003,
            ErrorCode::SupplierOrderNotFound => 5000,
            ErrorCode::SupplierOrderNotValid => 5001,
            ErrorCode::SupplierOrderNotModifiable => 5002,
            ErrorCode::SupplierOrderStatusNotValid => 5003,
            ErrorCode::SupplierNotFound => 6000,
            ErrorCode::SupplierNotValid => 6001,
            ErrorCode::SupplierAlreadyInUse => 6002,
            ErrorCode::SaleNotFound => 7000,
            ErrorCode::SaleNotValid => 7001,
            ErrorCode::StockInsufficient => 8000,
            ErrorCode::StockOverflow => 8001,
            ErrorCode::UpdatePhotoFailed => 9000,
            ErrorCode::IdRequired => 9001,
            ErrorCode::StoreFailure => 9999,
        }
    }

    /// Symbolic name of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ArticleNotFound => "ARTICLE_NOT_FOUND",
            ErrorCode::ArticleNotValid => "ARTICLE_NOT_VALID",
            ErrorCode::ArticleAlreadyInUse => "ARTICLE_ALREADY_IN_USE",
            ErrorCode::CategoryNotFound => "CATEGORY_NOT_FOUND",
            ErrorCode::CategoryNotValid => "CATEGORY_NOT_VALID",
            ErrorCode::CategoryAlreadyInUse => "CATEGORY_ALREADY_IN_USE",
            ErrorCode::ClientNotFound => "CLIENT_NOT_FOUND",
            ErrorCode::ClientNotValid => "CLIENT_NOT_VALID",
            ErrorCode::ClientAlreadyInUse => "CLIENT_ALREADY_IN_USE",
            ErrorCode::ClientOrderNotFound => "CLIENT_ORDER_NOT_FOUND",
            ErrorCode::ClientOrderNotValid => "CLIENT_ORDER_NOT_VALID",
            ErrorCode::ClientOrderNotModifiable => "CLIENT_ORDER_NOT_MODIFIABLE",
            ErrorCode::ClientOrderStatusNotValid => "CLIENT_ORDER_STATUS_NOT_VALID",
            ErrorCode::SupplierOrderNotFound => "SUPPLIER_ORDER_NOT_FOUND",
            ErrorCode::SupplierOrderNotValid => "SUPPLIER_ORDER_NOT_VALID",
            ErrorCode::SupplierOrderNotModifiable => "SUPPLIER_ORDER_NOT_MODIFIABLE",
            ErrorCode::SupplierOrderStatusNotValid => "SUPPLIER_ORDER_STATUS_NOT_VALID",
            ErrorCode::SupplierNotFound => "SUPPLIER_NOT_FOUND",
            ErrorCode::SupplierNotValid => "SUPPLIER_NOT_VALID",
            ErrorCode::SupplierAlreadyInUse => "SUPPLIER_ALREADY_IN_USE",
            ErrorCode::SaleNotFound => "SALE_NOT_FOUND",
            ErrorCode::SaleNotValid => "SALE_NOT_VALID",
            ErrorCode::StockInsufficient => "STOCK_INSUFFICIENT",
            ErrorCode::StockOverflow => "STOCK_OVERFLOW",
            ErrorCode::UpdatePhotoFailed => "UPDATE_PHOTO_FAILED",
            ErrorCode::IdRequired => "ID_REQUIRED",
            ErrorCode::StoreFailure => "STORE_FAILURE",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// One or more field-level violations; nothing was written.
    #[error("{message} ({} violation(s))", .violations.len())]
    ValidationFailed {
        code: ErrorCode,
        message: String,
        violations: Vec<Violation>,
    },

    /// A required record does not exist.
    #[error("{message}")]
    NotFound { code: ErrorCode, message: String },

    /// A delete was blocked by dependent records.
    #[error("{message}")]
    EntityInUse {
        code: ErrorCode,
        message: String,
        blocked_by: Dependents,
    },

    /// The photo store returned no usable result.
    #[error("{message}")]
    UpstreamFailure { code: ErrorCode, message: String },

    /// An operation was called without the id it needs.
    #[error("{entity} id is required")]
    MissingId { entity: &'static str },

    /// The requested status does not follow the stored one.
    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidStatusTransition {
        code: ErrorCode,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// The order reached a status that freezes it.
    #[error("Order {order_code} is {status} and can no longer be modified")]
    OrderNotModifiable {
        code: ErrorCode,
        order_code: String,
        status: OrderStatus,
    },

    /// Applying a movement would make stock negative.
    #[error(
        "Insufficient stock for article {article_code}: {available} available, {requested} requested"
    )]
    InsufficientStock {
        article_code: String,
        available: i64,
        requested: i64,
    },

    /// Applying a movement would exceed the representable stock.
    #[error("Stock overflow for article {article_code}: {available} on hand, {requested} incoming")]
    StockOverflow {
        article_code: String,
        available: i64,
        requested: i64,
    },

    /// An error occurred in the entity store.
    #[error("Entity store error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError {
    pub fn validation(code: ErrorCode, message: impl Into<String>, violations: Vec<Violation>) -> Self {
        Self::ValidationFailed {
            code,
            message: message.into(),
            violations,
        }
    }

    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn in_use(code: ErrorCode, message: impl Into<String>, blocked_by: Dependents) -> Self {
        Self::EntityInUse {
            code,
            message: message.into(),
            blocked_by,
        }
    }

    pub fn upstream(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::UpstreamFailure {
            code,
            message: message.into(),
        }
    }

    /// Stable reason code for programmatic handling.
    pub fn reason_code(&self) -> ErrorCode {
        match self {
            DomainError::ValidationFailed { code, .. }
            | DomainError::NotFound { code, .. }
            | DomainError::EntityInUse { code, .. }
            | DomainError::UpstreamFailure { code, .. }
            | DomainError::InvalidStatusTransition { code, .. }
            | DomainError::OrderNotModifiable { code, .. } => *code,
            DomainError::MissingId { .. } => ErrorCode::IdRequired,
            DomainError::InsufficientStock { .. } => ErrorCode::StockInsufficient,
            DomainError::StockOverflow { .. } => ErrorCode::StockOverflow,
            DomainError::Store(_) => ErrorCode::StoreFailure,
        }
    }

    /// Violations carried by a validation failure, empty otherwise.
    pub fn violations(&self) -> &[Violation] {
        match self {
            DomainError::ValidationFailed { violations, .. } => violations,
            _ => &[],
        }
    }
}

/// Rejects a missing id before any store access.
pub fn require_id(id: Option<EntityId>, entity: &'static str) -> Result<EntityId> {
    id.ok_or(DomainError::MissingId { entity })
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
