//! Entities of the stock management domain.

mod article;
mod money;
mod order;
mod party;
mod sale;

pub use article::{Article, Category};
pub use money::Money;
pub use order::{
    ClientOrder, ClientOrderLine, ClientSide, LineDraft, Order, OrderDraft, OrderLine, OrderSide,
    OrderWithLines, SupplierOrder, SupplierOrderLine, SupplierSide,
};
pub use party::{Address, Client, Supplier};
pub use sale::{Sale, SaleDraft, SaleLine, SaleWithLines};

/// Foreign key field names, as matched by the entity store.
pub mod fields {
    pub const ARTICLE: &str = "article_id";
    pub const CATEGORY: &str = "category_id";
    pub const CLIENT: &str = "client_id";
    pub const SUPPLIER: &str = "supplier_id";
    pub const ORDER: &str = "order_id";
    pub const SALE: &str = "sale_id";
}

pub(crate) const MAX_CODE_LEN: usize = 50;
pub(crate) const MAX_TEXT_LEN: usize = 255;
