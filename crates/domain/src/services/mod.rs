//! Services for independently managed entities.

mod article;
mod repository;

pub use article::ArticleService;
pub use repository::{
    CategoryService, ClientService, EntityRepository, ManagedEntity, SupplierService,
};
