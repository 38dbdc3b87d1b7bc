//! Application assembly for the stock management system.
//!
//! [`App`] wires every service to one entity store and one photo store.
//! Configuration and observability live in [`config`] and [`telemetry`].

pub mod config;
pub mod error;
pub mod telemetry;

use domain::{ArticleService, CategoryService, ClientService, ConsistencyGuard, SupplierService};
use entity_store::{EntityStore, InMemoryEntityStore, PostgresEntityStore};
use history::ArticleHistoryAggregator;
use orchestration::{
    ClientOrderOrchestrator, InMemoryPhotoStore, PhotoStore, SaleOrchestrator,
    SupplierOrderOrchestrator, SupplierPhotoService,
};

pub use config::{AppConfig, LogFormat};
pub use error::{AppError, Result};

/// Every service of the system, sharing one store.
pub struct App<S: EntityStore + Clone, P: PhotoStore> {
    pub articles: ArticleService<S>,
    pub categories: CategoryService<S>,
    pub clients: ClientService<S>,
    pub suppliers: SupplierService<S>,
    pub client_orders: ClientOrderOrchestrator<S>,
    pub supplier_orders: SupplierOrderOrchestrator<S>,
    pub sales: SaleOrchestrator<S>,
    pub history: ArticleHistoryAggregator<S>,
    pub guard: ConsistencyGuard<S>,
    pub supplier_photos: SupplierPhotoService<S, P>,
}

impl<S: EntityStore + Clone, P: PhotoStore> App<S, P> {
    pub fn new(store: S, photos: P) -> Self {
        Self {
            articles: ArticleService::new(store.clone()),
            categories: CategoryService::new(store.clone()),
            clients: ClientService::new(store.clone()),
            suppliers: SupplierService::new(store.clone()),
            client_orders: ClientOrderOrchestrator::new(store.clone()),
            supplier_orders: SupplierOrderOrchestrator::new(store.clone()),
            sales: SaleOrchestrator::new(store.clone()),
            history: ArticleHistoryAggregator::new(store.clone()),
            guard: ConsistencyGuard::new(store.clone()),
            supplier_photos: SupplierPhotoService::new(store, photos),
        }
    }
}

impl App<InMemoryEntityStore, InMemoryPhotoStore> {
    /// An application backed entirely by in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(InMemoryEntityStore::new(), InMemoryPhotoStore::new())
    }
}

impl<P: PhotoStore> App<PostgresEntityStore, P> {
    /// Connects to PostgreSQL, applies migrations and wires the services.
    pub async fn connect(config: &AppConfig, photos: P) -> Result<Self> {
        let store = PostgresEntityStore::connect(&config.store).await?;
        store.run_migrations().await?;
        tracing::info!("entity store migrations applied");
        Ok(Self::new(store, photos))
    }
}
