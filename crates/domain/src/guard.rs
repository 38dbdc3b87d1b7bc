//! Consistency guards run before deletes.
//!
//! A guard only reads. Services evaluate it inside the same transaction as
//! the delete it protects, so a dependent record cannot appear between the
//! check and the delete.

use common::EntityId;
use entity_store::{Entity, EntityStore, StoreError, Transaction};
use serde::Serialize;

use crate::error::{DomainError, ErrorCode, Result};
use crate::model::{
    Article, ClientOrder, ClientOrderLine, SaleLine, SupplierOrder, SupplierOrderLine, fields,
};

/// An entity whose deletion must be checked for dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    Article(EntityId),
    Category(EntityId),
    Client(EntityId),
    Supplier(EntityId),
}

impl DeleteTarget {
    pub fn id(&self) -> EntityId {
        match self {
            DeleteTarget::Article(id)
            | DeleteTarget::Category(id)
            | DeleteTarget::Client(id)
            | DeleteTarget::Supplier(id) => *id,
        }
    }

    /// Foreign key field through which dependents reference the target.
    fn field(&self) -> &'static str {
        match self {
            DeleteTarget::Article(_) => fields::ARTICLE,
            DeleteTarget::Category(_) => fields::CATEGORY,
            DeleteTarget::Client(_) => fields::CLIENT,
            DeleteTarget::Supplier(_) => fields::SUPPLIER,
        }
    }

    /// Every collection that may reference the target; any match blocks.
    fn dependent_collections(&self) -> &'static [Dependents] {
        match self {
            DeleteTarget::Article(_) => &[
                Dependents::SaleLines,
                Dependents::ClientOrderLines,
                Dependents::SupplierOrderLines,
            ],
            DeleteTarget::Category(_) => &[Dependents::Articles],
            DeleteTarget::Client(_) => &[Dependents::ClientOrders],
            DeleteTarget::Supplier(_) => &[Dependents::SupplierOrders],
        }
    }
}

/// A collection of records that can block a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dependents {
    Articles,
    ClientOrders,
    SupplierOrders,
    SaleLines,
    ClientOrderLines,
    SupplierOrderLines,
}

impl Dependents {
    /// Record kind of the collection.
    pub fn kind(&self) -> &'static str {
        match self {
            Dependents::Articles => Article::KIND,
            Dependents::ClientOrders => ClientOrder::KIND,
            Dependents::SupplierOrders => SupplierOrder::KIND,
            Dependents::SaleLines => SaleLine::KIND,
            Dependents::ClientOrderLines => ClientOrderLine::KIND,
            Dependents::SupplierOrderLines => SupplierOrderLine::KIND,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Dependents::Articles => "articles",
            Dependents::ClientOrders => "client orders",
            Dependents::SupplierOrders => "supplier orders",
            Dependents::SaleLines => "sale lines",
            Dependents::ClientOrderLines => "client order lines",
            Dependents::SupplierOrderLines => "supplier order lines",
        }
    }
}

impl std::fmt::Display for Dependents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Outcome of a delete check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteVerdict {
    Allowed,
    Blocked { dependents: Dependents, count: u64 },
}

impl DeleteVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, DeleteVerdict::Allowed)
    }

    /// Turns a blocked verdict into an `EntityInUse` error.
    pub fn ensure_allowed(self, code: ErrorCode, label: &str) -> Result<()> {
        match self {
            DeleteVerdict::Allowed => Ok(()),
            DeleteVerdict::Blocked { dependents, count } => {
                metrics::counter!("stock_deletes_blocked_total", "dependents" => dependents.kind())
                    .increment(1);
                tracing::warn!(%label, %dependents, count, "delete blocked");
                Err(DomainError::in_use(
                    code,
                    format!(
                        "Cannot delete {label}: entity in use by {count} dependent {dependents}"
                    ),
                    dependents,
                ))
            }
        }
    }
}

/// Checks whether `target` can be deleted within `tx`.
pub async fn check_delete<T: Transaction>(
    tx: &mut T,
    target: DeleteTarget,
) -> std::result::Result<DeleteVerdict, StoreError> {
    for dependents in target.dependent_collections() {
        let count = tx
            .count_by_foreign_key(dependents.kind(), target.field(), target.id())
            .await?;
        if count > 0 {
            return Ok(DeleteVerdict::Blocked {
                dependents: *dependents,
                count,
            });
        }
    }
    Ok(DeleteVerdict::Allowed)
}

/// Stand-alone guard for callers that only want to ask.
pub struct ConsistencyGuard<S: EntityStore> {
    store: S,
}

impl<S: EntityStore> ConsistencyGuard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reports whether `target` could be deleted right now.
    ///
    /// The answer may be stale by the time a delete runs; services re-check
    /// inside their own transaction.
    #[tracing::instrument(skip(self))]
    pub async fn can_delete(&self, target: DeleteTarget) -> Result<DeleteVerdict> {
        let mut tx = self.store.begin().await?;
        let verdict = check_delete(&mut tx, target).await?;
        tx.rollback().await?;
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use entity_store::{InMemoryEntityStore, TransactionExt};

    use super::*;
    use crate::model::{Category, Client, Money};

    fn id(raw: i64) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn client_without_orders_is_deletable() {
        let store = InMemoryEntityStore::new();
        let guard = ConsistencyGuard::new(store.clone());

        let verdict = guard.can_delete(DeleteTarget::Client(id(1))).await.unwrap();
        assert!(verdict.is_allowed());
    }

    #[tokio::test]
    async fn client_with_order_is_blocked() {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();
        let client = tx
            .persist(Client::new("C001", "Dupont").with_email("d@example.com"))
            .await
            .unwrap();
        let client_id = client.id.unwrap();
        tx.persist(ClientOrder::new("O-100", Utc::now(), client_id))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let guard = ConsistencyGuard::new(store);
        let verdict = guard
            .can_delete(DeleteTarget::Client(client_id))
            .await
            .unwrap();
        assert_eq!(
            verdict,
            DeleteVerdict::Blocked {
                dependents: Dependents::ClientOrders,
                count: 1
            }
        );
    }

    #[tokio::test]
    async fn article_checks_every_line_collection() {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();
        let article = tx
            .persist(Article::new("A1", "Widget", Money::from_cents(100)))
            .await
            .unwrap();
        let article_id = article.id.unwrap();

        // Only a supplier order line references the article
        tx.persist(SupplierOrderLine::new(
            id(900),
            article_id,
            2,
            Money::from_cents(80),
        ))
        .await
        .unwrap();

        let verdict = check_delete(&mut tx, DeleteTarget::Article(article_id))
            .await
            .unwrap();
        assert_eq!(
            verdict,
            DeleteVerdict::Blocked {
                dependents: Dependents::SupplierOrderLines,
                count: 1
            }
        );
    }

    #[tokio::test]
    async fn category_with_articles_is_blocked() {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();
        let category = tx.persist(Category::new("CAT", "Tools")).await.unwrap();
        let category_id = category.id.unwrap();
        tx.persist(Article::new("A1", "Hammer", Money::zero()).in_category(category_id))
            .await
            .unwrap();

        let verdict = check_delete(&mut tx, DeleteTarget::Category(category_id))
            .await
            .unwrap();
        assert!(!verdict.is_allowed());
    }

    #[test]
    fn blocked_verdict_becomes_entity_in_use() {
        let verdict = DeleteVerdict::Blocked {
            dependents: Dependents::ClientOrders,
            count: 2,
        };
        let err = verdict
            .ensure_allowed(ErrorCode::ClientAlreadyInUse, "client C001")
            .unwrap_err();

        assert_eq!(err.reason_code(), ErrorCode::ClientAlreadyInUse);
        assert_eq!(
            err.to_string(),
            "Cannot delete client C001: entity in use by 2 dependent client orders"
        );
        assert!(matches!(
            err,
            DomainError::EntityInUse {
                blocked_by: Dependents::ClientOrders,
                ..
            }
        ));
    }
}
