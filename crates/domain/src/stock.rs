//! Article stock movements.

use common::EntityId;
use entity_store::{Transaction, TransactionExt};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, ErrorCode, Result};
use crate::model::Article;

/// Which way a completed transaction moves stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockDirection {
    /// Goods received, stock goes up.
    Inbound,
    /// Goods handed out, stock goes down.
    Outbound,
}

impl StockDirection {
    /// Signed change in stock for `quantity` units.
    pub fn delta(&self, quantity: i64) -> i64 {
        match self {
            StockDirection::Inbound => quantity,
            StockDirection::Outbound => -quantity,
        }
    }

    /// The direction that undoes this one.
    pub fn reversed(&self) -> StockDirection {
        match self {
            StockDirection::Inbound => StockDirection::Outbound,
            StockDirection::Outbound => StockDirection::Inbound,
        }
    }
}

/// Moves `quantity` units of an article in `direction` and persists it.
///
/// Fails with `InsufficientStock` rather than letting stock go negative, and
/// with `StockOverflow` when the result does not fit; the caller's transaction
/// is then dropped, so nothing moved in it persists.
pub async fn apply_stock_movement<T: Transaction>(
    tx: &mut T,
    article_id: EntityId,
    quantity: i64,
    direction: StockDirection,
) -> Result<Article> {
    let mut article = tx.find::<Article>(article_id).await?.ok_or_else(|| {
        DomainError::not_found(
            ErrorCode::ArticleNotFound,
            format!("No article with id {article_id} found"),
        )
    })?;

    let Some(updated) = article.stock_quantity.checked_add(direction.delta(quantity)) else {
        return Err(DomainError::StockOverflow {
            article_code: article.code,
            available: article.stock_quantity,
            requested: quantity,
        });
    };
    if updated < 0 {
        return Err(DomainError::InsufficientStock {
            article_code: article.code,
            available: article.stock_quantity,
            requested: quantity,
        });
    }

    tracing::debug!(
        article = %article.code,
        from = article.stock_quantity,
        to = updated,
        "stock movement"
    );
    article.stock_quantity = updated;
    Ok(tx.persist(article).await?)
}

#[cfg(test)]
mod tests {
    use entity_store::{EntityStore, InMemoryEntityStore};

    use super::*;
    use crate::model::Money;

    #[test]
    fn direction_deltas() {
        assert_eq!(StockDirection::Inbound.delta(5), 5);
        assert_eq!(StockDirection::Outbound.delta(5), -5);
        assert_eq!(StockDirection::Outbound.reversed(), StockDirection::Inbound);
    }

    #[tokio::test]
    async fn movement_updates_stock() {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();
        let article = tx
            .persist(Article::new("A1", "Widget", Money::from_cents(100)).with_stock(3))
            .await
            .unwrap();
        let id = article.id.unwrap();

        let article = apply_stock_movement(&mut tx, id, 4, StockDirection::Inbound)
            .await
            .unwrap();
        assert_eq!(article.stock_quantity, 7);

        let article = apply_stock_movement(&mut tx, id, 7, StockDirection::Outbound)
            .await
            .unwrap();
        assert_eq!(article.stock_quantity, 0);
    }

    #[tokio::test]
    async fn movement_never_goes_negative() {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();
        let article = tx
            .persist(Article::new("A1", "Widget", Money::from_cents(100)).with_stock(2))
            .await
            .unwrap();

        let err = apply_stock_movement(&mut tx, article.id.unwrap(), 3, StockDirection::Outbound)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn movement_past_max_stock_is_rejected() {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();
        let article = tx
            .persist(Article::new("A1", "Widget", Money::from_cents(100)).with_stock(i64::MAX))
            .await
            .unwrap();
        let id = article.id.unwrap();

        let err = apply_stock_movement(&mut tx, id, 1, StockDirection::Inbound)
            .await
            .unwrap_err();
        assert_eq!(err.reason_code(), ErrorCode::StockOverflow);
        assert_eq!(tx.find::<Article>(id).await.unwrap().unwrap().stock_quantity, i64::MAX);
    }

    #[tokio::test]
    async fn movement_on_unknown_article_is_not_found() {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();

        let err = apply_stock_movement(
            &mut tx,
            EntityId::new(77).unwrap(),
            1,
            StockDirection::Inbound,
        )
        .await
        .unwrap_err();
        assert_eq!(err.reason_code(), ErrorCode::ArticleNotFound);
    }
}
