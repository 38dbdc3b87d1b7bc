//! Sale orchestrator. A sale is complete when recorded, so its lines take
//! stock out immediately.

use chrono::Utc;
use common::EntityId;
use domain::model::fields;
use domain::{
    DomainError, ErrorCode, Result, Sale, SaleDraft, SaleLine, SaleWithLines, StockDirection,
    Validate, apply_stock_movement, ensure_valid, require_id,
};
use entity_store::{Entity, EntityStore, Transaction, TransactionExt};

use crate::order::{ensure_code_free, resolve_lines};

const LABEL: &str = "sale";

pub struct SaleOrchestrator<S: EntityStore> {
    store: S,
}

impl<S: EntityStore> SaleOrchestrator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn not_found(id: EntityId) -> DomainError {
        DomainError::not_found(ErrorCode::SaleNotFound, format!("No sale with id {id} found"))
    }

    async fn lines_of(tx: &mut S::Tx, sale_id: EntityId) -> Result<Vec<SaleLine>> {
        Ok(tx
            .find_by_foreign_key::<SaleLine>(fields::SALE, sale_id)
            .await?)
    }

    /// Records a sale with its lines and takes the sold units out of stock.
    ///
    /// Fails as a whole with `InsufficientStock` if any article runs short.
    #[tracing::instrument(skip_all, fields(code = %draft.code))]
    pub async fn create_sale(&self, draft: SaleDraft) -> Result<SaleWithLines> {
        ensure_valid(ErrorCode::SaleNotValid, LABEL, draft.validate())?;
        let sale_date = draft.sale_date.unwrap_or_else(Utc::now);

        let mut tx = self.store.begin().await?;
        ensure_code_free(&mut tx, Sale::KIND, &draft.code, ErrorCode::SaleNotValid, LABEL).await?;
        let resolved = resolve_lines(&mut tx, &draft.lines, |article| article.unit_price).await?;

        let sale = tx
            .persist(Sale {
                id: None,
                code: draft.code,
                sale_date,
                comment: draft.comment,
            })
            .await?;
        let sale_id = require_id(sale.id, LABEL)?;

        let mut lines = Vec::with_capacity(resolved.len());
        for (article_id, quantity, unit_price) in resolved {
            apply_stock_movement(&mut tx, article_id, quantity, StockDirection::Outbound).await?;
            let line = SaleLine {
                id: None,
                sale_id,
                article_id,
                quantity,
                unit_price,
            };
            lines.push(tx.persist(line).await?);
        }

        tx.commit().await?;

        metrics::counter!("stock_orders_created_total", "kind" => Sale::KIND).increment(1);
        tracing::info!(%sale_id, lines = lines.len(), "sale created");
        Ok(SaleWithLines { sale, lines })
    }

    #[tracing::instrument(skip_all)]
    pub async fn find_by_id(&self, id: impl Into<Option<EntityId>>) -> Result<SaleWithLines> {
        let id = require_id(id.into(), LABEL)?;
        let mut tx = self.store.begin().await?;
        let sale = tx
            .find::<Sale>(id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;
        let lines = Self::lines_of(&mut tx, id).await?;
        tx.rollback().await?;
        Ok(SaleWithLines { sale, lines })
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_by_code(&self, code: &str) -> Result<SaleWithLines> {
        let mut tx = self.store.begin().await?;
        let sale = tx.find_by_code::<Sale>(code).await?.ok_or_else(|| {
            DomainError::not_found(
                ErrorCode::SaleNotFound,
                format!("No sale with code {code} found"),
            )
        })?;
        let id = require_id(sale.id, LABEL)?;
        let lines = Self::lines_of(&mut tx, id).await?;
        tx.rollback().await?;
        Ok(SaleWithLines { sale, lines })
    }

    pub async fn find_all(&self) -> Result<Vec<Sale>> {
        let mut tx = self.store.begin().await?;
        let sales = tx.find_all::<Sale>().await?;
        tx.rollback().await?;
        Ok(sales)
    }

    /// Deletes a sale and its lines, putting the sold units back in stock.
    #[tracing::instrument(skip_all)]
    pub async fn delete_sale(&self, id: impl Into<Option<EntityId>>) -> Result<()> {
        let id = require_id(id.into(), LABEL)?;
        let mut tx = self.store.begin().await?;
        if tx.find::<Sale>(id).await?.is_none() {
            return Err(Self::not_found(id));
        }

        let lines = Self::lines_of(&mut tx, id).await?;
        for line in &lines {
            apply_stock_movement(
                &mut tx,
                line.article_id,
                line.quantity,
                StockDirection::Outbound.reversed(),
            )
            .await?;
            tx.remove::<SaleLine>(require_id(line.id, "sale line")?).await?;
        }
        tx.remove::<Sale>(id).await?;
        tx.commit().await?;

        tracing::info!(sale_id = %id, lines = lines.len(), "sale deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use domain::{Article, LineDraft, Money};
    use entity_store::InMemoryEntityStore;

    use super::*;

    async fn setup(stock: i64) -> (InMemoryEntityStore, EntityId) {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();
        let article = tx
            .persist(Article::new("A1", "Widget", Money::from_cents(300)).with_stock(stock))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        (store, article.id.unwrap())
    }

    async fn stock_of(store: &InMemoryEntityStore, article: EntityId) -> i64 {
        let mut tx = store.begin().await.unwrap();
        tx.find::<Article>(article)
            .await
            .unwrap()
            .unwrap()
            .stock_quantity
    }

    #[tokio::test]
    async fn sale_takes_stock_out_and_delete_restores_it() {
        let (store, article) = setup(5).await;
        let sales = SaleOrchestrator::new(store.clone());

        let sale = sales
            .create_sale(SaleDraft::new("V-1", Utc::now()).with_line(LineDraft::new(article, 3)))
            .await
            .unwrap();
        assert_eq!(sale.lines[0].unit_price, Money::from_cents(300));
        assert_eq!(stock_of(&store, article).await, 2);

        sales.delete_sale(sale.sale.id).await.unwrap();
        assert_eq!(stock_of(&store, article).await, 5);
        assert!(sales.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sale_beyond_stock_persists_nothing() {
        let (store, article) = setup(1).await;
        let sales = SaleOrchestrator::new(store.clone());

        let err = sales
            .create_sale(SaleDraft::new("V-1", Utc::now()).with_line(LineDraft::new(article, 2)))
            .await
            .unwrap_err();

        assert_eq!(err.reason_code(), ErrorCode::StockInsufficient);
        assert_eq!(stock_of(&store, article).await, 1);
        assert_eq!(store.record_count(Sale::KIND).await, 0);
        assert_eq!(store.record_count(SaleLine::KIND).await, 0);
    }

    #[tokio::test]
    async fn unknown_sale_is_not_found() {
        let (store, _) = setup(0).await;
        let sales = SaleOrchestrator::new(store);

        let err = sales.find_by_code("V-404").await.unwrap_err();
        assert_eq!(err.reason_code(), ErrorCode::SaleNotFound);
        let err = sales.delete_sale(EntityId::new(404).unwrap()).await.unwrap_err();
        assert_eq!(err.reason_code(), ErrorCode::SaleNotFound);
    }
}
