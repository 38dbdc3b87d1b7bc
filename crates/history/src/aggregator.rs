use common::EntityId;
use domain::{ClientOrderLine, Result, SaleLine, SupplierOrderLine, model::fields, require_id};
use entity_store::{Entity, EntityStore, Transaction, TransactionExt};

use crate::ArticleHistory;

/// Builds article histories from the current store state.
///
/// Nothing is cached: every call opens its own read transaction. An id with
/// no lines, including one no article has, yields empty lists.
pub struct ArticleHistoryAggregator<S: EntityStore> {
    store: S,
}

impl<S: EntityStore> ArticleHistoryAggregator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Sale lines, client order lines and supplier order lines of an article.
    #[tracing::instrument(skip_all)]
    pub async fn history_for(
        &self,
        article_id: impl Into<Option<EntityId>>,
    ) -> Result<ArticleHistory> {
        let article_id = require_id(article_id.into(), "article")?;
        metrics::counter!("stock_history_queries_total", "collection" => "all").increment(1);

        let mut tx = self.store.begin().await?;
        let history = ArticleHistory {
            article_id,
            sales: tx
                .find_by_foreign_key::<SaleLine>(fields::ARTICLE, article_id)
                .await?,
            client_order_lines: tx
                .find_by_foreign_key::<ClientOrderLine>(fields::ARTICLE, article_id)
                .await?,
            supplier_order_lines: tx
                .find_by_foreign_key::<SupplierOrderLine>(fields::ARTICLE, article_id)
                .await?,
        };
        tx.rollback().await?;

        tracing::debug!(
            %article_id,
            sales = history.sales.len(),
            client_order_lines = history.client_order_lines.len(),
            supplier_order_lines = history.supplier_order_lines.len(),
            "article history built"
        );
        Ok(history)
    }

    pub async fn sales_history(
        &self,
        article_id: impl Into<Option<EntityId>>,
    ) -> Result<Vec<SaleLine>> {
        self.lines_of(article_id.into()).await
    }

    pub async fn client_order_history(
        &self,
        article_id: impl Into<Option<EntityId>>,
    ) -> Result<Vec<ClientOrderLine>> {
        self.lines_of(article_id.into()).await
    }

    pub async fn supplier_order_history(
        &self,
        article_id: impl Into<Option<EntityId>>,
    ) -> Result<Vec<SupplierOrderLine>> {
        self.lines_of(article_id.into()).await
    }

    async fn lines_of<E: Entity>(&self, article_id: Option<EntityId>) -> Result<Vec<E>> {
        let article_id = require_id(article_id, "article")?;
        metrics::counter!("stock_history_queries_total", "collection" => E::KIND).increment(1);

        let mut tx = self.store.begin().await?;
        let lines = tx.find_by_foreign_key::<E>(fields::ARTICLE, article_id).await?;
        tx.rollback().await?;
        Ok(lines)
    }
}
