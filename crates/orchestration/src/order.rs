//! Order orchestrator: orders created together with their lines, then moved
//! through the status state machine.

use std::marker::PhantomData;

use chrono::Utc;
use common::EntityId;
use domain::model::fields;
use domain::{
    Article, ClientSide, DomainError, ErrorCode, LineDraft, ManagedEntity, Money, Order,
    OrderDraft, OrderLine, OrderSide, OrderStatus, OrderWithLines, Result, SupplierSide, Validate,
    Violation, ViolationReason, apply_stock_movement, ensure_valid, require_id,
};
use entity_store::{EntityStore, Transaction, TransactionExt};

/// Loads the article behind every draft line and fixes each line's price.
///
/// Returns `(article_id, quantity, unit_price)` per line, in draft order.
pub(crate) async fn resolve_lines<T, F>(
    tx: &mut T,
    lines: &[LineDraft],
    snapshot_price: F,
) -> Result<Vec<(EntityId, i64, Money)>>
where
    T: Transaction,
    F: Fn(&Article) -> Money,
{
    let mut resolved = Vec::with_capacity(lines.len());
    for line in lines {
        let article_id = require_id(line.article_id, Article::LABEL)?;
        let article = tx.find::<Article>(article_id).await?.ok_or_else(|| {
            DomainError::not_found(
                Article::NOT_FOUND,
                format!("Referenced article {article_id} not found"),
            )
        })?;
        let unit_price = line.unit_price.unwrap_or_else(|| snapshot_price(&article));
        resolved.push((article_id, line.quantity, unit_price));
    }
    Ok(resolved)
}

/// Rejects a code already used by another record of `kind`.
pub(crate) async fn ensure_code_free<T: Transaction>(
    tx: &mut T,
    kind: &str,
    code: &str,
    not_valid: ErrorCode,
    label: &str,
) -> Result<()> {
    if tx.get_by_code(kind, code).await?.is_some() {
        let violation = Violation::new(
            ViolationReason::DuplicateCode,
            "code",
            format!("code {code} is already used by another {label}"),
        );
        ensure_valid(not_valid, label, vec![violation])?;
    }
    Ok(())
}

/// Orchestrator for one side of the order flow.
pub struct OrderOrchestrator<S: EntityStore, K: OrderSide> {
    store: S,
    side: PhantomData<K>,
}

pub type ClientOrderOrchestrator<S> = OrderOrchestrator<S, ClientSide>;
pub type SupplierOrderOrchestrator<S> = OrderOrchestrator<S, SupplierSide>;

impl<S: EntityStore, K: OrderSide> OrderOrchestrator<S, K> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            side: PhantomData,
        }
    }

    fn not_found(id: EntityId) -> DomainError {
        DomainError::not_found(K::NOT_FOUND, format!("No {} with id {id} found", K::LABEL))
    }

    fn not_modifiable(order: &Order<K>) -> DomainError {
        DomainError::OrderNotModifiable {
            code: K::NOT_MODIFIABLE,
            order_code: order.code.clone(),
            status: order.status,
        }
    }

    async fn load(tx: &mut S::Tx, id: EntityId) -> Result<Order<K>> {
        tx.find::<Order<K>>(id)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    async fn lines_of(tx: &mut S::Tx, order_id: EntityId) -> Result<Vec<OrderLine<K>>> {
        Ok(tx
            .find_by_foreign_key::<OrderLine<K>>(fields::ORDER, order_id)
            .await?)
    }

    /// Creates an order and all of its lines, or nothing.
    ///
    /// Line prices are taken from the article unless the draft overrides
    /// them. Stock is not touched until the order is delivered.
    #[tracing::instrument(skip_all, fields(kind = K::ORDER_KIND, code = %draft.code))]
    pub async fn create_order(&self, draft: OrderDraft<K>) -> Result<OrderWithLines<K>> {
        ensure_valid(K::NOT_VALID, K::LABEL, draft.validate())?;
        let party_id = require_id(draft.party_id, <K::Party as ManagedEntity>::LABEL)?;
        let order_date = draft.order_date.unwrap_or_else(Utc::now);

        let mut tx = self.store.begin().await?;

        if tx.find::<K::Party>(party_id).await?.is_none() {
            return Err(DomainError::not_found(
                <K::Party as ManagedEntity>::NOT_FOUND,
                format!(
                    "No {} with id {party_id} found",
                    <K::Party as ManagedEntity>::LABEL
                ),
            ));
        }
        ensure_code_free(&mut tx, K::ORDER_KIND, &draft.code, K::NOT_VALID, K::LABEL).await?;
        let resolved = resolve_lines(&mut tx, &draft.lines, K::snapshot_price).await?;

        let order = tx
            .persist(Order::<K>::new(draft.code, order_date, party_id))
            .await?;
        let order_id = require_id(order.id, K::LABEL)?;

        let mut lines = Vec::with_capacity(resolved.len());
        for (article_id, quantity, unit_price) in resolved {
            let line = OrderLine::<K>::new(order_id, article_id, quantity, unit_price);
            lines.push(tx.persist(line).await?);
        }

        tx.commit().await?;

        metrics::counter!("stock_orders_created_total", "kind" => K::ORDER_KIND).increment(1);
        tracing::info!(%order_id, lines = lines.len(), "{} created", K::LABEL);
        Ok(OrderWithLines { order, lines })
    }

    #[tracing::instrument(skip_all, fields(kind = K::ORDER_KIND))]
    pub async fn find_by_id(
        &self,
        id: impl Into<Option<EntityId>>,
    ) -> Result<OrderWithLines<K>> {
        let id = require_id(id.into(), K::LABEL)?;
        let mut tx = self.store.begin().await?;
        let order = Self::load(&mut tx, id).await?;
        let lines = Self::lines_of(&mut tx, id).await?;
        tx.rollback().await?;
        Ok(OrderWithLines { order, lines })
    }

    #[tracing::instrument(skip(self), fields(kind = K::ORDER_KIND))]
    pub async fn find_by_code(&self, code: &str) -> Result<OrderWithLines<K>> {
        let mut tx = self.store.begin().await?;
        let order = tx.find_by_code::<Order<K>>(code).await?.ok_or_else(|| {
            DomainError::not_found(K::NOT_FOUND, format!("No {} with code {code} found", K::LABEL))
        })?;
        let id = require_id(order.id, K::LABEL)?;
        let lines = Self::lines_of(&mut tx, id).await?;
        tx.rollback().await?;
        Ok(OrderWithLines { order, lines })
    }

    pub async fn find_all(&self) -> Result<Vec<Order<K>>> {
        let mut tx = self.store.begin().await?;
        let orders = tx.find_all::<Order<K>>().await?;
        tx.rollback().await?;
        Ok(orders)
    }

    /// Lines of an order, in the order they were created.
    pub async fn find_lines(
        &self,
        order_id: impl Into<Option<EntityId>>,
    ) -> Result<Vec<OrderLine<K>>> {
        let order_id = require_id(order_id.into(), K::LABEL)?;
        let mut tx = self.store.begin().await?;
        let lines = Self::lines_of(&mut tx, order_id).await?;
        tx.rollback().await?;
        Ok(lines)
    }

    /// Moves an order to `next`, which must directly follow its stored status.
    ///
    /// Reaching `LIVREE` applies every line to article stock in the same
    /// transaction; if any article would go negative nothing changes.
    #[tracing::instrument(skip(self, order_id), fields(kind = K::ORDER_KIND))]
    pub async fn update_status(
        &self,
        order_id: impl Into<Option<EntityId>>,
        next: OrderStatus,
    ) -> Result<Order<K>> {
        let order_id = require_id(order_id.into(), K::LABEL)?;
        let mut tx = self.store.begin().await?;
        let mut order = Self::load(&mut tx, order_id).await?;

        if !order.status.is_modifiable() {
            return Err(Self::not_modifiable(&order));
        }
        if !order.status.can_transition_to(next) {
            return Err(DomainError::InvalidStatusTransition {
                code: K::STATUS_NOT_VALID,
                from: order.status,
                to: next,
            });
        }

        if next == OrderStatus::Delivered {
            for line in Self::lines_of(&mut tx, order_id).await? {
                apply_stock_movement(&mut tx, line.article_id, line.quantity, K::STOCK_DIRECTION)
                    .await?;
            }
        }

        let previous = order.status;
        order.status = next;
        let order = tx.persist(order).await?;
        tx.commit().await?;

        tracing::info!(%order_id, from = %previous, to = %next, "{} status updated", K::LABEL);
        Ok(order)
    }

    /// Deletes an order with its lines. Delivered orders are kept.
    #[tracing::instrument(skip_all, fields(kind = K::ORDER_KIND))]
    pub async fn delete_order(&self, order_id: impl Into<Option<EntityId>>) -> Result<()> {
        let order_id = require_id(order_id.into(), K::LABEL)?;
        let mut tx = self.store.begin().await?;
        let order = Self::load(&mut tx, order_id).await?;

        if !order.status.is_modifiable() {
            return Err(Self::not_modifiable(&order));
        }

        let lines = Self::lines_of(&mut tx, order_id).await?;
        for line in &lines {
            let line_id = require_id(line.id, "order line")?;
            tx.remove::<OrderLine<K>>(line_id).await?;
        }
        tx.remove::<Order<K>>(order_id).await?;
        tx.commit().await?;

        tracing::info!(%order_id, lines = lines.len(), "{} deleted", K::LABEL);
        Ok(())
    }
}
