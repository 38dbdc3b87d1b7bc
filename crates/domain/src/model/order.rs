use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use common::EntityId;
use entity_store::Entity;
use serde::{Deserialize, Serialize};

use super::{Article, Client, MAX_CODE_LEN, Money, Supplier, fields};
use crate::error::ErrorCode;
use crate::services::ManagedEntity;
use crate::state::OrderStatus;
use crate::stock::StockDirection;
use crate::validation::{Checker, Validate, Violation};

/// Distinguishes client orders from supplier orders.
///
/// Both sides share the same header/line structure; the side decides which
/// party owns the order, how line prices are snapshotted, and which way
/// delivery moves stock.
pub trait OrderSide:
    std::fmt::Debug + Clone + Copy + PartialEq + Eq + Default + Send + Sync + 'static
{
    /// The party owning orders of this side.
    type Party: ManagedEntity;

    const ORDER_KIND: &'static str;
    const LINE_KIND: &'static str;
    /// Foreign key from the order header to its party.
    const PARTY_FIELD: &'static str;
    /// Human label, e.g. "client order".
    const LABEL: &'static str;
    const STOCK_DIRECTION: StockDirection;

    const NOT_FOUND: ErrorCode;
    const NOT_VALID: ErrorCode;
    const NOT_MODIFIABLE: ErrorCode;
    const STATUS_NOT_VALID: ErrorCode;

    /// Price recorded on a line when no override is given.
    fn snapshot_price(article: &Article) -> Money;
}

/// Orders placed by clients; delivery takes stock out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientSide;

impl OrderSide for ClientSide {
    type Party = Client;

    const ORDER_KIND: &'static str = "ClientOrder";
    const LINE_KIND: &'static str = "ClientOrderLine";
    const PARTY_FIELD: &'static str = fields::CLIENT;
    const LABEL: &'static str = "client order";
    const STOCK_DIRECTION: StockDirection = StockDirection::Outbound;

    const NOT_FOUND: ErrorCode = ErrorCode::ClientOrderNotFound;
    const NOT_VALID: ErrorCode = ErrorCode::ClientOrderNotValid;
    const NOT_MODIFIABLE: ErrorCode = ErrorCode::ClientOrderNotModifiable;
    const STATUS_NOT_VALID: ErrorCode = ErrorCode::ClientOrderStatusNotValid;

    fn snapshot_price(article: &Article) -> Money {
        article.unit_price
    }
}

/// Orders sent to suppliers; delivery brings stock in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SupplierSide;

impl OrderSide for SupplierSide {
    type Party = Supplier;

    const ORDER_KIND: &'static str = "SupplierOrder";
    const LINE_KIND: &'static str = "SupplierOrderLine";
    const PARTY_FIELD: &'static str = fields::SUPPLIER;
    const LABEL: &'static str = "supplier order";
    const STOCK_DIRECTION: StockDirection = StockDirection::Inbound;

    const NOT_FOUND: ErrorCode = ErrorCode::SupplierOrderNotFound;
    const NOT_VALID: ErrorCode = ErrorCode::SupplierOrderNotValid;
    const NOT_MODIFIABLE: ErrorCode = ErrorCode::SupplierOrderNotModifiable;
    const STATUS_NOT_VALID: ErrorCode = ErrorCode::SupplierOrderStatusNotValid;

    fn snapshot_price(article: &Article) -> Money {
        article.buying_price
    }
}

/// Order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Order<K: OrderSide> {
    pub id: Option<EntityId>,
    pub code: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    /// Owning client or supplier.
    pub party_id: EntityId,
    #[serde(skip)]
    side: PhantomData<K>,
}

impl<K: OrderSide> Order<K> {
    pub fn new(code: impl Into<String>, order_date: DateTime<Utc>, party_id: EntityId) -> Self {
        Self {
            id: None,
            code: code.into(),
            order_date,
            status: OrderStatus::default(),
            party_id,
            side: PhantomData,
        }
    }
}

impl<K: OrderSide> Entity for Order<K> {
    const KIND: &'static str = K::ORDER_KIND;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn code(&self) -> Option<&str> {
        Some(&self.code)
    }

    fn foreign_keys(&self) -> Vec<(&'static str, EntityId)> {
        vec![(K::PARTY_FIELD, self.party_id)]
    }
}

/// One article on an order, with the price it was ordered at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct OrderLine<K: OrderSide> {
    pub id: Option<EntityId>,
    pub order_id: EntityId,
    pub article_id: EntityId,
    pub quantity: i64,
    /// Price snapshot taken when the line was created.
    pub unit_price: Money,
    #[serde(skip)]
    side: PhantomData<K>,
}

impl<K: OrderSide> OrderLine<K> {
    pub fn new(order_id: EntityId, article_id: EntityId, quantity: i64, unit_price: Money) -> Self {
        Self {
            id: None,
            order_id,
            article_id,
            quantity,
            unit_price,
            side: PhantomData,
        }
    }

    pub fn total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

impl<K: OrderSide> Entity for OrderLine<K> {
    const KIND: &'static str = K::LINE_KIND;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn foreign_keys(&self) -> Vec<(&'static str, EntityId)> {
        vec![
            (fields::ORDER, self.order_id),
            (fields::ARTICLE, self.article_id),
        ]
    }
}

/// An order header together with its lines, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(bound = "")]
pub struct OrderWithLines<K: OrderSide> {
    pub order: Order<K>,
    pub lines: Vec<OrderLine<K>>,
}

impl<K: OrderSide> OrderWithLines<K> {
    pub fn total(&self) -> Money {
        self.lines.iter().map(OrderLine::total).sum()
    }
}

/// A line submitted inline with an order or sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDraft {
    pub article_id: Option<EntityId>,
    pub quantity: i64,
    /// Explicit price; the article's current price is used when absent.
    pub unit_price: Option<Money>,
}

impl LineDraft {
    pub fn new(article_id: EntityId, quantity: i64) -> Self {
        Self {
            article_id: Some(article_id),
            quantity,
            unit_price: None,
        }
    }

    pub fn at_price(mut self, unit_price: Money) -> Self {
        self.unit_price = Some(unit_price);
        self
    }
}

impl Validate for LineDraft {
    fn validate(&self) -> Vec<Violation> {
        let mut checker = Checker::new();
        checker
            .reference("article_id", &self.article_id)
            .positive("quantity", self.quantity);
        if let Some(price) = self.unit_price {
            checker.non_negative_money("unit_price", price);
        }
        checker.finish()
    }
}

/// Validates each line of a draft, prefixing messages with the line number.
pub(crate) fn validate_lines(checker: &mut Checker, lines: &[LineDraft]) {
    for (index, line) in lines.iter().enumerate() {
        checker.nested(&format!("line {}", index + 1), line.validate());
    }
}

/// An order to be created together with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct OrderDraft<K: OrderSide> {
    pub code: String,
    pub order_date: Option<DateTime<Utc>>,
    pub party_id: Option<EntityId>,
    pub lines: Vec<LineDraft>,
    #[serde(skip)]
    side: PhantomData<K>,
}

impl<K: OrderSide> OrderDraft<K> {
    pub fn new(code: impl Into<String>, party_id: EntityId, order_date: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            order_date: Some(order_date),
            party_id: Some(party_id),
            lines: Vec::new(),
            side: PhantomData,
        }
    }

    pub fn with_line(mut self, line: LineDraft) -> Self {
        self.lines.push(line);
        self
    }
}

impl<K: OrderSide> Validate for OrderDraft<K> {
    fn validate(&self) -> Vec<Violation> {
        let mut checker = Checker::new();
        checker
            .text("code", &self.code, MAX_CODE_LEN)
            .present("order_date", &self.order_date)
            .reference(K::PARTY_FIELD, &self.party_id);
        validate_lines(&mut checker, &self.lines);
        checker.finish()
    }
}

pub type ClientOrder = Order<ClientSide>;
pub type ClientOrderLine = OrderLine<ClientSide>;
pub type SupplierOrder = Order<SupplierSide>;
pub type SupplierOrderLine = OrderLine<SupplierSide>;
