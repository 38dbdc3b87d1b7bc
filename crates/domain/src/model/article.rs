use common::EntityId;
use entity_store::Entity;
use serde::{Deserialize, Serialize};

use super::{MAX_CODE_LEN, MAX_TEXT_LEN, Money, fields};
use crate::validation::{Checker, Validate, Violation};

/// A stock-keeping unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: Option<EntityId>,
    pub code: String,
    pub designation: String,
    /// Selling price per unit.
    pub unit_price: Money,
    /// Purchase price per unit, snapshotted on supplier order lines.
    pub buying_price: Money,
    /// Quantity on hand; never negative once a transaction is applied.
    pub stock_quantity: i64,
    pub category_id: Option<EntityId>,
}

impl Article {
    pub fn new(code: impl Into<String>, designation: impl Into<String>, unit_price: Money) -> Self {
        Self {
            id: None,
            code: code.into(),
            designation: designation.into(),
            unit_price,
            buying_price: Money::zero(),
            stock_quantity: 0,
            category_id: None,
        }
    }

    pub fn with_buying_price(mut self, buying_price: Money) -> Self {
        self.buying_price = buying_price;
        self
    }

    pub fn with_stock(mut self, quantity: i64) -> Self {
        self.stock_quantity = quantity;
        self
    }

    pub fn in_category(mut self, category_id: EntityId) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

impl Entity for Article {
    const KIND: &'static str = "Article";

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
        self.category_id
            .map(|category| (fields::CATEGORY, category))
            .into_iter()
            .collect()
    }
}

impl Validate for Article {
    fn validate(&self) -> Vec<Violation> {
        Checker::new()
            .text("code", &self.code, MAX_CODE_LEN)
            .text("designation", &self.designation, MAX_TEXT_LEN)
            .non_negative_money("unit_price", self.unit_price)
            .non_negative_money("buying_price", self.buying_price)
            .non_negative("stock_quantity", self.stock_quantity)
            .finish()
    }
}

/// A grouping of articles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Option<EntityId>,
    pub code: String,
    pub designation: String,
}

impl Category {
    pub fn new(code: impl Into<String>, designation: impl Into<String>) -> Self {
        Self {
            id: None,
            code: code.into(),
            designation: designation.into(),
        }
    }
}

impl Entity for Category {
    const KIND: &'static str = "Category";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn code(&self) -> Option<&str> {
        Some(&self.code)
    }
}

impl Validate for Category {
    fn validate(&self) -> Vec<Violation> {
        Checker::new()
            .text("code", &self.code, MAX_CODE_LEN)
            .text("designation", &self.designation, MAX_TEXT_LEN)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ViolationReason;

    #[test]
    fn valid_article_has_no_violations() {
        let article = Article::new("ART-1", "Hammer", Money::from_cents(1299)).with_stock(4);
        assert!(article.validate().is_empty());
    }

    #[test]
    fn article_requires_code_and_designation() {
        let article = Article::new("", " ", Money::zero());
        let fields: Vec<_> = article.validate().iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["code", "designation"]);
    }

    #[test]
    fn article_rejects_negative_price_and_stock() {
        let article = Article::new("ART-1", "Hammer", Money::from_cents(-1)).with_stock(-2);
        let violations = article.validate();
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| v.reason == ViolationReason::Negative));
    }

    #[test]
    fn article_exposes_category_foreign_key() {
        let category = EntityId::new(8).unwrap();
        let article = Article::new("ART-1", "Hammer", Money::zero()).in_category(category);
        assert_eq!(article.foreign_keys(), vec![(fields::CATEGORY, category)]);
        assert!(
            Article::new("ART-2", "Saw", Money::zero())
                .foreign_keys()
                .is_empty()
        );
    }

    #[test]
    fn category_requires_code() {
        let violations = Category::new("", "Tools").validate();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "code");
    }
}
