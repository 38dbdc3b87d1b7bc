use chrono::{DateTime, Utc};
use common::EntityId;
use entity_store::Entity;
use serde::{Deserialize, Serialize};

use super::order::validate_lines;
use super::{LineDraft, MAX_CODE_LEN, Money, fields};
use crate::validation::{Checker, Validate, Violation};

/// A direct sale, complete as soon as it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: Option<EntityId>,
    pub code: String,
    pub sale_date: DateTime<Utc>,
    pub comment: Option<String>,
}

impl Entity for Sale {
    const KIND: &'static str = "Sale";

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

/// One article sold, with the price it was sold at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub id: Option<EntityId>,
    pub sale_id: EntityId,
    pub article_id: EntityId,
    pub quantity: i64,
    pub unit_price: Money,
}

impl SaleLine {
    pub fn total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

impl Entity for SaleLine {
    const KIND: &'static str = "SaleLine";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn foreign_keys(&self) -> Vec<(&'static str, EntityId)> {
        vec![
            (fields::SALE, self.sale_id),
            (fields::ARTICLE, self.article_id),
        ]
    }
}

/// A sale header together with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleWithLines {
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
}

impl SaleWithLines {
    pub fn total(&self) -> Money {
        self.lines.iter().map(SaleLine::total).sum()
    }
}

/// A sale to be created together with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDraft {
    pub code: String,
    pub sale_date: Option<DateTime<Utc>>,
    pub comment: Option<String>,
    pub lines: Vec<LineDraft>,
}

impl SaleDraft {
    pub fn new(code: impl Into<String>, sale_date: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            sale_date: Some(sale_date),
            comment: None,
            lines: Vec::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_line(mut self, line: LineDraft) -> Self {
        self.lines.push(line);
        self
    }
}

impl Validate for SaleDraft {
    fn validate(&self) -> Vec<Violation> {
        let mut checker = Checker::new();
        checker
            .text("code", &self.code, MAX_CODE_LEN)
            .present("sale_date", &self.sale_date);
        validate_lines(&mut checker, &self.lines);
        checker.finish()
    }
}
