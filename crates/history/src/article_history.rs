use common::EntityId;
use domain::{ClientOrderLine, SaleLine, SupplierOrderLine};
use serde::Serialize;

/// Every line referencing one article, grouped by collection.
///
/// Each list keeps the insertion order of its collection; the lists are not
/// ordered relative to each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleHistory {
    pub article_id: EntityId,
    pub sales: Vec<SaleLine>,
    pub client_order_lines: Vec<ClientOrderLine>,
    pub supplier_order_lines: Vec<SupplierOrderLine>,
}

impl ArticleHistory {
    pub fn empty(article_id: EntityId) -> Self {
        Self {
            article_id,
            sales: Vec::new(),
            client_order_lines: Vec::new(),
            supplier_order_lines: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sales.is_empty()
            && self.client_order_lines.is_empty()
            && self.supplier_order_lines.is_empty()
    }

    /// Units sold directly.
    pub fn quantity_sold(&self) -> i64 {
        self.sales.iter().map(|line| line.quantity).sum()
    }

    /// Units ordered by clients, whatever the order status.
    pub fn quantity_ordered_by_clients(&self) -> i64 {
        self.client_order_lines.iter().map(|line| line.quantity).sum()
    }

    /// Units ordered from suppliers, whatever the order status.
    pub fn quantity_ordered_from_suppliers(&self) -> i64 {
        self.supplier_order_lines
            .iter()
            .map(|line| line.quantity)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use domain::Money;

    use super::*;

    fn id(raw: i64) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    #[test]
    fn totals_sum_each_collection() {
        let article = id(1);
        let mut history = ArticleHistory::empty(article);
        assert!(history.is_empty());

        history.sales.push(SaleLine {
            id: Some(id(10)),
            sale_id: id(2),
            article_id: article,
            quantity: 3,
            unit_price: Money::from_cents(100),
        });
        history
            .client_order_lines
            .push(ClientOrderLine::new(id(3), article, 5, Money::from_cents(100)));
        history
            .client_order_lines
            .push(ClientOrderLine::new(id(4), article, 1, Money::from_cents(100)));
        history
            .supplier_order_lines
            .push(SupplierOrderLine::new(id(5), article, 20, Money::from_cents(60)));

        assert!(!history.is_empty());
        assert_eq!(history.quantity_sold(), 3);
        assert_eq!(history.quantity_ordered_by_clients(), 6);
        assert_eq!(history.quantity_ordered_from_suppliers(), 20);
    }

    #[test]
    fn serializes_with_collection_names() {
        let json = serde_json::to_value(ArticleHistory::empty(id(7))).unwrap();
        assert_eq!(json["article_id"], 7);
        assert_eq!(json["sales"], serde_json::json!([]));
        assert_eq!(json["client_order_lines"], serde_json::json!([]));
        assert_eq!(json["supplier_order_lines"], serde_json::json!([]));
    }
}
