//! Integration tests: lines persisted across the three collections →
//! ArticleHistoryAggregator.

use chrono::Utc;
use domain::{
    Article, ClientOrder, ClientOrderLine, Money, Sale, SaleLine, SupplierOrder,
    SupplierOrderLine,
};
use entity_store::{EntityId, EntityStore, InMemoryEntityStore, Transaction, TransactionExt};
use history::{ArticleHistory, ArticleHistoryAggregator};

struct Fixture {
    store: InMemoryEntityStore,
    hammer: EntityId,
    saw: EntityId,
}

/// Two articles, one sale, one client order and one supplier order, with
/// lines interleaved between the articles.
async fn setup() -> Fixture {
    let store = InMemoryEntityStore::new();
    let mut tx = store.begin().await.unwrap();

    let hammer = tx
        .persist(Article::new("HAM", "Hammer", Money::from_cents(1500)))
        .await
        .unwrap()
        .id
        .unwrap();
    let saw = tx
        .persist(Article::new("SAW", "Saw", Money::from_cents(2500)))
        .await
        .unwrap()
        .id
        .unwrap();

    let sale = tx
        .persist(Sale {
            id: None,
            code: "V-1".to_string(),
            sale_date: Utc::now(),
            comment: None,
        })
        .await
        .unwrap()
        .id
        .unwrap();
    let client_order = tx
        .persist(ClientOrder::new("O-1", Utc::now(), EntityId::new(100).unwrap()))
        .await
        .unwrap()
        .id
        .unwrap();
    let supplier_order = tx
        .persist(SupplierOrder::new("PO-1", Utc::now(), EntityId::new(200).unwrap()))
        .await
        .unwrap()
        .id
        .unwrap();

    for (article, quantity) in [(hammer, 1), (saw, 2), (hammer, 3)] {
        tx.persist(SaleLine {
            id: None,
            sale_id: sale,
            article_id: article,
            quantity,
            unit_price: Money::from_cents(1500),
        })
        .await
        .unwrap();
        tx.persist(ClientOrderLine::new(
            client_order,
            article,
            quantity * 10,
            Money::from_cents(1500),
        ))
        .await
        .unwrap();
    }
    tx.persist(SupplierOrderLine::new(
        supplier_order,
        saw,
        50,
        Money::from_cents(900),
    ))
    .await
    .unwrap();

    tx.commit().await.unwrap();
    Fixture { store, hammer, saw }
}

#[tokio::test]
async fn history_collects_every_collection_in_insertion_order() {
    let fixture = setup().await;
    let aggregator = ArticleHistoryAggregator::new(fixture.store.clone());

    let history = aggregator.history_for(fixture.hammer).await.unwrap();

    let sold: Vec<_> = history.sales.iter().map(|l| l.quantity).collect();
    assert_eq!(sold, vec![1, 3]);
    let ordered: Vec<_> = history
        .client_order_lines
        .iter()
        .map(|l| l.quantity)
        .collect();
    assert_eq!(ordered, vec![10, 30]);
    assert!(history.supplier_order_lines.is_empty());

    assert_eq!(history.quantity_sold(), 4);
    assert_eq!(history.quantity_ordered_by_clients(), 40);
    assert_eq!(history.quantity_ordered_from_suppliers(), 0);
}

#[tokio::test]
async fn per_collection_accessors_match_full_history() {
    let fixture = setup().await;
    let aggregator = ArticleHistoryAggregator::new(fixture.store.clone());

    let history = aggregator.history_for(fixture.saw).await.unwrap();
    assert_eq!(
        aggregator.sales_history(fixture.saw).await.unwrap(),
        history.sales
    );
    assert_eq!(
        aggregator.client_order_history(fixture.saw).await.unwrap(),
        history.client_order_lines
    );
    assert_eq!(
        aggregator.supplier_order_history(fixture.saw).await.unwrap(),
        history.supplier_order_lines
    );
    assert_eq!(history.quantity_ordered_from_suppliers(), 50);
}

#[tokio::test]
async fn history_is_idempotent_without_writes() {
    let fixture = setup().await;
    let aggregator = ArticleHistoryAggregator::new(fixture.store.clone());

    let first = aggregator.history_for(fixture.hammer).await.unwrap();
    let second = aggregator.history_for(fixture.hammer).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn history_reads_current_state() {
    let fixture = setup().await;
    let aggregator = ArticleHistoryAggregator::new(fixture.store.clone());
    let before = aggregator.history_for(fixture.saw).await.unwrap();

    let mut tx = fixture.store.begin().await.unwrap();
    tx.persist(SupplierOrderLine::new(
        EntityId::new(999).unwrap(),
        fixture.saw,
        5,
        Money::from_cents(900),
    ))
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let after = aggregator.history_for(fixture.saw).await.unwrap();
    assert_eq!(
        after.supplier_order_lines.len(),
        before.supplier_order_lines.len() + 1
    );
}

#[tokio::test]
async fn unknown_article_yields_three_empty_lists() {
    let fixture = setup().await;
    let aggregator = ArticleHistoryAggregator::new(fixture.store);

    let unknown = EntityId::new(987_654).unwrap();
    let history = aggregator.history_for(unknown).await.unwrap();
    assert_eq!(history, ArticleHistory::empty(unknown));
}
