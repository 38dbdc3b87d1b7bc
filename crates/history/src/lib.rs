//! Read side of the stock management system.
//!
//! [`ArticleHistoryAggregator`] reconstructs everything that happened to an
//! article by reading the three line collections that reference it.

mod aggregator;
mod article_history;

pub use aggregator::ArticleHistoryAggregator;
pub use article_history::ArticleHistory;
