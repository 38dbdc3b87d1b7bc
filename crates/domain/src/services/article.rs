use common::EntityId;
use entity_store::{EntityStore, Transaction, TransactionExt};

use super::repository::{EntityRepository, ManagedEntity, not_found};
use crate::error::{Result, require_id};
use crate::model::{Article, Category, fields};
use crate::validation::{Validate, ensure_valid};

/// Article service: the generic entity operations plus category checks.
pub struct ArticleService<S: EntityStore> {
    repository: EntityRepository<S, Article>,
}

impl<S: EntityStore> ArticleService<S> {
    pub fn new(store: S) -> Self {
        Self {
            repository: EntityRepository::new(store),
        }
    }

    /// Saves an article after checking that its category exists.
    #[tracing::instrument(skip_all, fields(code = %article.code))]
    pub async fn save(&self, article: Article) -> Result<Article> {
        ensure_valid(Article::NOT_VALID, Article::LABEL, article.validate())?;

        let mut tx = self.repository.store().begin().await?;
        if let Some(category_id) = article.category_id
            && tx.find::<Category>(category_id).await?.is_none()
        {
            return Err(not_found::<Category>(category_id));
        }
        let saved = self.repository.save_in(&mut tx, article).await?;
        tx.commit().await?;
        Ok(saved)
    }

    pub async fn find_by_id(&self, id: impl Into<Option<EntityId>>) -> Result<Article> {
        self.repository.find_by_id(id).await
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Article> {
        self.repository.find_by_code(code).await
    }

    pub async fn find_all(&self) -> Result<Vec<Article>> {
        self.repository.find_all().await
    }

    /// Articles filed under a category, in insertion order.
    #[tracing::instrument(skip_all)]
    pub async fn find_all_by_category(
        &self,
        category_id: impl Into<Option<EntityId>>,
    ) -> Result<Vec<Article>> {
        let category_id = require_id(category_id.into(), Category::LABEL)?;
        let mut tx = self.repository.store().begin().await?;
        let articles = tx
            .find_by_foreign_key::<Article>(fields::CATEGORY, category_id)
            .await?;
        tx.rollback().await?;
        Ok(articles)
    }

    /// Deletes an article no line references.
    pub async fn delete(&self, id: impl Into<Option<EntityId>>) -> Result<()> {
        self.repository.delete(id).await
    }
}
