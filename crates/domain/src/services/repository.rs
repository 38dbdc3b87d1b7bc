use std::marker::PhantomData;

use common::EntityId;
use entity_store::{Entity, EntityStore, Transaction, TransactionExt};

use crate::error::{DomainError, ErrorCode, Result, require_id};
use crate::guard::{DeleteTarget, check_delete};
use crate::model::{Article, Category, Client, Supplier};
use crate::validation::{Validate, Violation, ViolationReason, ensure_valid};

/// An independently managed entity: saved on its own, deleted only when
/// nothing references it.
pub trait ManagedEntity: Entity + Validate {
    /// Lowercase name used in messages.
    const LABEL: &'static str;
    const NOT_FOUND: ErrorCode;
    const NOT_VALID: ErrorCode;
    const IN_USE: ErrorCode;

    fn delete_target(id: EntityId) -> DeleteTarget;
}

impl ManagedEntity for Article {
    const LABEL: &'static str = "article";
    const NOT_FOUND: ErrorCode = ErrorCode::ArticleNotFound;
    const NOT_VALID: ErrorCode = ErrorCode::ArticleNotValid;
    const IN_USE: ErrorCode = ErrorCode::ArticleAlreadyInUse;

    fn delete_target(id: EntityId) -> DeleteTarget {
        DeleteTarget::Article(id)
    }
}

impl ManagedEntity for Category {
    const LABEL: &'static str = "category";
    const NOT_FOUND: ErrorCode = ErrorCode::CategoryNotFound;
    const NOT_VALID: ErrorCode = ErrorCode::CategoryNotValid;
    const IN_USE: ErrorCode = ErrorCode::CategoryAlreadyInUse;

    fn delete_target(id: EntityId) -> DeleteTarget {
        DeleteTarget::Category(id)
    }
}

impl ManagedEntity for Client {
    const LABEL: &'static str = "client";
    const NOT_FOUND: ErrorCode = ErrorCode::ClientNotFound;
    const NOT_VALID: ErrorCode = ErrorCode::ClientNotValid;
    const IN_USE: ErrorCode = ErrorCode::ClientAlreadyInUse;

    fn delete_target(id: EntityId) -> DeleteTarget {
        DeleteTarget::Client(id)
    }
}

impl ManagedEntity for Supplier {
    const LABEL: &'static str = "supplier";
    const NOT_FOUND: ErrorCode = ErrorCode::SupplierNotFound;
    const NOT_VALID: ErrorCode = ErrorCode::SupplierNotValid;
    const IN_USE: ErrorCode = ErrorCode::SupplierAlreadyInUse;

    fn delete_target(id: EntityId) -> DeleteTarget {
        DeleteTarget::Supplier(id)
    }
}

pub(crate) fn not_found<E: ManagedEntity>(id: EntityId) -> DomainError {
    DomainError::not_found(E::NOT_FOUND, format!("No {} with id {id} found", E::LABEL))
}

/// Generic service over one managed entity type.
///
/// Every operation runs in its own store transaction.
pub struct EntityRepository<S: EntityStore, E: ManagedEntity> {
    store: S,
    entity: PhantomData<fn() -> E>,
}

impl<S: EntityStore, E: ManagedEntity> EntityRepository<S, E> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            entity: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates the entity when it has no id, replaces it otherwise.
    #[tracing::instrument(skip_all, fields(kind = E::KIND))]
    pub async fn save(&self, entity: E) -> Result<E> {
        ensure_valid(E::NOT_VALID, E::LABEL, entity.validate())?;

        let mut tx = self.store.begin().await?;
        let saved = self.save_in(&mut tx, entity).await?;
        tx.commit().await?;
        Ok(saved)
    }

    /// Saves within a caller-owned transaction.
    pub async fn save_in(&self, tx: &mut S::Tx, entity: E) -> Result<E> {
        ensure_valid(E::NOT_VALID, E::LABEL, entity.validate())?;

        if let Some(code) = entity.code()
            && let Some(existing) = tx.get_by_code(E::KIND, code).await?
            && Some(existing.id) != entity.id()
        {
            let violation = Violation::new(
                ViolationReason::DuplicateCode,
                "code",
                format!("code {code} is already used by another {}", E::LABEL),
            );
            ensure_valid(E::NOT_VALID, E::LABEL, vec![violation])?;
        }

        if let Some(id) = entity.id()
            && tx.get(E::KIND, id).await?.is_none()
        {
            return Err(not_found::<E>(id));
        }

        let created = entity.id().is_none();
        let saved = tx.persist(entity).await?;
        metrics::counter!("stock_entities_saved_total", "kind" => E::KIND).increment(1);
        tracing::info!(id = ?saved.id(), created, "{} saved", E::LABEL);
        Ok(saved)
    }

    #[tracing::instrument(skip_all, fields(kind = E::KIND))]
    pub async fn find_by_id(&self, id: impl Into<Option<EntityId>>) -> Result<E> {
        let id = require_id(id.into(), E::LABEL)?;
        let mut tx = self.store.begin().await?;
        let entity = tx.find::<E>(id).await?;
        tx.rollback().await?;
        entity.ok_or_else(|| not_found::<E>(id))
    }

    #[tracing::instrument(skip(self), fields(kind = E::KIND))]
    pub async fn find_by_code(&self, code: &str) -> Result<E> {
        let mut tx = self.store.begin().await?;
        let entity = tx.find_by_code::<E>(code).await?;
        tx.rollback().await?;
        entity.ok_or_else(|| {
            DomainError::not_found(E::NOT_FOUND, format!("No {} with code {code} found", E::LABEL))
        })
    }

    pub async fn find_all(&self) -> Result<Vec<E>> {
        let mut tx = self.store.begin().await?;
        let entities = tx.find_all::<E>().await?;
        tx.rollback().await?;
        Ok(entities)
    }

    /// Deletes the entity unless another record still references it.
    ///
    /// The dependent check and the delete share one transaction.
    #[tracing::instrument(skip_all, fields(kind = E::KIND))]
    pub async fn delete(&self, id: impl Into<Option<EntityId>>) -> Result<()> {
        let id = require_id(id.into(), E::LABEL)?;
        let mut tx = self.store.begin().await?;

        let entity = tx.find::<E>(id).await?.ok_or_else(|| not_found::<E>(id))?;
        let label = match entity.code() {
            Some(code) => format!("{} {code}", E::LABEL),
            None => format!("{} {id}", E::LABEL),
        };
        check_delete(&mut tx, E::delete_target(id))
            .await?
            .ensure_allowed(E::IN_USE, &label)?;

        tx.remove::<E>(id).await?;
        tx.commit().await?;
        tracing::info!(%id, "{label} deleted");
        Ok(())
    }
}

pub type CategoryService<S> = EntityRepository<S, Category>;
pub type ClientService<S> = EntityRepository<S, Client>;
pub type SupplierService<S> = EntityRepository<S, Supplier>;
