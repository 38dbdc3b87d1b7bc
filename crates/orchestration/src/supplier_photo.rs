use common::EntityId;
use domain::{
    DomainError, ErrorCode, ManagedEntity, Result, Supplier, SupplierService, Validate,
    ensure_valid, require_id,
};
use entity_store::{EntityStore, Transaction, TransactionExt};

use crate::services::PhotoStore;

/// Uploads supplier photos and records the returned URL.
pub struct SupplierPhotoService<S: EntityStore, P: PhotoStore> {
    suppliers: SupplierService<S>,
    photos: P,
}

impl<S: EntityStore, P: PhotoStore> SupplierPhotoService<S, P> {
    pub fn new(store: S, photos: P) -> Self {
        Self {
            suppliers: SupplierService::new(store),
            photos,
        }
    }

    async fn load(tx: &mut S::Tx, id: EntityId) -> Result<Supplier> {
        tx.find::<Supplier>(id).await?.ok_or_else(|| {
            DomainError::not_found(
                Supplier::NOT_FOUND,
                format!("No supplier with id {id} found"),
            )
        })
    }

    /// Stores a photo and attaches its URL to the supplier.
    ///
    /// A supplier that no longer validates is rejected before upload. A failed
    /// upload or an empty URL leaves the supplier unchanged. No transaction is
    /// held while the photo store is called.
    #[tracing::instrument(skip(self, supplier_id, bytes), fields(size = bytes.len()))]
    pub async fn save_photo(
        &self,
        supplier_id: impl Into<Option<EntityId>>,
        bytes: &[u8],
        title: &str,
    ) -> Result<Supplier> {
        let supplier_id = require_id(supplier_id.into(), Supplier::LABEL)?;

        let mut tx = self.suppliers.store().begin().await?;
        let current = Self::load(&mut tx, supplier_id).await?;
        tx.rollback().await?;
        ensure_valid(Supplier::NOT_VALID, Supplier::LABEL, current.validate())?;

        let url = self.photos.store(bytes, title).await.map_err(|e| {
            DomainError::upstream(ErrorCode::UpdatePhotoFailed, format!("Photo upload failed: {e}"))
        })?;
        if url.trim().is_empty() {
            return Err(DomainError::upstream(
                ErrorCode::UpdatePhotoFailed,
                "Photo store returned no URL",
            ));
        }

        let mut tx = self.suppliers.store().begin().await?;
        let mut supplier = Self::load(&mut tx, supplier_id).await?;
        supplier.photo = Some(url);
        let supplier = self.suppliers.save_in(&mut tx, supplier).await?;
        tx.commit().await?;

        tracing::info!(%supplier_id, "supplier photo updated");
        Ok(supplier)
    }
}

#[cfg(test)]
mod tests {
    use domain::SupplierService;
    use entity_store::InMemoryEntityStore;

    use super::*;
    use crate::InMemoryPhotoStore;

    #[tokio::test]
    async fn unknown_supplier_is_not_found_before_upload() {
        let photos = InMemoryPhotoStore::new();
        let service = SupplierPhotoService::new(InMemoryEntityStore::new(), photos.clone());

        let err = service
            .save_photo(EntityId::new(3).unwrap(), b"jpeg", "logo")
            .await
            .unwrap_err();
        assert_eq!(err.reason_code(), ErrorCode::SupplierNotFound);
        assert_eq!(photos.photo_count(), 0);
    }

    #[tokio::test]
    async fn invalid_supplier_is_rejected_before_upload() {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();
        let supplier = tx.persist(Supplier::new("F001", "Acme")).await.unwrap();
        tx.commit().await.unwrap();
        let photos = InMemoryPhotoStore::new();
        let service = SupplierPhotoService::new(store.clone(), photos.clone());

        let err = service
            .save_photo(supplier.id, b"jpeg", "logo")
            .await
            .unwrap_err();
        assert_eq!(err.reason_code(), ErrorCode::SupplierNotValid);
        assert_eq!(photos.photo_count(), 0);

        let stored = SupplierService::new(store).find_by_id(supplier.id).await.unwrap();
        assert_eq!(stored.photo, None);
    }

    #[tokio::test]
    async fn upload_failure_is_upstream_failure() {
        let store = InMemoryEntityStore::new();
        let supplier = SupplierService::new(store.clone())
            .save(Supplier::new("F001", "Acme").with_email("acme@example.com"))
            .await
            .unwrap();
        let photos = InMemoryPhotoStore::new();
        photos.set_fail_on_store(true);
        let service = SupplierPhotoService::new(store, photos);

        let err = service
            .save_photo(supplier.id, b"jpeg", "logo")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::UpstreamFailure { .. }));
        assert_eq!(err.reason_code(), ErrorCode::UpdatePhotoFailed);
    }
}
