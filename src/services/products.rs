use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entities::product;
use crate::errors::CatalogError;
use crate::events::{Event, EventSender};
use crate::image_store::{ImageStore, UploadedImage};
use crate::store::{CatalogStore, ProductFields, ProductWithCategory};
use crate::validation::{validate_product, NewProduct, ProductInput};

/// Product administration service
///
/// Coordinates the catalog store and the image store so records and image
/// assets stay consistent: a row is only written once its image is stored,
/// and an asset whose row never landed is removed again.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn CatalogStore>,
    images: Arc<dyn ImageStore>,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        images: Arc<dyn ImageStore>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            store,
            images,
            event_sender,
        }
    }

    /// List live products with their categories, newest first
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ProductWithCategory>, CatalogError> {
        self.store.list_products().await
    }

    /// Get a live product by ID, with its category resolved
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<ProductWithCategory, CatalogError> {
        let product = self.find_live(id).await?;
        let category = self.store.find_category_any(product.category_id).await?;
        Ok(ProductWithCategory { product, category })
    }

    /// Create a new product from form input and its uploaded image
    #[instrument(skip(self, upload))]
    pub async fn add(
        &self,
        input: ProductInput,
        upload: Option<UploadedImage>,
    ) -> Result<product::Model, CatalogError> {
        let new = validate_product(&input).map_err(CatalogError::ValidationFailed)?;
        let upload = upload.ok_or(CatalogError::MissingImage)?;
        let fields = self.resolve_fields(new)?;

        // Stage the image first: a product row must never point at an
        // asset that does not exist.
        let image = self.images.store(&upload).await?;

        match self.store.insert_product(fields, image.clone()).await {
            Ok(product) => {
                self.event_sender
                    .send_or_log(Event::ProductCreated(product.id))
                    .await;

                info!("Created product: {}", product.id);
                Ok(product)
            }
            Err(err) => {
                // The row never landed, so the staged asset is unreachable.
                // Remove it again; the original error still wins.
                if let Err(cleanup) = self.images.delete(&image).await {
                    warn!("Failed to remove staged image {}: {}", image, cleanup);
                }
                Err(err)
            }
        }
    }

    /// Update an existing product, optionally replacing its image
    #[instrument(skip(self, upload))]
    pub async fn update(
        &self,
        id: Uuid,
        input: ProductInput,
        upload: Option<UploadedImage>,
    ) -> Result<product::Model, CatalogError> {
        let new = validate_product(&input).map_err(CatalogError::ValidationFailed)?;
        let fields = self.resolve_fields(new)?;
        let existing = self.find_live(id).await?;

        let updated = match upload {
            Some(upload) => {
                let image = self.images.store(&upload).await?;
                match self
                    .store
                    .update_product(id, fields, Some(image.clone()))
                    .await
                {
                    Ok(updated) => {
                        // The record points at the new asset now. The old one
                        // is unreferenced and goes away best-effort.
                        if let Err(cleanup) = self.images.delete(&existing.image).await {
                            warn!(
                                "Failed to remove replaced image {}: {}",
                                existing.image, cleanup
                            );
                        }
                        updated
                    }
                    Err(err) => {
                        if let Err(cleanup) = self.images.delete(&image).await {
                            warn!("Failed to remove staged image {}: {}", image, cleanup);
                        }
                        return Err(err);
                    }
                }
            }
            None => self.store.update_product(id, fields, None).await?,
        };

        self.event_sender
            .send_or_log(Event::ProductUpdated(id))
            .await;

        info!("Updated product: {}", id);
        Ok(updated)
    }

    /// Soft-delete a product and drop its image asset
    #[instrument(skip(self))]
    pub async fn remove(&self, id: Uuid) -> Result<(), CatalogError> {
        let product = self.find_live(id).await?;

        // Best-effort: a failed asset delete must not keep the record
        // visible in the catalog.
        if let Err(cleanup) = self.images.delete(&product.image).await {
            warn!(
                "Failed to remove image {} for product {}: {}",
                product.image, id, cleanup
            );
        }

        self.store.soft_delete_product(id).await?;

        self.event_sender
            .send_or_log(Event::ProductDeleted(id))
            .await;

        info!("Deleted product: {}", id);
        Ok(())
    }

    async fn find_live(&self, id: Uuid) -> Result<product::Model, CatalogError> {
        self.store
            .find_product(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Product {} not found", id)))
    }

    /// Resolves the raw category reference into typed product fields.
    fn resolve_fields(&self, new: NewProduct) -> Result<ProductFields, CatalogError> {
        let category_id = Uuid::parse_str(&new.category)
            .map_err(|_| CatalogError::InvalidCategory(new.category.clone()))?;
        Ok(ProductFields {
            name: new.name,
            category_id,
            description: new.description,
            price: new.price,
        })
    }
}
