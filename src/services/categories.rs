use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::category;
use crate::errors::CatalogError;
use crate::events::{Event, EventSender};
use crate::store::CatalogStore;
use crate::validation::{validate_category, CategoryInput};

/// Category administration service
///
/// Validates input, enforces name uniqueness through the store, and turns
/// deletions into soft deletes.
#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn CatalogStore>,
    event_sender: Arc<EventSender>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn CatalogStore>, event_sender: Arc<EventSender>) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    /// List live categories, newest first
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<category::Model>, CatalogError> {
        self.store.list_categories().await
    }

    /// List live categories by name, for selection controls
    #[instrument(skip(self))]
    pub async fn list_for_selection(&self) -> Result<Vec<category::Model>, CatalogError> {
        self.store.list_categories_by_name().await
    }

    /// Get a live category by ID
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<category::Model, CatalogError> {
        self.store
            .find_category(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Category {} not found", id)))
    }

    /// Create a new category
    #[instrument(skip(self))]
    pub async fn add(&self, input: CategoryInput) -> Result<category::Model, CatalogError> {
        let new = validate_category(&input).map_err(CatalogError::ValidationFailed)?;
        let category = self.store.insert_category(&new.name).await?;

        // Publish event
        self.event_sender
            .send_or_log(Event::CategoryCreated(category.id))
            .await;

        info!("Created category: {}", category.id);
        Ok(category)
    }

    /// Rename an existing category
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        input: CategoryInput,
    ) -> Result<category::Model, CatalogError> {
        let new = validate_category(&input).map_err(CatalogError::ValidationFailed)?;
        let category = self.store.update_category(id, &new.name).await?;

        self.event_sender
            .send_or_log(Event::CategoryUpdated(category.id))
            .await;

        info!("Updated category: {}", category.id);
        Ok(category)
    }

    /// Soft-delete a category. Its products keep their back-reference.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: Uuid) -> Result<(), CatalogError> {
        self.store.soft_delete_category(id).await?;

        self.event_sender
            .send_or_log(Event::CategoryDeleted(id))
            .await;

        info!("Deleted category: {}", id);
        Ok(())
    }
}
