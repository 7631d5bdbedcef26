use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::entities::{category, product};
use crate::errors::CatalogError;

use super::{CatalogStore, ProductFields, ProductWithCategory};

#[derive(Debug, Default)]
struct CatalogState {
    categories: HashMap<Uuid, category::Model>,
    products: HashMap<Uuid, product::Model>,
}

/// Catalog store kept entirely in process memory.
///
/// Backs tests and ephemeral deployments. One lock guards both entity maps,
/// so every check-then-write sequence is as atomic as a transaction in
/// [`DatabaseCatalogStore`](super::DatabaseCatalogStore).
#[derive(Debug, Clone)]
pub struct InMemoryCatalogStore {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(CatalogState::default())),
        }
    }

    /// Raw lookup that ignores the deleted flag. Lets tests observe that
    /// soft-deleted rows are retained.
    pub fn raw_category(&self, id: Uuid) -> Option<category::Model> {
        self.state.read().unwrap().categories.get(&id).cloned()
    }

    /// Raw lookup that ignores the deleted flag.
    pub fn raw_product(&self, id: Uuid) -> Option<product::Model> {
        self.state.read().unwrap().products.get(&id).cloned()
    }

    /// Number of stored products, deleted ones included.
    pub fn product_count(&self) -> usize {
        self.state.read().unwrap().products.len()
    }
}

impl Default for InMemoryCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

fn name_matches(candidate: &category::Model, name: &str, exclude: Option<Uuid>) -> bool {
    !candidate.is_deleted
        && Some(candidate.id) != exclude
        && candidate.name.to_lowercase() == name.to_lowercase()
}

fn category_is_live(state: &CatalogState, id: Uuid) -> bool {
    state
        .categories
        .get(&id)
        .map(|c| !c.is_deleted)
        .unwrap_or(false)
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn list_categories(&self) -> Result<Vec<category::Model>, CatalogError> {
        let state = self.state.read().unwrap();
        let mut live: Vec<_> = state
            .categories
            .values()
            .filter(|c| !c.is_deleted)
            .cloned()
            .collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(live)
    }

    async fn list_categories_by_name(&self) -> Result<Vec<category::Model>, CatalogError> {
        let state = self.state.read().unwrap();
        let mut live: Vec<_> = state
            .categories
            .values()
            .filter(|c| !c.is_deleted)
            .cloned()
            .collect();
        live.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(live)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<category::Model>, CatalogError> {
        let state = self.state.read().unwrap();
        Ok(state
            .categories
            .get(&id)
            .filter(|c| !c.is_deleted)
            .cloned())
    }

    async fn find_category_any(&self, id: Uuid) -> Result<Option<category::Model>, CatalogError> {
        Ok(self.raw_category(id))
    }

    async fn is_category_name_taken(
        &self,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, CatalogError> {
        let state = self.state.read().unwrap();
        Ok(state
            .categories
            .values()
            .any(|c| name_matches(c, name, exclude)))
    }

    async fn insert_category(&self, name: &str) -> Result<category::Model, CatalogError> {
        let mut state = self.state.write().unwrap();
        if state.categories.values().any(|c| name_matches(c, name, None)) {
            return Err(CatalogError::DuplicateName(name.to_string()));
        }
        let category = category::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            is_deleted: false,
            created_at: Utc::now(),
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: Uuid, name: &str) -> Result<category::Model, CatalogError> {
        let mut state = self.state.write().unwrap();
        let existing = match state.categories.get(&id) {
            Some(c) if !c.is_deleted => c.clone(),
            _ => {
                return Err(CatalogError::NotFound(format!("Category {} not found", id)));
            }
        };
        if state
            .categories
            .values()
            .any(|c| name_matches(c, name, Some(id)))
        {
            return Err(CatalogError::DuplicateName(name.to_string()));
        }
        let mut updated = existing;
        updated.name = name.to_string();
        state.categories.insert(id, updated.clone());
        Ok(updated)
    }

    async fn soft_delete_category(&self, id: Uuid) -> Result<(), CatalogError> {
        let mut state = self.state.write().unwrap();
        match state.categories.get_mut(&id) {
            Some(c) if !c.is_deleted => {
                c.is_deleted = true;
                Ok(())
            }
            _ => Err(CatalogError::NotFound(format!("Category {} not found", id))),
        }
    }

    async fn list_products(&self) -> Result<Vec<ProductWithCategory>, CatalogError> {
        let state = self.state.read().unwrap();
        let mut live: Vec<_> = state
            .products
            .values()
            .filter(|p| !p.is_deleted)
            .cloned()
            .collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(live
            .into_iter()
            .map(|product| {
                let category = state.categories.get(&product.category_id).cloned();
                ProductWithCategory { product, category }
            })
            .collect())
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<product::Model>, CatalogError> {
        let state = self.state.read().unwrap();
        Ok(state.products.get(&id).filter(|p| !p.is_deleted).cloned())
    }

    async fn insert_product(
        &self,
        fields: ProductFields,
        image: String,
    ) -> Result<product::Model, CatalogError> {
        let mut state = self.state.write().unwrap();
        if !category_is_live(&state, fields.category_id) {
            return Err(CatalogError::InvalidCategory(
                fields.category_id.to_string(),
            ));
        }
        let product = product::Model {
            id: Uuid::new_v4(),
            name: fields.name,
            category_id: fields.category_id,
            description: fields.description,
            price: fields.price,
            image,
            is_deleted: false,
            created_at: Utc::now(),
        };
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: Uuid,
        fields: ProductFields,
        image: Option<String>,
    ) -> Result<product::Model, CatalogError> {
        let mut state = self.state.write().unwrap();
        let existing = match state.products.get(&id) {
            Some(p) if !p.is_deleted => p.clone(),
            _ => {
                return Err(CatalogError::NotFound(format!("Product {} not found", id)));
            }
        };
        if !category_is_live(&state, fields.category_id) {
            return Err(CatalogError::InvalidCategory(
                fields.category_id.to_string(),
            ));
        }
        let mut updated = existing;
        updated.name = fields.name;
        updated.category_id = fields.category_id;
        updated.description = fields.description;
        updated.price = fields.price;
        if let Some(image) = image {
            updated.image = image;
        }
        state.products.insert(id, updated.clone());
        Ok(updated)
    }

    async fn soft_delete_product(&self, id: Uuid) -> Result<(), CatalogError> {
        let mut state = self.state.write().unwrap();
        match state.products.get_mut(&id) {
            Some(p) if !p.is_deleted => {
                p.is_deleted = true;
                Ok(())
            }
            _ => Err(CatalogError::NotFound(format!("Product {} not found", id))),
        }
    }
}
