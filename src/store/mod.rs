/*!
 * # Catalog Store
 *
 * Persistence seam for categories and products. Every query here is scoped
 * to live rows: soft-deleted records stay in storage but are invisible to
 * the catalog, and a lookup cannot tell a deleted record from one that
 * never existed.
 */

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::entities::{category, product};
use crate::errors::CatalogError;

pub mod database;
pub mod memory;

pub use database::DatabaseCatalogStore;
pub use memory::InMemoryCatalogStore;

/// Builds the catalog store selected by `AppConfig::store_backend`.
///
/// The database backend connects through the config's pool settings and
/// runs migrations when `auto_migrate` is set.
pub async fn create_catalog_store(cfg: &AppConfig) -> Result<Arc<dyn CatalogStore>, CatalogError> {
    let store: Arc<dyn CatalogStore> = match cfg.store_backend.to_ascii_lowercase().as_str() {
        "in-memory" => Arc::new(InMemoryCatalogStore::new()),
        _ => {
            let pool = crate::db::establish_connection_from_app_config(cfg).await?;
            if cfg.auto_migrate {
                crate::db::run_migrations(&pool).await?;
            }
            Arc::new(DatabaseCatalogStore::new(Arc::new(pool)))
        }
    };
    info!("Catalog store backend: {}", cfg.store_backend);
    Ok(store)
}

/// Product fields ready for persistence, with the category reference
/// already resolved to an id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub category_id: Uuid,
    pub description: String,
    pub price: Decimal,
}

/// A live product together with its category. The category resolves even
/// when it has since been soft-deleted, so listings never lose the label.
#[derive(Clone, Debug, Serialize)]
pub struct ProductWithCategory {
    pub product: product::Model,
    pub category: Option<category::Model>,
}

/// Persistence operations for the catalog.
///
/// Writes that depend on what is already stored (name uniqueness, category
/// liveness, record existence) perform the check and the write as one
/// atomic step, so concurrent admins cannot slip a duplicate past the
/// rules.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Live categories, newest first.
    async fn list_categories(&self) -> Result<Vec<category::Model>, CatalogError>;

    /// Live categories sorted by name, for selection lists.
    async fn list_categories_by_name(&self) -> Result<Vec<category::Model>, CatalogError>;

    async fn find_category(&self, id: Uuid) -> Result<Option<category::Model>, CatalogError>;

    /// Looks up a category regardless of its deleted flag. Products keep
    /// referencing deleted categories, and reads still resolve them.
    async fn find_category_any(&self, id: Uuid) -> Result<Option<category::Model>, CatalogError>;

    /// True when a live category other than `exclude` already uses `name`,
    /// compared case-insensitively.
    async fn is_category_name_taken(
        &self,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, CatalogError>;

    /// Inserts a category, failing with [`CatalogError::DuplicateName`] when
    /// the name is already taken among live categories.
    async fn insert_category(&self, name: &str) -> Result<category::Model, CatalogError>;

    /// Renames a live category under the same duplicate rule, ignoring the
    /// category's own current name.
    async fn update_category(&self, id: Uuid, name: &str) -> Result<category::Model, CatalogError>;

    /// Flags a live category as deleted. Its products are left untouched.
    async fn soft_delete_category(&self, id: Uuid) -> Result<(), CatalogError>;

    /// Live products, newest first, each with its category resolved.
    async fn list_products(&self) -> Result<Vec<ProductWithCategory>, CatalogError>;

    async fn find_product(&self, id: Uuid) -> Result<Option<product::Model>, CatalogError>;

    /// Inserts a product pointing at the named image asset, failing with
    /// [`CatalogError::InvalidCategory`] when the category is missing or
    /// deleted.
    async fn insert_product(
        &self,
        fields: ProductFields,
        image: String,
    ) -> Result<product::Model, CatalogError>;

    /// Rewrites a live product's fields, and its image name when `image` is
    /// set. The category must be live at the time of the write.
    async fn update_product(
        &self,
        id: Uuid,
        fields: ProductFields,
        image: Option<String>,
    ) -> Result<product::Model, CatalogError>;

    /// Flags a live product as deleted.
    async fn soft_delete_product(&self, id: Uuid) -> Result<(), CatalogError>;
}
