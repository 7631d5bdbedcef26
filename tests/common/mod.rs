// Not every test binary uses every helper here.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use catalog_admin::entities::{category, product};
use catalog_admin::errors::CatalogError;
use catalog_admin::events::{self, EventSender};
use catalog_admin::image_store::{InMemoryImageStore, UploadedImage};
use catalog_admin::services::{CategoryService, ProductService};
use catalog_admin::store::{
    CatalogStore, InMemoryCatalogStore, ProductFields, ProductWithCategory,
};
use catalog_admin::validation::{CategoryInput, ProductInput};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Catalog store wrapper that can be armed to fail the next product write
/// with a database error, for exercising the image compensation paths.
pub struct FlakyCatalogStore {
    inner: Arc<InMemoryCatalogStore>,
    fail_insert: AtomicBool,
    fail_update: AtomicBool,
}

impl FlakyCatalogStore {
    pub fn new(inner: Arc<InMemoryCatalogStore>) -> Self {
        Self {
            inner,
            fail_insert: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
        }
    }

    /// Arm a one-shot failure for the next `insert_product` call.
    pub fn fail_next_product_insert(&self) {
        self.fail_insert.store(true, Ordering::SeqCst);
    }

    /// Arm a one-shot failure for the next `update_product` call.
    pub fn fail_next_product_update(&self) {
        self.fail_update.store(true, Ordering::SeqCst);
    }

    fn injected() -> CatalogError {
        CatalogError::persistence("injected database failure")
    }
}

#[async_trait]
impl CatalogStore for FlakyCatalogStore {
    async fn list_categories(&self) -> Result<Vec<category::Model>, CatalogError> {
        self.inner.list_categories().await
    }

    async fn list_categories_by_name(&self) -> Result<Vec<category::Model>, CatalogError> {
        self.inner.list_categories_by_name().await
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<category::Model>, CatalogError> {
        self.inner.find_category(id).await
    }

    async fn find_category_any(&self, id: Uuid) -> Result<Option<category::Model>, CatalogError> {
        self.inner.find_category_any(id).await
    }

    async fn is_category_name_taken(
        &self,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, CatalogError> {
        self.inner.is_category_name_taken(name, exclude).await
    }

    async fn insert_category(&self, name: &str) -> Result<category::Model, CatalogError> {
        self.inner.insert_category(name).await
    }

    async fn update_category(&self, id: Uuid, name: &str) -> Result<category::Model, CatalogError> {
        self.inner.update_category(id, name).await
    }

    async fn soft_delete_category(&self, id: Uuid) -> Result<(), CatalogError> {
        self.inner.soft_delete_category(id).await
    }

    async fn list_products(&self) -> Result<Vec<ProductWithCategory>, CatalogError> {
        self.inner.list_products().await
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<product::Model>, CatalogError> {
        self.inner.find_product(id).await
    }

    async fn insert_product(
        &self,
        fields: ProductFields,
        image: String,
    ) -> Result<product::Model, CatalogError> {
        if self.fail_insert.swap(false, Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.insert_product(fields, image).await
    }

    async fn update_product(
        &self,
        id: Uuid,
        fields: ProductFields,
        image: Option<String>,
    ) -> Result<product::Model, CatalogError> {
        if self.fail_update.swap(false, Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.update_product(id, fields, image).await
    }

    async fn soft_delete_product(&self, id: Uuid) -> Result<(), CatalogError> {
        self.inner.soft_delete_product(id).await
    }
}

/// Helper harness wiring the services to in-memory stores and a live event
/// channel, the same way the application assembles them.
pub struct TestCatalog {
    pub categories: CategoryService,
    pub products: ProductService,
    pub store: Arc<InMemoryCatalogStore>,
    pub flaky: Arc<FlakyCatalogStore>,
    pub images: Arc<InMemoryImageStore>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestCatalog {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryCatalogStore::new());
        let flaky = Arc::new(FlakyCatalogStore::new(store.clone()));
        let images = Arc::new(InMemoryImageStore::new());

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let categories = CategoryService::new(flaky.clone(), event_sender.clone());
        let products = ProductService::new(flaky.clone(), images.clone(), event_sender);

        Self {
            categories,
            products,
            store,
            flaky,
            images,
            _event_task: event_task,
        }
    }
}

impl Drop for TestCatalog {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub fn category_input(name: &str) -> CategoryInput {
    CategoryInput { name: name.into() }
}

pub fn product_input(name: &str, category: &str) -> ProductInput {
    ProductInput {
        name: name.into(),
        category: category.into(),
        description: "A dependable staple for the storefront".into(),
        price: "19.99".into(),
    }
}

/// Build an upload with placeholder bytes under the given file name.
pub fn upload(name: &str) -> UploadedImage {
    UploadedImage::new(name, Bytes::from_static(b"\x89PNG test bytes"))
}
