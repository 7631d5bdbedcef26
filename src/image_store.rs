/*!
 * # Image Asset Store
 *
 * Owns the lifecycle of product image assets. The store hands out opaque
 * asset names, product records carry those names, and the services
 * coordinate the two sides so assets and records stay consistent.
 */

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use crate::errors::CatalogError;

/// An image received from the admin UI, held in memory until a service
/// decides to stage it.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub original_name: String,
    pub content: Bytes,
}

impl UploadedImage {
    pub fn new(original_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            original_name: original_name.into(),
            content: content.into(),
        }
    }

    fn extension(&self) -> Option<&str> {
        Path::new(&self.original_name)
            .extension()
            .and_then(|ext| ext.to_str())
    }
}

/// Generates a collision-free asset name, keeping the upload's extension.
fn unique_asset_name(upload: &UploadedImage) -> String {
    match upload.extension() {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_lowercase()),
        None => Uuid::new_v4().to_string(),
    }
}

/// Storage backend for image assets.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persists the upload under a fresh name and returns that name. On
    /// failure nothing retrievable is left behind.
    async fn store(&self, upload: &UploadedImage) -> Result<String, CatalogError>;

    /// Removes the named asset if present. Removing an absent asset is not
    /// an error.
    async fn delete(&self, name: &str) -> Result<(), CatalogError>;
}

/// Image store backed by a directory on local disk.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves an asset name inside the root directory. Names are generated
    /// by this module; anything that could walk out of the root is rejected.
    fn asset_path(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return None;
        }
        Some(self.root.join(name))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(&self, upload: &UploadedImage) -> Result<String, CatalogError> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            CatalogError::storage(format!("Failed to create image directory: {}", e))
        })?;

        let name = unique_asset_name(upload);
        let path = self.root.join(&name);
        if let Err(e) = fs::write(&path, &upload.content).await {
            // A short write must not leave a half-stored asset behind.
            if let Err(cleanup) = fs::remove_file(&path).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        "Failed to clean up partial image {}: {}",
                        path.display(),
                        cleanup
                    );
                }
            }
            return Err(CatalogError::storage(format!(
                "Failed to write image {}: {}",
                name, e
            )));
        }

        Ok(name)
    }

    async fn delete(&self, name: &str) -> Result<(), CatalogError> {
        let path = match self.asset_path(name) {
            Some(path) => path,
            None => {
                warn!("Refusing to delete suspicious asset name: {}", name);
                return Ok(());
            }
        };

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CatalogError::storage(format!(
                "Failed to delete image {}: {}",
                name, e
            ))),
        }
    }
}

/// In-memory image store for tests and ephemeral deployments.
#[derive(Debug, Clone)]
pub struct InMemoryImageStore {
    blobs: Arc<DashMap<String, Bytes>>,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self {
            blobs: Arc::new(DashMap::new()),
        }
    }

    /// True when the named asset is currently stored.
    pub fn contains(&self, name: &str) -> bool {
        self.blobs.contains_key(name)
    }

    /// Number of stored assets.
    pub fn asset_count(&self) -> usize {
        self.blobs.len()
    }
}

impl Default for InMemoryImageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn store(&self, upload: &UploadedImage) -> Result<String, CatalogError> {
        let name = unique_asset_name(upload);
        self.blobs.insert(name.clone(), upload.content.clone());
        Ok(name)
    }

    async fn delete(&self, name: &str) -> Result<(), CatalogError> {
        self.blobs.remove(name);
        Ok(())
    }
}
