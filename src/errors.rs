use sea_orm::error::DbErr;
use thiserror::Error;

/// Errors surfaced by the catalog services and the stores beneath them.
///
/// Every fallible operation in this crate resolves to one of these variants
/// so callers can branch on the outcome instead of parsing message text.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    #[error("Category name already in use: {0}")]
    DuplicateName(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid category reference: {0}")]
    InvalidCategory(String),

    #[error("Product image is required")]
    MissingImage,

    #[error("Image storage error: {0}")]
    StorageError(String),

    #[error("Database error: {0}")]
    PersistenceError(
        #[from]
        sea_orm::error::DbErr,
    ),
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

impl CatalogError {
    /// Generic constructor that normalizes any supported database error input.
    pub fn persistence<E: IntoDbErr>(error: E) -> Self {
        CatalogError::PersistenceError(error.into_db_err())
    }

    /// Convenience constructor for image store failures.
    pub fn storage(message: impl Into<String>) -> Self {
        CatalogError::StorageError(message.into())
    }

    /// True when the error means the caller's input was bad rather than the
    /// system failing: validation, duplicate names, bad references, or a
    /// missing upload.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed(_)
                | Self::DuplicateName(_)
                | Self::InvalidCategory(_)
                | Self::MissingImage
        )
    }
}
