//! Catalog Admin Library
//!
//! This crate provides the core functionality for the catalog back office:
//! category and product management with validated writes, soft deletion and
//! image asset handling that stays consistent with the catalog records.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod image_store;
pub mod migrator;
pub mod services;
pub mod store;
pub mod validation;

pub use errors::CatalogError;
pub use image_store::{ImageStore, InMemoryImageStore, LocalImageStore, UploadedImage};
pub use services::{CategoryService, ProductService};
pub use store::{CatalogStore, DatabaseCatalogStore, InMemoryCatalogStore, ProductWithCategory};

pub mod prelude {
    pub use crate::config::*;
    pub use crate::db::*;
    pub use crate::errors::*;
    pub use crate::events::*;
    pub use crate::image_store::*;
    pub use crate::services::*;
    pub use crate::store::*;
    pub use crate::validation::*;
}
