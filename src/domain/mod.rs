//! Domain module
//!
//! Catalog document models and their rules.

pub mod category;
pub mod error;
pub mod product;

pub use category::{Category, CategoryUpdate};
pub use error::DomainError;
pub use product::{GalleryUpdate, NewProduct, Product, ProductUpdate};

use uuid::Uuid;

/// Parse a path id, naming the document kind in the error
pub fn parse_document_id(raw: &str, kind: &'static str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(raw.trim()).map_err(|_| DomainError::InvalidId(kind))
}

/// Parse a category reference from a request body
pub fn parse_category_ref(raw: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(raw.trim()).map_err(|_| DomainError::InvalidCategory)
}
