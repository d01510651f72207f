//! Domain Error Types
//!
//! Catalog errors that don't depend on infrastructure.

use thiserror::Error;

/// Catalog rule violations.
///
/// These are independent of the web/infrastructure layer; `AppError` maps
/// them onto HTTP responses.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Path id is not a valid document id
    #[error("Invalid {0} Id")]
    InvalidId(&'static str),

    /// Referenced category does not exist or is malformed
    #[error("Invalid Category")]
    InvalidCategory,

    /// Product created without an image URL
    #[error("No image in the request")]
    MissingImage,

    /// Required field missing or empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Field value out of range
    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}
