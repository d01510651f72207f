//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Server errors (5xx)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            // 404 Not Found
            AppError::ProductNotFound(id) => {
                (StatusCode::NOT_FOUND, "product_not_found", Some(id.clone()))
            }
            AppError::CategoryNotFound(id) => {
                (StatusCode::NOT_FOUND, "category_not_found", Some(id.clone()))
            }

            // Domain errors - all caused by the request
            AppError::Domain(domain_err) => match domain_err {
                DomainError::InvalidId(_) => (StatusCode::BAD_REQUEST, "invalid_id", None),
                DomainError::InvalidCategory => {
                    (StatusCode::BAD_REQUEST, "invalid_category", None)
                }
                DomainError::MissingImage => (StatusCode::BAD_REQUEST, "missing_image", None),
                DomainError::MissingField(field) => {
                    (StatusCode::BAD_REQUEST, "missing_field", Some(field.to_string()))
                }
                DomainError::InvalidField { field, .. } => {
                    (StatusCode::BAD_REQUEST, "invalid_field", Some(field.to_string()))
                }
            },

            // 503 while the store is not usable, 500 otherwise
            AppError::Store(e) if e.is_unavailable() => {
                tracing::warn!("Store unavailable: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", None)
            }
            AppError::Store(StoreError::InvalidDocument(msg)) => {
                (StatusCode::BAD_REQUEST, "invalid_document", Some(msg.clone()))
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "store_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
