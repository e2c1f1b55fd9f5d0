//! Error handling module
//!
//! Centralized error types and HTTP response conversion. Business-rule
//! rejections keep their message text; storage and internal failures are
//! logged server-side and surface as a generic error with no detail leaked.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::{AmountError, DomainError};
use crate::store::StoreError;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Authentication(String),

    #[error("User not found. Please check the account ID and try again.")]
    AccountNotFound(String),

    // Amount precondition failures
    #[error(transparent)]
    Amount(#[from] AmountError),

    // Business-rule rejections
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Concurrent-write contention that survived internal retries
    #[error("The account is receiving too many concurrent updates. Please try again.")]
    StorageConflict,

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            // Exposed only when the engine's retry budget is exhausted
            StoreError::VersionConflict { .. } => AppError::StorageConflict,
            StoreError::DuplicateKey(id) => AppError::Domain(DomainError::DuplicateAccount(id)),
            StoreError::InvalidRow(detail) => AppError::Internal(detail),
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let generic = "There was a problem processing your request. Please try again later.";

        let (status, error_code, message) = match &self {
            // 400 Bad Request
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            AppError::Amount(e) => (StatusCode::BAD_REQUEST, "validation_error", e.to_string()),

            // 401 Unauthorized
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, "authentication_error", msg.clone())
            }

            // 404 Not Found
            AppError::AccountNotFound(_) => {
                (StatusCode::NOT_FOUND, "account_not_found", self.to_string())
            }

            // Duplicate registration conflicts, every other
            // business-rule rejection is a 400
            AppError::Domain(domain_err) => {
                let status = match domain_err {
                    DomainError::DuplicateAccount(_) => StatusCode::CONFLICT,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, domain_err.code(), domain_err.to_string())
            }

            // 409 Conflict
            AppError::StorageConflict => {
                (StatusCode::CONFLICT, "storage_conflict", self.to_string())
            }

            // 500 Internal Server Error - log detail, leak nothing
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    generic.to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    generic.to_string(),
                )
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    generic.to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            error_code: error_code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
