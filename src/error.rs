// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Failures raised by the document store, the indexer and the search backends.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Backing store host or credential is missing.
    #[error("search backend not configured: {0}")]
    Configuration(String),

    /// A document failed validation on upsert.
    #[error("invalid document: {0}")]
    Validation(String),

    #[error("document '{id}' not found in '{collection}'")]
    NotFound { collection: String, id: String },

    /// A wire request that cannot be executed (unknown field, bad filter, ...).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Network, timeout or malformed-response failure while querying.
    #[error("retrieval failed: {0}")]
    Retrieval(String),
}

impl From<validator::ValidationErrors> for StoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        StoreError::Validation(errors.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Retrieval(format!("request timed out: {}", err))
        } else if err.is_decode() {
            StoreError::Retrieval(format!("malformed response: {}", err))
        } else {
            StoreError::Retrieval(err.to_string())
        }
    }
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 404 Not Found
    NotFound(String),

    // 503 Service Unavailable (search backend not configured)
    ServiceUnavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg)
            }
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Allows using `?` on store operations inside handlers.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Configuration(msg) => AppError::ServiceUnavailable(msg),
            StoreError::Validation(msg) | StoreError::InvalidQuery(msg) => {
                AppError::BadRequest(msg)
            }
            err @ StoreError::NotFound { .. } => AppError::NotFound(err.to_string()),
            StoreError::Retrieval(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}
