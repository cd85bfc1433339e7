//! Error types for the blog server
//!
//! [`ServerError`] covers startup failures; [`ApiError`] is what request
//! handlers return and knows how to render itself as an HTTP response.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use blogstore_core::schema::POSTS_TABLE;
use blogstore_core::StoreError;
use thiserror::Error;

use crate::api::ApiResponse;

/// Result type for server startup
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error type for server startup
#[derive(Debug, Error)]
pub enum ServerError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Invalid listen address
    #[error("Invalid listen address: {0}")]
    Address(String),

    /// Logging could not be initialized
    #[error("Logging error: {0}")]
    Logging(String),

    /// The store could not be created
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Error returned by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body failed validation
    #[error("{0}")]
    Validation(String),

    /// The request body is not valid JSON for the endpoint
    #[error("Error decoding request body: {0}")]
    Decode(String),

    /// The store rejected the operation
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A blocking task failed
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Decode(rejection.body_text())
    }
}

impl ApiError {
    /// HTTP status and client-facing message
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Decode(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Store(StoreError::NotFound { table, key }) => {
                let kind = if table == POSTS_TABLE { "post" } else { "comment" };
                (StatusCode::NOT_FOUND, format!("No {} found with ID {}", kind, key))
            }
            ApiError::Store(StoreError::ForeignKeyViolation { key, .. }) => (
                StatusCode::BAD_REQUEST,
                format!("No post found with ID {}", key),
            ),
            ApiError::Store(err) if err.is_transient() => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Store is busy, try again later".to_string(),
            ),
            ApiError::Store(_) | ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        let body: ApiResponse<()> = ApiResponse::Error { error: message };
        (status, Json(body)).into_response()
    }
}
