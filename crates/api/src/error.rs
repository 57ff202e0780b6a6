//! Error types for the HTTP layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use safety_core::CoreError;
use thiserror::Error;

/// Errors that can occur while handling a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No authenticated identity on the request.
    #[error("missing X-User-Id header")]
    Unauthorized,

    /// Request body could not be parsed.
    #[error("invalid request body: {0}")]
    MalformedBody(String),

    /// Engine rejected or failed the operation.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Core(err) => match err {
                CoreError::SelfRequest | CoreError::Validation(_) => StatusCode::BAD_REQUEST,
                CoreError::DuplicateRelationship => StatusCode::CONFLICT,
                CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                CoreError::Forbidden(_) | CoreError::NotFriends | CoreError::NotVip => {
                    StatusCode::FORBIDDEN
                }
                CoreError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                CoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Stable error code returned to clients.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "unauthorized",
            ApiError::MalformedBody(_) => "validation",
            ApiError::Core(err) => err.code(),
        }
    }
}

impl From<database::DatabaseError> for ApiError {
    fn from(err: database::DatabaseError) -> Self {
        ApiError::Core(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage details stay in the logs.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Internal error");
            "internal server error".to_string()
        } else {
            tracing::warn!(code = self.code(), error = %self, "Request rejected");
            self.to_string()
        };

        let body = serde_json::json!({
            "error": message,
            "code": self.code(),
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
