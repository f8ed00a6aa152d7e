//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use orders_core::error::OrderError;
use orders_events::bus::CloseError;

use crate::response::{ApiResponse, codes};

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    /// The event pipeline failed to shut down cleanly.
    #[error("event pipeline error: {0}")]
    Events(#[from] CloseError),
}

/// Request-level error, rendered into the platform envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The caller's identity headers are missing or malformed.
    #[error("{0}")]
    Unauthorized(String),

    /// The caller may not act on this resource.
    #[error("{0}")]
    Forbidden(String),

    /// The request data is invalid.
    #[error("{0}")]
    Validation(String),

    /// The resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Unexpected server-side failure.
    #[error("{0}")]
    Internal(String),
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(_) => ApiError::NotFound("order not found".to_string()),
            OrderError::Validation(message) => ApiError::Validation(message),
            OrderError::Forbidden(message) => ApiError::Forbidden(message),
            OrderError::Infrastructure(message) => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, codes::UNAUTHORIZED),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, codes::FORBIDDEN),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, codes::VALIDATION),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, codes::NOT_FOUND),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, codes::INTERNAL_SERVER),
        };

        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), code, message = %message, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), code, message = %message, "request rejected");
        }

        (status, Json(ApiResponse::error(code, message))).into_response()
    }
}
