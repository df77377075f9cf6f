//! services/api/src/error.rs
//!
//! Defines the primary error type for the API service and the JSON error body
//! returned by every handler.

use crate::config::ConfigError;
use axum::{http::StatusCode, Json};
use discipline_core::ports::PortError;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The body of every non-2xx response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// What handlers return on failure.
pub type HandlerError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (status, Json(ErrorResponse { error: message.into() }))
}

/// Maps a port failure to a status code. Storage failures are logged, not detailed.
pub fn port_error(context: &str, e: PortError) -> HandlerError {
    match e {
        PortError::NotFound(what) => error_response(StatusCode::NOT_FOUND, what),
        PortError::PermissionDenied(why) => error_response(StatusCode::FORBIDDEN, why),
        PortError::InvalidInput(why) => error_response(StatusCode::BAD_REQUEST, why),
        other => {
            error!("{}: {:?}", context, other);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
        }
    }
}
