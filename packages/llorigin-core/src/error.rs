//! Centralized error types for the relay core library.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Maps errors to appropriate HTTP status codes
//! - Implements `IntoResponse` for automatic JSON error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Trait for error types that provide machine-readable error codes.
pub trait ErrorCode {
    /// Returns a machine-readable error code for API responses.
    fn code(&self) -> &'static str;
}

/// Application-wide error type for the relay server.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum RelayError {
    /// Requested stream id does not exist in the frozen registry.
    #[error("unknown stream: {0}")]
    UnknownStream(String),

    /// A wait (manifest/init/chunk/first-byte) exceeded its timeout.
    #[error("wait timed out")]
    Timeout,

    /// The `/ssss/{stream}/{adaptationSetId}` override was out of range.
    #[error("SSRS adaptation set out of range")]
    SsrsOutOfRange,

    /// Client request could not be parsed (malformed name, missing segment).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal failure (spawn failure, lock poisoning, I/O error).
    #[error("internal error: {0}")]
    Internal(String),

    /// Configuration could not be loaded; fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ErrorCode for RelayError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownStream(_) => "unknown_stream",
            Self::Timeout => "timeout",
            Self::SsrsOutOfRange => "ssrs_out_of_range",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Internal(_) => "internal_error",
            Self::Configuration(_) => "configuration_error",
        }
    }
}

impl RelayError {
    /// Maps the error to an appropriate HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownStream(_) | Self::Timeout | Self::SsrsOutOfRange => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convenient Result alias for application-wide operations.
pub type RelayResult<T> = Result<T, RelayError>;

/// JSON response body for error responses.
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    status: u16,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if matches!(status, StatusCode::INTERNAL_SERVER_ERROR) {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}
