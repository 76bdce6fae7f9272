//! Error handling for the toy lifecycle layer
//!
//! Three kinds of failure cross module boundaries:
//! - `ValidationError` when a record or request is built from bad input
//! - `NotFound` when a referenced toy does not exist (carries an HTTP-style code)
//! - `Internal` for everything else (store unavailable, corrupt stored data)
//!
//! Each kind knows its HTTP status and the label used for error metrics.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Result type for query and command processing
pub type ToyBoxResult<T> = Result<T, ToyBoxError>;

/// Raised when a record or request fails construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Required string field is empty
    #[error("field '{field}' cannot be empty")]
    EmptyField { field: &'static str },

    /// Numeric field holds NaN or an infinity
    #[error("field '{field}' must be a finite number, got {value}")]
    NonFiniteNumber { field: &'static str, value: f64 },

    /// Purchase offered below zero
    #[error("selling_price must not be negative, got {value}")]
    NegativePrice { value: f64 },

    /// Input has the wrong shape: missing field, wrong type, not an object
    #[error("malformed record: {message}")]
    Malformed { message: String },
}

impl From<serde_json::Error> for ValidationError {
    fn from(error: serde_json::Error) -> Self {
        ValidationError::Malformed {
            message: error.to_string(),
        }
    }
}

/// Main error type for toy operations
#[derive(Debug, Error)]
pub enum ToyBoxError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{message}")]
    NotFound { code: u16, message: String },

    #[error("internal failure: {0}")]
    Internal(String),
}

impl ToyBoxError {
    /// Build a not-found error with the 404 code attached.
    pub fn not_found(message: impl Into<String>) -> Self {
        ToyBoxError::NotFound {
            code: StatusCode::NOT_FOUND.as_u16(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ToyBoxError::Internal(message.into())
    }

    /// HTTP status this error maps to at the boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            ToyBoxError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ToyBoxError::NotFound { code, .. } => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::NOT_FOUND)
            }
            ToyBoxError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label used for error metrics
    pub fn error_type(&self) -> &'static str {
        match self {
            ToyBoxError::Validation(_) => "validation_error",
            ToyBoxError::NotFound { .. } => "not_found",
            ToyBoxError::Internal(_) => "internal_error",
        }
    }
}

impl From<StoreError> for ToyBoxError {
    fn from(error: StoreError) -> Self {
        ToyBoxError::Internal(error.to_string())
    }
}

impl IntoResponse for ToyBoxError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
