//! Error taxonomy shared by every handler.
//!
//! Each variant maps to a fixed HTTP status and renders as a `{"msg": ...}`
//! JSON body, matching the wire contract of the API. Uniqueness violations
//! are surfaced as 400 rather than 409, which is the observed contract.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed input (required field absent, bad date, bad enum).
    #[error("{0}")]
    Validation(String),

    /// Missing, malformed, or expired credential; or the token's user is gone.
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated but not privileged for the operation or resource.
    #[error("{0}")]
    Forbidden(String),

    /// The referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation (email, tech nombre+version, red nombre).
    #[error("{0}")]
    Conflict(String),

    /// Unexpected storage/runtime failure. The message is surfaced in the body.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            // Kept at 400: clients of the original API match on the message.
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "msg": msg }))).into_response()
    }
}

/// Result alias used by all handlers.
pub type ApiResult<T> = Result<T, ApiError>;
