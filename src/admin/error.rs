//! Admin API error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::codes::ErrorCode;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("insufficient scope")]
    InsufficientScope,

    /// 400 with a code-prefixed description.
    #[error("{0}")]
    InvalidRequest(String),

    #[error("update conflict")]
    Conflict,

    /// 500 described by an internal (`IE`) code.
    #[error("internal error ({0})")]
    Internal(ErrorCode),
}

impl ApiError {
    pub fn invalid(code: ErrorCode, message: impl std::fmt::Display) -> Self {
        ApiError::InvalidRequest(code.describe(message))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, description) = match self {
            ApiError::Unauthorized(description) => (StatusCode::UNAUTHORIZED, "unauthorized", description),
            ApiError::InsufficientScope => (
                StatusCode::FORBIDDEN,
                "insufficient_scope",
                "Insufficient scope".to_string(),
            ),
            ApiError::InvalidRequest(description) => (StatusCode::BAD_REQUEST, "invalid_request", description),
            ApiError::Conflict => (
                StatusCode::CONFLICT,
                "update_conflict",
                ErrorCode::UpdateConflict.describe(
                    "Can not override conflicting update, ensure you have the latest data and retry",
                ),
            ),
            ApiError::Internal(code) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                code.describe("Internal Server Error"),
            ),
        };

        (status, Json(json!({ "error": error, "error_description": description }))).into_response()
    }
}
