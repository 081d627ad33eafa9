//! Uniform error responses for the HTTP front end.
//!
//! [`ApiError`] pairs a taxonomy code with a human-readable message and
//! renders as the wire shape every failure uses:
//! `{"success": false, "error": "<CODE>", "message": "<text>"}`, with the
//! HTTP status taken from the code's fixed mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use warden_types::ErrorCode;

/// An error response about to cross the wire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    /// Taxonomy code; fixes the HTTP status.
    pub code: ErrorCode,
    /// Human-readable detail for the response body.
    pub message: String,
}

impl ApiError {
    /// An error with an explicit message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// An error with the canned message for its code; used when a failure
    /// result crosses back over the bridge without further context.
    pub fn from_code(code: ErrorCode) -> Self {
        let message = match code {
            ErrorCode::InvalidCommand => "Malformed command",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidEvent => "Unknown event type",
            ErrorCode::Unauthorized => "Missing or invalid token",
            ErrorCode::NoColonyLoaded => "No colony loaded",
            ErrorCode::EventFailed => "Command failed",
            ErrorCode::CooldownActive => "Event is cooling down",
            ErrorCode::RateLimited => "Too many requests",
            ErrorCode::ModNotReady => "Mod not ready",
            ErrorCode::NotImplemented => "Not implemented",
            ErrorCode::NotFound => "No such route",
        };
        Self::new(code, message)
    }
}

impl From<ErrorCode> for ApiError {
    fn from(code: ErrorCode) -> Self {
        Self::from_code(code)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = serde_json::json!({
            "success": false,
            "error": self.code,
            "message": self.message,
        });

        (status, Json(body)).into_response()
    }
}
