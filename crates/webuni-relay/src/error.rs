//! Relay error envelopes.
//!
//! Every failure path answers with a JSON body carrying a stable `error`
//! code and, where applicable, a `message` or `upstream` detail field.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::Value as JsonValue;

/// Failure modes of the relay's HTTP surface.
#[derive(Debug)]
pub enum ApiError {
    /// No server credential and no usable Authorization header.
    MissingApiKey,
    /// Client posted an empty or missing messages sequence.
    MissingMessages,
    /// Upstream answered with a non-success status; passed through.
    Upstream { status: u16, upstream: JsonValue },
    /// Anything unexpected: malformed client JSON, network fault.
    Internal(String),
    /// Unmatched method/path combination.
    NotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingApiKey => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "Missing API key",
                    "message": "Set OPENAI_API_KEY in .env or pass Authorization: Bearer sk-...",
                })),
            )
                .into_response(),
            ApiError::MissingMessages => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "messages is required" })),
            )
                .into_response(),
            ApiError::Upstream { status, upstream } => {
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                (
                    status,
                    Json(serde_json::json!({
                        "error": "OpenAI request failed",
                        "upstream": upstream,
                    })),
                )
                    .into_response()
            }
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "internal_error",
                    "message": message,
                })),
            )
                .into_response(),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "not_found" })),
            )
                .into_response(),
        }
    }
}
