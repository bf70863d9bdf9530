//! webuni-relay - HTTP relay between the browser client and the upstream
//! chat completions API.
//!
//! The relay owns no persistent state: each request resolves a credential
//! (server-configured key first, caller's bearer header otherwise), forwards
//! the chat request upstream, and translates the reply into a normalized
//! envelope. All failure paths answer with a JSON error envelope; nothing
//! crashes the listening process.

pub mod config;
pub mod error;
pub mod upstream;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Json, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use webuni_core::{extract_content, ChatCompletionRequest, ChatRequest, ChatResponse};

pub use config::RelayConfig;
pub use error::ApiError;
pub use upstream::{UpstreamClient, UpstreamReply};

/// Request body ceiling in bytes. Larger bodies are rejected before the
/// handler runs, bounding memory per connection.
pub const MAX_BODY_BYTES: usize = 1_000_000;

/// Service identity reported by the health endpoint.
pub const SERVICE_NAME: &str = "webuni-relay";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub upstream: Arc<UpstreamClient>,
}

impl AppState {
    /// Build state from config, constructing the upstream client once.
    pub fn new(config: RelayConfig) -> webuni_core::Result<Self> {
        let upstream = UpstreamClient::new(config.base_url.clone(), config.timeout_seconds)?;
        Ok(Self {
            config: Arc::new(config),
            upstream: Arc::new(upstream),
        })
    }
}

/// Build the relay router with CORS, tracing, and body-limit layers applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(
            // Browser clients connect from any origin; preflights are
            // answered by this layer with an empty success response.
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn(options_no_content))
        .with_state(state)
}

/// Rewrite CORS preflight replies to `204 No Content`.
///
/// The CORS layer answers every OPTIONS request itself with a headers-only
/// `200 OK`; this sits outside it and downgrades the status while keeping
/// the headers it attached.
async fn options_no_content(request: Request, next: Next) -> Response {
    let is_options = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;
    if is_options && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}

/// `GET /health` — service identity, configured model, key presence.
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "service": SERVICE_NAME,
        "model": state.config.model,
        "hasServerKey": state.config.has_server_key(),
    }))
}

/// `POST /api/chat` — forward a chat completion upstream.
///
/// The `stream` flag is forwarded, but the upstream body is buffered either
/// way before being returned.
async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    let payload: ChatRequest = if body.is_empty() {
        ChatRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::Internal(e.to_string()))?
    };

    // Server key takes precedence over the caller's bearer credential.
    let api_key = state
        .config
        .api_key
        .clone()
        .or_else(|| extract_bearer(&headers))
        .ok_or(ApiError::MissingApiKey)?;

    if payload.messages.is_empty() {
        return Err(ApiError::MissingMessages);
    }

    let model = payload
        .model
        .clone()
        .unwrap_or_else(|| state.config.model.clone());

    let temperature = payload.effective_temperature();
    let request = ChatCompletionRequest {
        model: model.clone(),
        messages: payload.messages,
        temperature,
        stream: payload.stream,
    };

    match state.upstream.chat(&api_key, &request).await {
        Ok(UpstreamReply::Success { raw }) => Ok(Json(ChatResponse {
            content: extract_content(&raw),
            model,
            raw,
        })),
        Ok(UpstreamReply::Failed { status, upstream }) => {
            warn!(status, "Upstream chat request failed");
            Err(ApiError::Upstream { status, upstream })
        }
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}

/// Fallback for any unmatched method/path combination.
async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Extract a bearer credential from the Authorization header.
///
/// The `Bearer ` prefix is matched case-insensitively; whitespace around the
/// credential is trimmed. Returns `None` for missing, non-bearer, or empty
/// credentials.
fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    if value.len() < 7 || !value[..7].eq_ignore_ascii_case("bearer ") {
        return None;
    }
    let token = value[7..].trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
