//! Upstream chat completions client.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use webuni_core::{ChatCompletionRequest, Error, Result};

/// Outcome of an upstream call that produced an HTTP response.
///
/// Transport failures (connect errors, timeouts) surface as [`Error`] from
/// [`UpstreamClient::chat`] instead; the relay reports those as internal.
#[derive(Debug)]
pub enum UpstreamReply {
    /// 2xx response. `raw` is the parsed body, or `Null` if unparsable.
    Success { raw: JsonValue },
    /// Non-2xx response. `upstream` is the body parsed as JSON when
    /// possible, else the raw text, preserved for the caller.
    Failed { status: u16, upstream: JsonValue },
}

/// Thin reqwest wrapper around the upstream chat completions endpoint.
pub struct UpstreamClient {
    client: Client,
    base_url: String,
}

impl UpstreamClient {
    /// Create a new client with the given base URL and timeout.
    pub fn new(base_url: impl Into<String>, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.into();
        info!("Upstream client initialized: url={}", base_url);

        Ok(Self { client, base_url })
    }

    /// Forward a chat completion request with the resolved credential.
    ///
    /// Exactly one upstream call per invocation; the status check happens
    /// here so the handler only translates the reply into an envelope.
    pub async fn chat(&self, api_key: &str, request: &ChatCompletionRequest) -> Result<UpstreamReply> {
        let url = format!(
            "{}/chat/completions",
            self.base_url.trim_end_matches('/')
        );

        debug!(
            model = %request.model,
            message_count = request.messages.len(),
            "Forwarding chat completion"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Upstream request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Request(format!("Failed to read upstream body: {}", e)))?;

        if !status.is_success() {
            let upstream = safe_parse_json(&text).unwrap_or(JsonValue::String(text));
            return Ok(UpstreamReply::Failed {
                status: status.as_u16(),
                upstream,
            });
        }

        let raw = safe_parse_json(&text).unwrap_or(JsonValue::Null);
        Ok(UpstreamReply::Success { raw })
    }
}

/// Parse text as JSON, returning `None` instead of an error on failure.
fn safe_parse_json(text: &str) -> Option<JsonValue> {
    serde_json::from_str(text).ok()
}
