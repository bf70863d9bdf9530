//! Relay configuration, read once at startup.

use webuni_core::Result;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8787;

/// Default upstream API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default upstream timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration for the relay service.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Interface to bind.
    pub host: String,
    /// Listening port.
    pub port: u16,
    /// Base URL of the upstream chat completions API.
    pub base_url: String,
    /// Model used when the caller does not name one.
    pub model: String,
    /// Server-side credential. When present it takes precedence over any
    /// bearer credential the caller supplies.
    pub api_key: Option<String>,
    /// Upstream request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RelayConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `HOST` | `0.0.0.0` | Bind interface |
    /// | `PORT` | `8787` | Listening port |
    /// | `OPENAI_BASE_URL` | `https://api.openai.com/v1` | Upstream base URL |
    /// | `OPENAI_MODEL` | `gpt-4o-mini` | Default model |
    /// | `OPENAI_API_KEY` | (none) | Server-side credential |
    /// | `OPENAI_TIMEOUT` | `300` | Upstream timeout in seconds |
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            api_key,
            timeout_seconds: std::env::var("OPENAI_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// True when a server-side credential is configured.
    pub fn has_server_key(&self) -> bool {
        self.api_key.is_some()
    }
}
