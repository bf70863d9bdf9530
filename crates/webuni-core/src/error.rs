//! Error types for webuni.

use thiserror::Error;

/// Result type alias using webuni's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for webuni operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing credential for an upstream call
    #[error("Missing API key: {0}")]
    MissingCredential(String),

    /// Upstream chat API returned a non-success status
    #[error("Upstream returned {status}")]
    Upstream {
        status: u16,
        body: serde_json::Value,
    },

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Remote record store operation failed
    #[error("Store error: {0}")]
    Store(String),

    /// Operation attempted while offline
    #[error("Offline: {0}")]
    Offline(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
