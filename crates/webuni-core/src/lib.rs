//! # webuni-core
//!
//! Core types shared by the webuni relay and sync crates.
//!
//! This crate provides the chat wire types, the sync record/bucket model,
//! and the error taxonomy the other webuni crates depend on.

pub mod chat;
pub mod error;
pub mod sync;

// Re-export commonly used types at crate root
pub use chat::{
    extract_content, ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
    ChatRequest, ChatResponse, DEFAULT_TEMPERATURE,
};
pub use error::{Error, Result};
pub use sync::{Bucket, SyncQueueItem, SyncRecord};
