//! Chat relay request and response types.
//!
//! [`ChatRequest`] is the body the browser client posts to the relay;
//! [`ChatCompletionRequest`] is the body the relay forwards upstream.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Temperature used when the caller omits one or supplies a non-number.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Body accepted by the relay's chat endpoint.
///
/// Parsing is deliberately lenient: a missing or non-array `messages`
/// becomes an empty sequence (rejected later with a stable error code), and
/// a non-numeric `temperature` is treated as absent rather than failing the
/// whole request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default, deserialize_with = "lenient_messages")]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_temperature")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequest {
    /// Effective temperature: the caller's number, or the default.
    pub fn effective_temperature(&self) -> f64 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }
}

/// Accept any JSON value for `messages`, keeping only arrays.
fn lenient_messages<'de, D>(deserializer: D) -> Result<Vec<ChatMessage>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    match value {
        JsonValue::Array(_) => serde_json::from_value(value).map_err(serde::de::Error::custom),
        _ => Ok(Vec::new()),
    }
}

/// Accept any JSON value for `temperature`, keeping only numbers.
fn lenient_temperature<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(value.as_f64())
}

/// Normalized response the relay returns to the browser client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// First choice's message content, empty if absent or malformed.
    pub content: String,
    /// Model the request was issued against.
    pub model: String,
    /// Full upstream payload, kept for traceability.
    pub raw: JsonValue,
}

/// Request body forwarded to the upstream chat completions endpoint.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub stream: bool,
}

/// Single chat completion choice, as returned upstream.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: usize,
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Upstream chat completions response (the subset the relay cares about).
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// Extract the first choice's message content from an upstream payload.
///
/// Malformed or partial payloads yield an empty string rather than an error:
/// the raw body is returned to the caller either way.
pub fn extract_content(raw: &JsonValue) -> String {
    raw.pointer("/choices/0/message/content")
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_full_body() {
        let json = r#"{
            "messages": [{"role": "user", "content": "hi"}],
            "model": "gpt-4o",
            "temperature": 0.2,
            "stream": true
        }"#;

        let req: ChatRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].role, "user");
        assert_eq!(req.model.as_deref(), Some("gpt-4o"));
        assert_eq!(req.temperature, Some(0.2));
        assert!(req.stream);
    }

    #[test]
    fn test_chat_request_defaults() {
        let req: ChatRequest = serde_json::from_str("{}").unwrap();
        assert!(req.messages.is_empty());
        assert!(req.model.is_none());
        assert!(req.temperature.is_none());
        assert!(!req.stream);
        assert_eq!(req.effective_temperature(), DEFAULT_TEMPERATURE);
    }

    #[test]
    fn test_chat_request_non_array_messages_degrade_to_empty() {
        let json = r#"{"messages": "hi"}"#;
        let req: ChatRequest = serde_json::from_str(json).unwrap();
        assert!(req.messages.is_empty());

        let json = r#"{"messages": {"role": "user"}}"#;
        let req: ChatRequest = serde_json::from_str(json).unwrap();
        assert!(req.messages.is_empty());
    }

    #[test]
    fn test_chat_request_non_numeric_temperature() {
        let json = r#"{"messages": [], "temperature": "hot"}"#;
        let req: ChatRequest = serde_json::from_str(json).unwrap();
        assert!(req.temperature.is_none());
        assert_eq!(req.effective_temperature(), DEFAULT_TEMPERATURE);
    }

    #[test]
    fn test_chat_request_numeric_temperature_passthrough() {
        let json = r#"{"messages": [], "temperature": 1.5}"#;
        let req: ChatRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.effective_temperature(), 1.5);
    }

    #[test]
    fn test_chat_completion_request_serialization() {
        let request = ChatCompletionRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "Hello".to_string(),
            }],
            temperature: 0.7,
            stream: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["content"], "Hello");
        assert_eq!(json["temperature"], 0.7);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_temperature_survives_parse_and_forward_exactly() {
        // The caller's number must reach the upstream wire body unchanged.
        let req: ChatRequest =
            serde_json::from_str(r#"{"messages": [], "temperature": 0.3}"#).unwrap();
        let forwarded = ChatCompletionRequest {
            model: "gpt-4o-mini".to_string(),
            messages: Vec::new(),
            temperature: req.effective_temperature(),
            stream: false,
        };
        let json = serde_json::to_value(&forwarded).unwrap();
        assert_eq!(json["temperature"], 0.3);
    }

    #[test]
    fn test_extract_content() {
        let raw = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "hello"}}]
        });
        assert_eq!(extract_content(&raw), "hello");
    }

    #[test]
    fn test_extract_content_missing_choices() {
        assert_eq!(extract_content(&serde_json::json!({})), "");
    }

    #[test]
    fn test_extract_content_malformed_choices() {
        let raw = serde_json::json!({"choices": "not an array"});
        assert_eq!(extract_content(&raw), "");
    }

    #[test]
    fn test_chat_completion_response_deserialization() {
        let json = r#"{
            "id": "chatcmpl-123",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello!"},
                "finish_reason": "stop"
            }]
        }"#;

        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.choices.len(), 1);
        assert_eq!(response.choices[0].message.content, "Hello!");
        assert_eq!(response.choices[0].finish_reason, Some("stop".to_string()));
    }

    #[test]
    fn test_chat_response_round_trip() {
        let resp = ChatResponse {
            content: "hello".to_string(),
            model: "gpt-4o-mini".to_string(),
            raw: serde_json::json!({"choices": []}),
        };
        let json = serde_json::to_string(&resp).unwrap();
        let back: ChatResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content, "hello");
        assert_eq!(back.model, "gpt-4o-mini");
    }
}
