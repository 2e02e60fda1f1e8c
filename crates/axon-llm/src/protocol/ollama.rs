//! Ollama local chat API wire format
//!
//! Unary responses and NDJSON stream lines share one shape.

use serde::{Deserialize, Serialize};

/// Chat request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaRequest {
    /// Model identifier
    pub model: String,
    /// Conversation messages
    pub messages: Vec<OllamaMessage>,
    /// Whether to stream the response
    pub stream: bool,
    /// Generation options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaOptions>,
}

/// Message with flattened text content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaMessage {
    /// Message role
    pub role: String,
    /// Text content
    pub content: String,
}

/// Generation options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OllamaOptions {
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

/// Chat response; one NDJSON line during streaming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaResponse {
    /// Model echoed by the server
    #[serde(default)]
    pub model: Option<String>,
    /// Generated (or partial) message
    #[serde(default)]
    pub message: Option<OllamaMessage>,
    /// Whether this is the final line
    #[serde(default)]
    pub done: bool,
    /// Prompt token count (final line only)
    #[serde(default)]
    pub prompt_eval_count: Option<u32>,
    /// Completion token count (final line only)
    #[serde(default)]
    pub eval_count: Option<u32>,
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaErrorResponse {
    /// Error message
    pub error: String,
}
