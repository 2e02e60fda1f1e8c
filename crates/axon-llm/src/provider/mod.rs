//! Provider adapters
//!
//! One adapter per vendor family, each pairing a request encoder with unary
//! and streaming decoders from [`crate::convert`] and talking through the
//! injected [`Transport`].

pub mod anthropic;
pub mod google;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use secrecy::SecretString;
use url::Url;

use crate::error::LlmError;
use crate::transport::Transport;
use crate::types::{ChatResponse, Message, ReasoningEffort, ReasoningFormat, Service, StreamingResponse, Tool};

/// Fully-merged request handed to an adapter
///
/// Built by the dispatcher from a [`crate::types::ChatConfig`] with per-call
/// options folded in; validation has already passed when an adapter sees it.
#[derive(Clone)]
pub struct ProviderRequest {
    /// Provider discriminant
    pub service: Service,
    /// Model identifier
    pub model: String,
    /// Conversation messages
    pub messages: Vec<Message>,
    /// API key, when the provider needs one
    pub api_key: Option<SecretString>,
    /// Base URL override
    pub base_url: Option<Url>,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
    /// Sampling temperature
    pub temperature: Option<f64>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Tools the model may call
    pub tools: Option<Vec<Tool>>,
    /// Browser mode flag
    pub browser: bool,
    /// Reasoning effort level
    pub reasoning_effort: Option<ReasoningEffort>,
    /// Reasoning output format
    pub reasoning_format: Option<ReasoningFormat>,
    /// Thinking token budget
    pub thinking_budget: Option<u32>,
    /// Whether thought summaries should be included
    pub include_thoughts: Option<bool>,
}

impl ProviderRequest {
    /// Base URL string with any trailing slash removed, or the given default
    pub(crate) fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .as_ref()
            .map_or_else(|| default.to_owned(), |url| url.as_str().trim_end_matches('/').to_owned())
    }
}

/// Capabilities advertised by a provider adapter
#[derive(Debug, Clone, Copy)]
pub struct AdapterCapabilities {
    /// Whether the provider supports streaming responses
    pub streaming: bool,
    /// Whether the provider supports tool calling
    pub tool_calling: bool,
}

/// One vendor's encoder/decoder pair
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Service this adapter serves
    fn service(&self) -> Service;

    /// Advertised capabilities
    fn capabilities(&self) -> AdapterCapabilities;

    /// Send a unary request and decode the response
    async fn call(&self, request: &ProviderRequest, transport: &dyn Transport) -> Result<ChatResponse, LlmError>;

    /// Send a streaming request and return the live stream handle
    async fn stream(&self, request: &ProviderRequest, transport: &dyn Transport)
    -> Result<StreamingResponse, LlmError>;
}

/// Serialize a wire request body
pub(crate) fn encode_body<T: serde::Serialize>(service: Service, value: &T) -> Result<String, LlmError> {
    serde_json::to_string(value).map_err(|e| LlmError::Stream(format!("{service}: failed to encode request: {e}")))
}

/// Decode a unary response body, surfacing a provider error on mismatch
pub(crate) fn decode_body<T: serde::de::DeserializeOwned>(
    service: Service,
    status: http::StatusCode,
    body: &str,
) -> Result<T, LlmError> {
    serde_json::from_str(body).map_err(|e| LlmError::Provider {
        service,
        status,
        message: format!("unparsable response body: {e}"),
    })
}
