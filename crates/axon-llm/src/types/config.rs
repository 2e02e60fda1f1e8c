use std::fmt;
use std::sync::Arc;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use super::message::Message;
use super::service::Service;
use super::tool::Tool;
use crate::transport::Transport;

/// How much reasoning the model should spend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    /// Minimal reasoning
    Low,
    /// Moderate reasoning
    Medium,
    /// Extensive reasoning
    High,
    /// Provider default behavior
    Default,
    /// Reasoning disabled
    None,
}

impl ReasoningEffort {
    /// Wire value of the effort level
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Default => "default",
            Self::None => "none",
        }
    }
}

/// How reasoning should be surfaced in the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningFormat {
    /// Raw reasoning text interleaved with content
    Raw,
    /// Reasoning parsed into a separate field
    Parsed,
}

impl ReasoningFormat {
    /// Wire value of the format
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Parsed => "parsed",
        }
    }
}

/// Unified request configuration
///
/// Built by the caller per call. The core reads it and never mutates it;
/// per-call [`CallOptions`] win over the overlapping fields here.
#[derive(Clone)]
pub struct ChatConfig {
    /// Provider discriminant
    pub service: Service,
    /// Model identifier
    pub model: String,
    /// Conversation messages
    pub messages: Vec<Message>,
    /// API key for the provider
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
    /// System prompt used by the ask variants
    pub system_prompt: Option<String>,
    /// Transport override for this config
    pub transport: Option<Arc<dyn Transport>>,
    /// Browser mode (adds the direct-browser-access header for Anthropic)
    pub browser: bool,
    /// Reasoning effort level
    pub reasoning_effort: Option<ReasoningEffort>,
    /// Reasoning output format
    pub reasoning_format: Option<ReasoningFormat>,
    /// Thinking token budget (Anthropic thinking, Google `gemini-2.5`)
    pub thinking_budget: Option<u32>,
    /// Whether thought summaries should be included (Google `gemini-2.5`)
    pub include_thoughts: Option<bool>,
}

impl ChatConfig {
    /// Start a configuration for the given service and model
    pub fn new(service: Service, model: impl Into<String>) -> Self {
        Self {
            service,
            model: model.into(),
            messages: Vec::new(),
            api_key: None,
            base_url: None,
            headers: Vec::new(),
            temperature: None,
            max_tokens: None,
            tools: None,
            system_prompt: None,
            transport: None,
            browser: false,
            reasoning_effort: None,
            reasoning_format: None,
            thinking_budget: None,
            include_thoughts: None,
        }
    }

    /// Set the conversation messages
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Set the API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    /// Override the provider base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Add an extra request header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the sampling temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the generation token limit
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the callable tools
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set the system prompt used by the ask variants
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Override the transport for this config
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Enable browser mode
    #[must_use]
    pub fn with_browser_mode(mut self, browser: bool) -> Self {
        self.browser = browser;
        self
    }

    /// Set the reasoning effort level
    #[must_use]
    pub fn with_reasoning_effort(mut self, effort: ReasoningEffort) -> Self {
        self.reasoning_effort = Some(effort);
        self
    }

    /// Set the reasoning output format
    #[must_use]
    pub fn with_reasoning_format(mut self, format: ReasoningFormat) -> Self {
        self.reasoning_format = Some(format);
        self
    }

    /// Set the thinking token budget
    #[must_use]
    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }

    /// Set whether thought summaries should be included
    #[must_use]
    pub fn with_include_thoughts(mut self, include: bool) -> Self {
        self.include_thoughts = Some(include);
        self
    }
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("service", &self.service)
            .field("model", &self.model)
            .field("messages", &self.messages.len())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("tools", &self.tools.as_ref().map(Vec::len))
            .field("transport", &self.transport.as_ref().map(|_| "custom"))
            .field("browser", &self.browser)
            .field("reasoning_effort", &self.reasoning_effort)
            .field("reasoning_format", &self.reasoning_format)
            .field("thinking_budget", &self.thinking_budget)
            .field("include_thoughts", &self.include_thoughts)
            .finish_non_exhaustive()
    }
}

/// Per-call overrides merged over [`ChatConfig`] by the dispatcher
#[derive(Clone, Default)]
pub struct CallOptions {
    /// Tools override
    pub tools: Option<Vec<Tool>>,
    /// Temperature override
    pub temperature: Option<f64>,
    /// Token limit override
    pub max_tokens: Option<u32>,
    /// Transport override for this call
    pub transport: Option<Arc<dyn Transport>>,
}

impl CallOptions {
    /// Empty options (no overrides)
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tools for this call
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Override the temperature for this call
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Override the token limit for this call
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Override the transport for this call
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }
}
