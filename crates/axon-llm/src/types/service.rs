use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Provider discriminant of a unified request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    /// OpenAI chat completions
    OpenAi,
    /// Groq (OpenAI-compatible)
    Groq,
    /// DeepSeek (OpenAI-compatible)
    DeepSeek,
    /// xAI (OpenAI-compatible)
    XAi,
    /// Anthropic Messages API
    Anthropic,
    /// Google Generative Language API
    Google,
    /// Ollama local API
    Ollama,
}

impl Service {
    /// Wire name of the service
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Groq => "groq",
            Self::DeepSeek => "deepseek",
            Self::XAi => "xai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Ollama => "ollama",
        }
    }

    /// Whether the provider speaks the OpenAI chat-completions wire format
    pub const fn is_openai_compatible(self) -> bool {
        matches!(self, Self::OpenAi | Self::Groq | Self::DeepSeek | Self::XAi)
    }

    /// Whether calls to the provider require an API key
    pub const fn requires_api_key(self) -> bool {
        !matches!(self, Self::Ollama)
    }

    /// Whether the provider authenticates with an `Authorization: Bearer` header
    pub const fn supports_bearer_auth(self) -> bool {
        self.is_openai_compatible()
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Self::OpenAi),
            "groq" => Ok(Self::Groq),
            "deepseek" => Ok(Self::DeepSeek),
            "xai" => Ok(Self::XAi),
            "anthropic" => Ok(Self::Anthropic),
            "google" => Ok(Self::Google),
            "ollama" => Ok(Self::Ollama),
            other => Err(LlmError::UnsupportedService(other.to_owned())),
        }
    }
}
