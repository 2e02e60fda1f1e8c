use http::StatusCode;
use thiserror::Error;

use crate::transport::TransportError;
use crate::types::Service;

/// Errors that can occur during chat-completion operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// Request configuration failed validation
    #[error("invalid config: {0}")]
    Config(String),

    /// Conversation ordering violates the provider's tool-call protocol
    #[error("conversation flow error at message {position}: {message}")]
    Flow {
        /// Zero-based position of the offending message
        position: usize,
        /// What was violated
        message: String,
    },

    /// A `tool_result` message lacks the linkage the provider requires
    #[error("tool result error: {0}")]
    ToolResult(String),

    /// Provider returned a non-2xx response
    #[error("{service} returned {status}: {message}")]
    Provider {
        /// Provider that produced the error
        service: Service,
        /// HTTP status code
        status: StatusCode,
        /// Vendor error text when parsable, raw body otherwise
        message: String,
    },

    /// The injected transport failed or was aborted
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Framing-level failure of the SSE/NDJSON stream layer
    #[error("stream error: {0}")]
    Stream(String),

    /// Service discriminant is not one of the known providers
    #[error("unsupported service: {0}")]
    UnsupportedService(String),
}
