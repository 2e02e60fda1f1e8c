//! Unified client for chat-completion APIs
//!
//! One provider-agnostic surface over seven vendor wire formats (OpenAI,
//! Groq, DeepSeek, xAI, Anthropic, Google, Ollama): send a conversation,
//! optionally with callable tools, and receive the response in one piece or
//! as an incremental stream. All HTTP traffic flows through an injectable
//! [`Transport`], so the crate performs no I/O of its own beyond the ambient
//! `reqwest`-backed default.
//!
//! ```no_run
//! use axon_llm::{ChatConfig, Message, Service, send};
//!
//! # async fn example() -> Result<(), axon_llm::LlmError> {
//! let config = ChatConfig::new(Service::OpenAi, "gpt-4o")
//!     .with_api_key("sk-...")
//!     .with_messages(vec![Message::user("Hello!")]);
//!
//! let response = send(&config, None).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod accumulate;
pub mod client;
pub mod convert;
pub mod error;
pub mod protocol;
pub mod provider;
pub mod sse;
pub mod transport;
pub mod types;
pub mod validate;

pub use client::{ask, capabilities, send, stream, stream_ask};
pub use error::LlmError;
pub use provider::{Adapter, AdapterCapabilities};
pub use transport::{
    HttpTransport, Transport, TransportError, TransportRequest, TransportResponse, default_transport,
    set_default_transport,
};
pub use types::{
    CallOptions, Capabilities, ChatConfig, ChatResponse, Content, ContentPart, Message, ReasoningEffort,
    ReasoningFormat, ResponseKind, Role, Service, StreamChunk, StreamingResponse, Tool, ToolCall, Usage,
};
