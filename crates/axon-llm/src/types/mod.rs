//! Unified provider-agnostic types
//!
//! The normalized conversation/tool/streaming model that every vendor wire
//! format converts to and from.

pub mod config;
pub mod message;
pub mod response;
pub mod service;
pub mod stream;
pub mod tool;

pub use config::{CallOptions, ChatConfig, ReasoningEffort, ReasoningFormat};
pub use message::{Content, ContentPart, Message, Role};
pub use response::{Capabilities, ChatResponse, ResponseKind, Usage};
pub use service::Service;
pub use stream::{StreamChunk, StreamingResponse};
pub use tool::{Tool, ToolCall};
