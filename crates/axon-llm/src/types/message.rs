use serde::{Deserialize, Serialize};

use super::tool::ToolCall;

/// Role of a message participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// System instruction
    System,
    /// User message
    User,
    /// Assistant response
    Assistant,
    /// Assistant turn carrying tool invocations (coerced to assistant on the wire)
    ToolCall,
    /// Result of a tool invocation
    ToolResult,
}

/// One turn in a conversation
///
/// Created by the caller and never mutated by the core; responses return the
/// input sequence with one appended assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message author
    pub role: Role,
    /// Message content
    pub content: Content,
    /// ID of the tool call this message responds to (`tool_result` linkage)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Function name (`tool_result` linkage for providers without call ids)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tool calls issued by the assistant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Reasoning trace attached to a decoded assistant turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl Message {
    /// A plain message with the given role and text content
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Content::Text(content.into()),
            tool_call_id: None,
            name: None,
            tool_calls: None,
            reasoning: None,
        }
    }

    /// A user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    /// An assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// A system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    /// A tool result linked to a prior tool call by id
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::ToolResult,
            content: Content::Text(content.into()),
            tool_call_id: Some(tool_call_id.into()),
            name: None,
            tool_calls: None,
            reasoning: None,
        }
    }
}

/// Message content, either plain text or an ordered sequence of typed parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Plain text content
    Text(String),
    /// Structured content parts (text, images, media)
    Parts(Vec<ContentPart>),
}

impl Content {
    /// Best-effort textualization: text parts joined in order, media parts
    /// rendered as their URL
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => text.as_str(),
                    ContentPart::Image { url, .. }
                    | ContentPart::Audio { url }
                    | ContentPart::Video { url }
                    | ContentPart::File { url } => url.as_str(),
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }

    /// Whether any text is present after trimming
    pub fn is_empty_text(&self) -> bool {
        self.as_text().trim().is_empty()
    }
}

impl Default for Content {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// Individual part within a multipart message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text block
    Text {
        /// The text string
        text: String,
    },
    /// Image reference (URL or base64 data URL)
    Image {
        /// URL or data URL
        url: String,
        /// Detail level hint
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    /// Audio reference
    Audio {
        /// URL of the audio resource
        url: String,
    },
    /// Video reference
    Video {
        /// URL of the video resource
        url: String,
    },
    /// File reference
    File {
        /// URL of the file resource
        url: String,
    },
}
