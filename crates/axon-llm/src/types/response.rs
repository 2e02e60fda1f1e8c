use serde::{Deserialize, Serialize};

use super::message::{Content, Message, Role};
use super::service::Service;
use super::tool::ToolCall;

/// Token accounting for one exchange
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt
    pub input_tokens: u32,
    /// Tokens generated in the completion
    pub output_tokens: u32,
    /// Total tokens (input + output)
    pub total_tokens: u32,
    /// Tokens spent on reasoning, when the vendor reports them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u32>,
    /// Passthrough cost figure, when the vendor reports one; never computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

impl Usage {
    /// Usage from input/output counts, deriving the total
    pub const fn from_counts(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            reasoning_tokens: None,
            cost: None,
        }
    }
}

/// Which kinds of payload a decoded response actually carries
///
/// Each flag is true iff the corresponding field is populated and non-empty
/// after trimming, so callers can branch without inspecting the fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Non-empty text content present
    pub has_text: bool,
    /// Non-empty reasoning trace present
    pub has_reasoning: bool,
    /// At least one tool call present
    pub has_tool_calls: bool,
}

/// Coarse classification of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Nothing usable decoded
    Empty,
    /// Text only
    Text,
    /// Tool calls only
    ToolCalls,
    /// Reasoning only
    Reasoning,
    /// More than one payload kind
    Mixed,
}

/// Unified non-streaming result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Provider that produced the response
    pub service: Service,
    /// Model echoed by the provider (or the requested model)
    pub model: String,
    /// Aggregated text content
    pub content: String,
    /// Aggregated reasoning trace, when exposed by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Tool calls issued by the model, in emission order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Payload flags derived from the fields above
    pub capabilities: Capabilities,
    /// Token accounting
    pub usage: Usage,
    /// Input conversation plus the new assistant turn
    pub messages: Vec<Message>,
}

impl ChatResponse {
    /// Assemble a response from decoded parts, deriving the capability flags
    /// and appending the assistant turn to the conversation
    pub(crate) fn assemble(
        service: Service,
        model: String,
        content: String,
        reasoning: Option<String>,
        tool_calls: Vec<ToolCall>,
        usage: Usage,
        input_messages: &[Message],
    ) -> Self {
        let reasoning = reasoning.filter(|r| !r.trim().is_empty());
        let tool_calls = if tool_calls.is_empty() { None } else { Some(tool_calls) };

        let capabilities = Capabilities {
            has_text: !content.trim().is_empty(),
            has_reasoning: reasoning.is_some(),
            has_tool_calls: tool_calls.is_some(),
        };

        let mut messages = input_messages.to_vec();
        messages.push(Message {
            role: Role::Assistant,
            content: Content::Text(content.clone()),
            tool_call_id: None,
            name: None,
            tool_calls: tool_calls.clone(),
            reasoning: reasoning.clone(),
        });

        Self {
            service,
            model,
            content,
            reasoning,
            tool_calls,
            capabilities,
            usage,
            messages,
        }
    }

    /// Whether the response carries non-empty text content
    pub const fn has_text_content(&self) -> bool {
        self.capabilities.has_text
    }

    /// Whether the response carries a reasoning trace
    pub const fn has_reasoning(&self) -> bool {
        self.capabilities.has_reasoning
    }

    /// Whether the response carries tool calls
    pub const fn has_tool_calls(&self) -> bool {
        self.capabilities.has_tool_calls
    }

    /// Text-only response
    pub const fn is_text_response(&self) -> bool {
        self.capabilities.has_text && !self.capabilities.has_reasoning && !self.capabilities.has_tool_calls
    }

    /// Response whose primary payload is tool calls
    pub const fn is_tool_call_response(&self) -> bool {
        self.capabilities.has_tool_calls
    }

    /// Response carrying a reasoning trace
    pub const fn is_reasoning_response(&self) -> bool {
        self.capabilities.has_reasoning
    }

    /// Response carrying more than one payload kind
    pub const fn is_complex_response(&self) -> bool {
        let count = self.capabilities.has_text as u8
            + self.capabilities.has_reasoning as u8
            + self.capabilities.has_tool_calls as u8;
        count > 1
    }

    /// Coarse classification of the response payload
    pub const fn response_kind(&self) -> ResponseKind {
        let Capabilities {
            has_text,
            has_reasoning,
            has_tool_calls,
        } = self.capabilities;
        match (has_text, has_reasoning, has_tool_calls) {
            (false, false, false) => ResponseKind::Empty,
            (true, false, false) => ResponseKind::Text,
            (false, false, true) => ResponseKind::ToolCalls,
            (false, true, false) => ResponseKind::Reasoning,
            _ => ResponseKind::Mixed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_call() -> ToolCall {
        ToolCall {
            id: "call_1".to_owned(),
            name: "get_weather".to_owned(),
            input: serde_json::json!({"location": "SF"}),
        }
    }

    #[test]
    fn capabilities_track_populated_fields() {
        let resp = ChatResponse::assemble(
            Service::OpenAi,
            "gpt-4o".to_owned(),
            "hello".to_owned(),
            None,
            vec![],
            Usage::default(),
            &[Message::user("hi")],
        );
        assert!(resp.has_text_content());
        assert!(!resp.has_reasoning());
        assert!(!resp.has_tool_calls());
        assert!(resp.is_text_response());
        assert_eq!(resp.response_kind(), ResponseKind::Text);
    }

    #[test]
    fn whitespace_only_content_does_not_count_as_text() {
        let resp = ChatResponse::assemble(
            Service::OpenAi,
            "gpt-4o".to_owned(),
            "  \n".to_owned(),
            Some(String::new()),
            vec![],
            Usage::default(),
            &[],
        );
        assert!(!resp.has_text_content());
        assert!(!resp.has_reasoning());
        assert_eq!(resp.response_kind(), ResponseKind::Empty);
    }

    #[test]
    fn appends_one_assistant_turn_mirroring_the_decode() {
        let input = vec![Message::user("weather?")];
        let resp = ChatResponse::assemble(
            Service::Anthropic,
            "claude".to_owned(),
            "checking".to_owned(),
            Some("think".to_owned()),
            vec![sample_call()],
            Usage::from_counts(1, 2),
            &input,
        );
        assert_eq!(resp.messages.len(), 2);
        let turn = resp.messages.last().unwrap();
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.content.as_text(), "checking");
        assert_eq!(turn.reasoning.as_deref(), Some("think"));
        assert_eq!(turn.tool_calls.as_ref().unwrap().len(), 1);
        assert!(resp.is_complex_response());
        assert_eq!(resp.response_kind(), ResponseKind::Mixed);
    }
}
