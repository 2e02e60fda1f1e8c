//! Conversion between the unified model and the Anthropic Messages API

use crate::protocol::anthropic::{
    AnthropicContent, AnthropicContentBlock, AnthropicImageSource, AnthropicMessage, AnthropicRequest,
    AnthropicResponse, AnthropicResponseBlock, AnthropicStreamContentBlock, AnthropicStreamDelta,
    AnthropicStreamEvent, AnthropicThinking, AnthropicTool, AnthropicUsage,
};
use crate::provider::ProviderRequest;
use crate::types::{ChatResponse, Content, ContentPart, Message, Role, Service, StreamChunk, ToolCall, Usage};

use super::StreamDecoder;

/// Anthropic requires `max_tokens`; applied when the caller sets none
const DEFAULT_MAX_TOKENS: u32 = 4096;

// -- Request encoding --

/// Encode a merged request into the Messages API shape
///
/// System messages anywhere in the conversation are lifted into the
/// top-level `system` field, newline-joined in order.
pub(crate) fn encode_request(req: &ProviderRequest, stream: bool) -> AnthropicRequest {
    let mut system_parts: Vec<String> = Vec::new();
    let mut messages = Vec::new();

    for msg in &req.messages {
        match msg.role {
            Role::System => system_parts.push(msg.content.as_text()),
            _ => messages.push(encode_message(msg)),
        }
    }

    let tools = req.tools.as_ref().map(|tools| {
        tools
            .iter()
            .map(|t| AnthropicTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: if t.parameters.is_null() {
                    serde_json::json!({"type": "object"})
                } else {
                    t.parameters.clone()
                },
            })
            .collect()
    });

    AnthropicRequest {
        model: req.model.clone(),
        max_tokens: req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        system: (!system_parts.is_empty()).then(|| system_parts.join("\n")),
        messages,
        temperature: req.temperature,
        stream: stream.then_some(true),
        tools,
        thinking: req.thinking_budget.map(|budget| AnthropicThinking {
            thinking_type: "enabled".to_owned(),
            budget_tokens: budget,
        }),
    }
}

/// Lower one non-system message to the wire shape
fn encode_message(msg: &Message) -> AnthropicMessage {
    // Tool results are user turns carrying a tool_result block
    if msg.role == Role::ToolResult {
        return AnthropicMessage {
            role: "user".to_owned(),
            content: AnthropicContent::Blocks(vec![AnthropicContentBlock::ToolResult {
                tool_use_id: msg.tool_call_id.clone().unwrap_or_default(),
                content: Some(msg.content.as_text()),
            }]),
        };
    }

    let role = match msg.role {
        Role::Assistant | Role::ToolCall => "assistant",
        _ => "user",
    };

    // Assistant turns with tool calls become text + tool_use blocks
    if let Some(tool_calls) = msg.tool_calls.as_ref().filter(|calls| !calls.is_empty()) {
        let mut blocks = Vec::new();
        let text = msg.content.as_text();
        if !text.is_empty() {
            blocks.push(AnthropicContentBlock::Text { text });
        }
        for tc in tool_calls {
            blocks.push(AnthropicContentBlock::ToolUse {
                id: tc.id.clone(),
                name: tc.name.clone(),
                input: tc.input.clone(),
            });
        }
        return AnthropicMessage {
            role: role.to_owned(),
            content: AnthropicContent::Blocks(blocks),
        };
    }

    let content = match &msg.content {
        Content::Text(text) => AnthropicContent::Text(text.clone()),
        Content::Parts(parts) => AnthropicContent::Blocks(parts.iter().map(encode_part).collect()),
    };

    AnthropicMessage {
        role: role.to_owned(),
        content,
    }
}

/// Lower one content part; media without an Anthropic block kind falls back
/// to its URL as text
fn encode_part(part: &ContentPart) -> AnthropicContentBlock {
    match part {
        ContentPart::Text { text } => AnthropicContentBlock::Text { text: text.clone() },
        ContentPart::Image { url, .. } => {
            if let Some(rest) = url.strip_prefix("data:")
                && let Some((mime_and_encoding, data)) = rest.split_once(',')
            {
                let media_type = mime_and_encoding.strip_suffix(";base64").unwrap_or(mime_and_encoding);
                AnthropicContentBlock::Image {
                    source: AnthropicImageSource {
                        source_type: "base64".to_owned(),
                        media_type: Some(media_type.to_owned()),
                        data: data.to_owned(),
                    },
                }
            } else {
                AnthropicContentBlock::Image {
                    source: AnthropicImageSource {
                        source_type: "url".to_owned(),
                        media_type: None,
                        data: url.clone(),
                    },
                }
            }
        }
        ContentPart::Audio { url } | ContentPart::Video { url } | ContentPart::File { url } => {
            AnthropicContentBlock::Text { text: url.clone() }
        }
    }
}

// -- Unary decoding --

/// Decode a unary Messages API response
pub(crate) fn decode_response(wire: AnthropicResponse, req: &ProviderRequest) -> ChatResponse {
    let mut content = String::new();
    let mut reasoning = String::new();
    let mut tool_calls = Vec::new();

    for block in wire.content {
        match block {
            AnthropicResponseBlock::Text { text } => content.push_str(&text),
            AnthropicResponseBlock::Thinking { thinking, .. } => reasoning.push_str(&thinking),
            AnthropicResponseBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall { id, name, input }),
        }
    }

    let model = wire.model.filter(|m| !m.is_empty()).unwrap_or_else(|| req.model.clone());
    let usage = wire
        .usage
        .map(|u| Usage::from_counts(u.input_tokens, u.output_tokens))
        .unwrap_or_default();

    ChatResponse::assemble(
        req.service,
        model,
        content,
        (!reasoning.is_empty()).then_some(reasoning),
        tool_calls,
        usage,
        &req.messages,
    )
}

// -- Streaming decoding --

/// Streaming state machine for Anthropic SSE events
///
/// Tool input arrives complete in the `content_block_start` event, so tool
/// calls are emitted immediately with no accumulation. `message_stop`
/// finalizes; a stream that ends without one still completes with whatever
/// was observed.
pub(crate) struct AnthropicStreamDecoder {
    service: Service,
    model: String,
    input_messages: Vec<Message>,
    content: String,
    reasoning: String,
    tool_calls: Vec<ToolCall>,
    usage: Option<Usage>,
    complete_emitted: bool,
}

impl AnthropicStreamDecoder {
    pub(crate) fn new(req: &ProviderRequest) -> Self {
        Self {
            service: req.service,
            model: req.model.clone(),
            input_messages: req.messages.clone(),
            content: String::new(),
            reasoning: String::new(),
            tool_calls: Vec::new(),
            usage: None,
            complete_emitted: false,
        }
    }

    fn decode_usage(&self, usage: &AnthropicUsage) -> Usage {
        Usage::from_counts(usage.input_tokens, usage.output_tokens)
    }

    fn complete(&mut self) -> StreamChunk {
        self.complete_emitted = true;
        let response = ChatResponse::assemble(
            self.service,
            self.model.clone(),
            std::mem::take(&mut self.content),
            (!self.reasoning.is_empty()).then(|| std::mem::take(&mut self.reasoning)),
            std::mem::take(&mut self.tool_calls),
            self.usage.clone().unwrap_or_default(),
            &self.input_messages,
        );
        StreamChunk::Complete(Box::new(response))
    }
}

impl StreamDecoder for AnthropicStreamDecoder {
    fn on_payload(&mut self, payload: &str) -> Vec<StreamChunk> {
        let event: AnthropicStreamEvent = match serde_json::from_str(payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(service = %self.service, error = %e, "skipping malformed stream event");
                return Vec::new();
            }
        };

        match event {
            AnthropicStreamEvent::MessageStart { message } => {
                if let Some(model) = message.model.filter(|m| !m.is_empty()) {
                    self.model = model;
                }
                if let Some(usage) = &message.usage {
                    self.usage = Some(self.decode_usage(usage));
                }
                Vec::new()
            }

            AnthropicStreamEvent::ContentBlockStart { content_block, .. } => match content_block {
                AnthropicStreamContentBlock::ToolUse { id, name, input } => {
                    let call = ToolCall { id, name, input };
                    self.tool_calls.push(call.clone());
                    vec![StreamChunk::ToolCall(call)]
                }
                AnthropicStreamContentBlock::Text { .. } | AnthropicStreamContentBlock::Thinking { .. } => Vec::new(),
            },

            AnthropicStreamEvent::ContentBlockDelta { delta, .. } => match delta {
                AnthropicStreamDelta::TextDelta { text } => {
                    self.content.push_str(&text);
                    vec![StreamChunk::Content(text)]
                }
                AnthropicStreamDelta::ThinkingDelta { thinking } => {
                    self.reasoning.push_str(&thinking);
                    vec![StreamChunk::Reasoning(thinking)]
                }
                AnthropicStreamDelta::InputJsonDelta { .. } | AnthropicStreamDelta::SignatureDelta { .. } => {
                    Vec::new()
                }
            },

            AnthropicStreamEvent::MessageDelta { usage, .. } => match usage {
                Some(usage) => {
                    // message_delta usually carries only output_tokens; the
                    // input count arrived in message_start
                    let input = if usage.input_tokens > 0 {
                        usage.input_tokens
                    } else {
                        self.usage.as_ref().map_or(0, |u| u.input_tokens)
                    };
                    let merged = Usage::from_counts(input, usage.output_tokens);
                    self.usage = Some(merged.clone());
                    vec![StreamChunk::Usage(merged)]
                }
                None => Vec::new(),
            },

            AnthropicStreamEvent::MessageStop => {
                if self.complete_emitted {
                    Vec::new()
                } else {
                    vec![self.complete()]
                }
            }

            AnthropicStreamEvent::ContentBlockStop { .. } | AnthropicStreamEvent::Ping => Vec::new(),
        }
    }

    fn on_end(&mut self) -> Vec<StreamChunk> {
        if self.complete_emitted {
            Vec::new()
        } else {
            vec![self.complete()]
        }
    }
}
