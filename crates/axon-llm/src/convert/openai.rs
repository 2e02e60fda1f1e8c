//! Conversion between the unified model and the OpenAI chat-completions
//! wire format, shared by OpenAI, Groq, DeepSeek, and xAI

use crate::accumulate::ToolCallAccumulator;
use crate::protocol::openai::{
    OpenAiContent, OpenAiContentPart, OpenAiFunction, OpenAiFunctionCall, OpenAiImageUrl, OpenAiMessage,
    OpenAiRequest, OpenAiResponse, OpenAiStreamChunk, OpenAiStreamOptions, OpenAiTool, OpenAiToolCall, OpenAiUsage,
};
use crate::provider::ProviderRequest;
use crate::types::{
    ChatResponse, Content, ContentPart, Message, ReasoningEffort, Role, Service, StreamChunk, Tool, ToolCall, Usage,
};

use super::StreamDecoder;

/// Default temperature applied when Groq reasoning runs at `default` effort
const GROQ_DEFAULT_REASONING_TEMPERATURE: f64 = 0.6;

// -- Request encoding --

/// Encode a merged request into the family wire format
pub(crate) fn encode_request(req: &ProviderRequest, stream: bool) -> OpenAiRequest {
    let mut wire = OpenAiRequest {
        model: req.model.clone(),
        messages: req.messages.iter().map(encode_message).collect(),
        temperature: req.temperature,
        max_tokens: req.max_tokens,
        stream: stream.then_some(true),
        // Usage arrives as a trailing stream chunk only when asked for;
        // compatible third-party APIs reject the unsupported parameter
        stream_options: (stream && req.service == Service::OpenAi)
            .then_some(OpenAiStreamOptions { include_usage: true }),
        tools: req.tools.as_deref().map(sanitize_tools),
        reasoning_effort: None,
        reasoning_format: None,
    };

    apply_reasoning_params(req, &mut wire);
    wire
}

/// Per-family reasoning parameters, keyed off the model id
fn apply_reasoning_params(req: &ProviderRequest, wire: &mut OpenAiRequest) {
    match req.service {
        Service::OpenAi => {
            if (req.model.starts_with("o1") || req.model.starts_with("o3"))
                && let Some(effort) = req.reasoning_effort
                && matches!(effort, ReasoningEffort::Low | ReasoningEffort::Medium | ReasoningEffort::High)
            {
                wire.reasoning_effort = Some(effort.as_str().to_owned());
            }
        }
        Service::Groq => {
            if req.model.contains("qwen") || req.model.contains("deepseek") {
                wire.reasoning_format = req.reasoning_format.map(|f| f.as_str().to_owned());
                if let Some(effort) = req.reasoning_effort {
                    wire.reasoning_effort = Some(effort.as_str().to_owned());
                    if effort == ReasoningEffort::Default && wire.temperature.is_none() {
                        wire.temperature = Some(GROQ_DEFAULT_REASONING_TEMPERATURE);
                    }
                }
            }
        }
        Service::XAi => {
            // Grok 3 takes an effort knob; Grok 4 reasons unconditionally
            if req.model.contains("grok-3")
                && let Some(effort) = req.reasoning_effort
                && matches!(effort, ReasoningEffort::Low | ReasoningEffort::Medium | ReasoningEffort::High)
            {
                wire.reasoning_effort = Some(effort.as_str().to_owned());
            }
        }
        _ => {}
    }
}

/// Lower one unified message to the wire shape
fn encode_message(msg: &Message) -> OpenAiMessage {
    if msg.role == Role::ToolResult {
        return OpenAiMessage {
            role: "tool".to_owned(),
            content: Some(OpenAiContent::Text(msg.content.as_text())),
            tool_calls: None,
            tool_call_id: msg.tool_call_id.clone(),
        };
    }

    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        // tool_call turns are assistant turns on this wire
        Role::Assistant | Role::ToolCall => "assistant",
        Role::ToolResult => unreachable!("handled above"),
    };

    let tool_calls = msg.tool_calls.as_ref().map(|calls| {
        calls
            .iter()
            .map(|tc| OpenAiToolCall {
                id: tc.id.clone(),
                tool_type: "function".to_owned(),
                function: OpenAiFunctionCall {
                    name: tc.name.clone(),
                    arguments: serde_json::to_string(&tc.input).unwrap_or_else(|_| "{}".to_owned()),
                },
            })
            .collect::<Vec<_>>()
    });

    // Assistant turns that only carry tool calls send null content
    let content = match (&msg.content, &tool_calls) {
        (content, Some(_)) if content.as_text().is_empty() => None,
        (Content::Text(text), _) => Some(OpenAiContent::Text(text.clone())),
        (Content::Parts(parts), _) => Some(OpenAiContent::Parts(parts.iter().map(encode_part).collect())),
    };

    OpenAiMessage {
        role: role.to_owned(),
        content,
        tool_calls,
        tool_call_id: None,
    }
}

/// Lower one content part; media kinds the wire has no slot for fall back
/// to their URL as text
fn encode_part(part: &ContentPart) -> OpenAiContentPart {
    match part {
        ContentPart::Text { text } => OpenAiContentPart::Text { text: text.clone() },
        ContentPart::Image { url, detail } => OpenAiContentPart::ImageUrl {
            image_url: OpenAiImageUrl {
                url: url.clone(),
                detail: detail.clone(),
            },
        },
        ContentPart::Audio { url } | ContentPart::Video { url } | ContentPart::File { url } => {
            OpenAiContentPart::Text { text: url.clone() }
        }
    }
}

/// Lower tool declarations, defaulting a missing parameter schema to an
/// empty object schema
pub(crate) fn sanitize_tools(tools: &[Tool]) -> Vec<OpenAiTool> {
    tools
        .iter()
        .map(|tool| {
            let parameters = if tool.parameters.is_null() {
                serde_json::json!({"type": "object", "properties": {}})
            } else {
                tool.parameters.clone()
            };
            OpenAiTool {
                tool_type: "function".to_owned(),
                function: OpenAiFunction {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters,
                },
            }
        })
        .collect()
}

// -- Unary decoding --

/// Decode a unary wire response into the unified shape
pub(crate) fn decode_response(wire: OpenAiResponse, req: &ProviderRequest) -> ChatResponse {
    let mut content = String::new();
    let mut reasoning = None;
    let mut tool_calls = Vec::new();

    if let Some(choice) = wire.choices.into_iter().next() {
        if let Some(text) = choice.message.content {
            content = text;
        }
        reasoning = choice.message.reasoning_content.or(choice.message.reasoning);
        if let Some(calls) = choice.message.tool_calls {
            for call in calls {
                match decode_tool_call(call) {
                    Some(tc) => tool_calls.push(tc),
                    None => tracing::debug!(service = %req.service, "skipping tool call with unparsable arguments"),
                }
            }
        }
    }

    let model = wire.model.filter(|m| !m.is_empty()).unwrap_or_else(|| req.model.clone());
    let usage = wire.usage.map(decode_usage).unwrap_or_default();

    ChatResponse::assemble(req.service, model, content, reasoning, tool_calls, usage, &req.messages)
}

/// Parse one wire tool call; unparsable arguments drop the call
fn decode_tool_call(call: OpenAiToolCall) -> Option<ToolCall> {
    let input = serde_json::from_str(&call.function.arguments).ok()?;
    Some(ToolCall {
        id: call.id,
        name: call.function.name,
        input,
    })
}

fn decode_usage(usage: OpenAiUsage) -> Usage {
    let reasoning_tokens = usage
        .reasoning_tokens
        .or_else(|| usage.completion_tokens_details.and_then(|d| d.reasoning_tokens));
    Usage {
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
        reasoning_tokens,
        cost: None,
    }
}

// -- Streaming decoding --

/// Streaming state machine for the OpenAI family
///
/// `finish_reason` and the trailing usage chunk arrive in either order, so
/// the terminal `Complete` is emitted on the first of: both observed, or the
/// payload stream ending. Tool calls accumulate per
/// [`crate::accumulate::ToolCallAccumulator`] and are finalized at
/// `finish_reason` arrival (or stream end), each emitted exactly once before
/// the terminal chunk.
pub(crate) struct OpenAiStreamDecoder {
    service: Service,
    model: String,
    input_messages: Vec<Message>,
    content: String,
    reasoning: String,
    emitted_calls: Vec<ToolCall>,
    accumulator: ToolCallAccumulator,
    usage: Option<Usage>,
    saw_finish: bool,
    have_usage: bool,
    complete_emitted: bool,
}

impl OpenAiStreamDecoder {
    pub(crate) fn new(req: &ProviderRequest) -> Self {
        Self {
            service: req.service,
            model: req.model.clone(),
            input_messages: req.messages.clone(),
            content: String::new(),
            reasoning: String::new(),
            emitted_calls: Vec::new(),
            accumulator: ToolCallAccumulator::new(),
            usage: None,
            saw_finish: false,
            have_usage: false,
            complete_emitted: false,
        }
    }

    /// Finalize the accumulator, emitting each finished call once
    fn flush_tool_calls(&mut self) -> Vec<StreamChunk> {
        self.accumulator
            .finalize()
            .into_iter()
            .map(|call| {
                self.emitted_calls.push(call.clone());
                StreamChunk::ToolCall(call)
            })
            .collect()
    }

    /// Build the terminal chunk; usage is zeroed when the stream never
    /// delivered any
    fn complete(&mut self) -> StreamChunk {
        self.complete_emitted = true;
        let response = ChatResponse::assemble(
            self.service,
            self.model.clone(),
            std::mem::take(&mut self.content),
            (!self.reasoning.is_empty()).then(|| std::mem::take(&mut self.reasoning)),
            std::mem::take(&mut self.emitted_calls),
            self.usage.clone().unwrap_or_default(),
            &self.input_messages,
        );
        StreamChunk::Complete(Box::new(response))
    }
}

impl StreamDecoder for OpenAiStreamDecoder {
    fn on_payload(&mut self, payload: &str) -> Vec<StreamChunk> {
        let chunk: OpenAiStreamChunk = match serde_json::from_str(payload) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::debug!(service = %self.service, error = %e, "skipping malformed stream chunk");
                return Vec::new();
            }
        };

        let mut out = Vec::new();

        if let Some(model) = chunk.model.filter(|m| !m.is_empty()) {
            self.model = model;
        }

        if let Some(usage) = chunk.usage {
            let usage = decode_usage(usage);
            self.usage = Some(usage.clone());
            self.have_usage = true;
            out.push(StreamChunk::Usage(usage));
        }

        if let Some(choice) = chunk.choices.into_iter().next() {
            if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                self.content.push_str(&text);
                out.push(StreamChunk::Content(text));
            }
            if let Some(text) = choice
                .delta
                .reasoning_content
                .or(choice.delta.reasoning)
                .filter(|t| !t.is_empty())
            {
                self.reasoning.push_str(&text);
                out.push(StreamChunk::Reasoning(text));
            }
            if let Some(fragments) = choice.delta.tool_calls {
                for fragment in fragments {
                    self.accumulator.ingest(
                        fragment.index,
                        fragment.id.as_deref(),
                        fragment.function.as_ref().and_then(|f| f.name.as_deref()),
                        fragment.function.as_ref().and_then(|f| f.arguments.as_deref()),
                    );
                }
            }
            if choice.finish_reason.is_some() {
                self.saw_finish = true;
                out.extend(self.flush_tool_calls());
            }
        }

        if self.saw_finish && self.have_usage && !self.complete_emitted {
            out.push(self.complete());
        }

        out
    }

    fn on_end(&mut self) -> Vec<StreamChunk> {
        if self.complete_emitted {
            return Vec::new();
        }
        let mut out = self.flush_tool_calls();
        out.push(self.complete());
        out
    }
}
