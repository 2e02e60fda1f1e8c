//! Conversion between the unified model and the Google Generative Language
//! API
//!
//! Google does not issue tool-call ids, so the decoder synthesizes
//! `google_{name}_{timestamp}_{counter}` ids; the encoder can recover the
//! function name from such an id when a tool result arrives without one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::protocol::google::{
    GoogleCandidate, GoogleContent, GoogleFileData, GoogleFunctionCall, GoogleFunctionDeclaration,
    GoogleFunctionResponse, GoogleGenerationConfig, GoogleInlineData, GooglePart, GoogleRequest, GoogleResponse,
    GoogleTool, GoogleUsageMetadata,
};
use crate::provider::ProviderRequest;
use crate::types::{ChatResponse, Content, ContentPart, Message, Role, Service, StreamChunk, ToolCall, Usage};

use super::StreamDecoder;

/// Counter feeding the synthesized tool-call id suffix
static CALL_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Synthesize a stable id for a model-issued function call
fn synthesize_call_id(name: &str) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let counter = CALL_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("google_{name}_{timestamp}_{counter}")
}

/// Recover the function name from a synthesized `google_{name}_{ts}_{n}` id
fn decode_call_id(id: &str) -> Option<&str> {
    let rest = id.strip_prefix("google_")?;
    // Function names may themselves contain underscores; strip the two
    // trailing numeric segments instead of splitting from the front
    let (rest, counter) = rest.rsplit_once('_')?;
    let (name, timestamp) = rest.rsplit_once('_')?;
    if counter.bytes().all(|b| b.is_ascii_digit())
        && timestamp.bytes().all(|b| b.is_ascii_digit())
        && !name.is_empty()
    {
        Some(name)
    } else {
        None
    }
}

// -- Request encoding --

/// Encode a merged request into the `generateContent` shape
pub(crate) fn encode_request(req: &ProviderRequest) -> GoogleRequest {
    let mut system_parts: Vec<String> = Vec::new();
    let mut contents = Vec::new();

    for (position, msg) in req.messages.iter().enumerate() {
        match msg.role {
            Role::System => system_parts.push(msg.content.as_text()),
            Role::ToolResult => contents.push(encode_tool_result(msg, &req.messages[..position])),
            Role::User => contents.push(encode_message(msg, "user")),
            Role::Assistant | Role::ToolCall => contents.push(encode_message(msg, "model")),
        }
    }

    let generation_config = {
        let mut config = GoogleGenerationConfig {
            temperature: req.temperature,
            max_output_tokens: req.max_tokens,
            thinking_budget: None,
            include_thoughts: None,
        };
        if req.model.contains("gemini-2.5") {
            config.thinking_budget = req.thinking_budget;
            config.include_thoughts = req.include_thoughts;
        }
        config
    };

    let tools = req.tools.as_ref().map(|tools| {
        vec![GoogleTool {
            function_declarations: tools
                .iter()
                .map(|t| GoogleFunctionDeclaration {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: (!t.parameters.is_null()).then(|| sanitize_schema(&t.parameters)),
                })
                .collect(),
        }]
    });

    GoogleRequest {
        contents,
        system_instruction: (!system_parts.is_empty()).then(|| GoogleContent {
            role: None,
            parts: vec![GooglePart::Text(system_parts.join("\n"))],
        }),
        generation_config: Some(generation_config),
        tools,
    }
}

/// Lower a tool result to a `functionResponse` part, resolving the function
/// name from the message, the preceding assistant turns, or a synthesized id
fn encode_tool_result(msg: &Message, preceding: &[Message]) -> GoogleContent {
    let name = msg
        .name
        .clone()
        .or_else(|| {
            let id = msg.tool_call_id.as_deref()?;
            preceding
                .iter()
                .rev()
                .filter_map(|m| m.tool_calls.as_ref())
                .flatten()
                .find(|call| call.id == id)
                .map(|call| call.name.clone())
                .or_else(|| decode_call_id(id).map(ToOwned::to_owned))
        })
        .unwrap_or_else(|| {
            let id = msg.tool_call_id.clone().unwrap_or_default();
            tracing::debug!(tool_call_id = %id, "tool result name unresolved, using the raw id");
            id
        });

    let text = msg.content.as_text();
    let response = serde_json::from_str(&text).unwrap_or_else(|_| serde_json::json!({ "result": text }));

    GoogleContent {
        role: Some("user".to_owned()),
        parts: vec![GooglePart::FunctionResponse(GoogleFunctionResponse { name, response })],
    }
}

/// Lower one user/model message to a content object
fn encode_message(msg: &Message, role: &str) -> GoogleContent {
    let mut parts = Vec::new();

    match &msg.content {
        Content::Text(text) => {
            if !text.is_empty() {
                parts.push(GooglePart::Text(text.clone()));
            }
        }
        Content::Parts(content_parts) => {
            for part in content_parts {
                parts.push(encode_part(part));
            }
        }
    }

    if let Some(tool_calls) = &msg.tool_calls {
        for tc in tool_calls {
            parts.push(GooglePart::FunctionCall(GoogleFunctionCall {
                name: tc.name.clone(),
                args: tc.input.clone(),
            }));
        }
    }

    if parts.is_empty() {
        parts.push(GooglePart::Text(String::new()));
    }

    GoogleContent {
        role: Some(role.to_owned()),
        parts,
    }
}

/// Lower one content part: data URLs inline, everything else by URI
fn encode_part(part: &ContentPart) -> GooglePart {
    match part {
        ContentPart::Text { text } => GooglePart::Text(text.clone()),
        ContentPart::Image { url, .. }
        | ContentPart::Audio { url }
        | ContentPart::Video { url }
        | ContentPart::File { url } => {
            if let Some(rest) = url.strip_prefix("data:")
                && let Some((mime_and_encoding, data)) = rest.split_once(',')
            {
                let mime_type = mime_and_encoding.strip_suffix(";base64").unwrap_or(mime_and_encoding);
                GooglePart::InlineData(GoogleInlineData {
                    mime_type: mime_type.to_owned(),
                    data: data.to_owned(),
                })
            } else {
                GooglePart::FileData(GoogleFileData { file_uri: url.clone() })
            }
        }
    }
}

/// Strip schema keywords Google's dialect rejects, recursively
pub(crate) fn sanitize_schema(schema: &serde_json::Value) -> serde_json::Value {
    match schema {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .filter(|(key, _)| key.as_str() != "additionalProperties" && key.as_str() != "$schema")
                .map(|(key, value)| (key.clone(), sanitize_schema(value)))
                .collect(),
        ),
        serde_json::Value::Array(items) => serde_json::Value::Array(items.iter().map(sanitize_schema).collect()),
        other => other.clone(),
    }
}

// -- Decoding --

fn decode_usage(metadata: &GoogleUsageMetadata) -> Usage {
    Usage {
        input_tokens: metadata.prompt_token_count,
        output_tokens: metadata.candidates_token_count,
        total_tokens: metadata.total_token_count,
        reasoning_tokens: metadata.thoughts_token_count,
        cost: None,
    }
}

/// Fold one candidate's parts into the aggregation buffers, returning the
/// tool calls decoded from it
fn decode_candidate(
    candidate: &GoogleCandidate,
    content: &mut String,
    reasoning: &mut String,
) -> Vec<ToolCall> {
    let mut tool_calls = Vec::new();

    if let Some(candidate_content) = &candidate.content {
        for part in &candidate_content.parts {
            match part {
                GooglePart::Text(text) => content.push_str(text),
                GooglePart::Thinking(text) => reasoning.push_str(text),
                GooglePart::FunctionCall(fc) => tool_calls.push(ToolCall {
                    id: synthesize_call_id(&fc.name),
                    name: fc.name.clone(),
                    input: fc.args.clone(),
                }),
                GooglePart::InlineData(_) | GooglePart::FileData(_) | GooglePart::FunctionResponse(_) => {}
            }
        }
    }

    if let Some(summaries) = &candidate.thought_summaries {
        for summary in summaries {
            reasoning.push_str(&summary.content);
        }
    }

    tool_calls
}

/// Decode a unary `generateContent` response
pub(crate) fn decode_response(wire: &GoogleResponse, req: &ProviderRequest) -> ChatResponse {
    let mut content = String::new();
    let mut reasoning = String::new();
    let mut tool_calls = Vec::new();

    if let Some(candidate) = wire.candidates.first() {
        tool_calls = decode_candidate(candidate, &mut content, &mut reasoning);
    }

    let usage = wire.usage_metadata.as_ref().map(decode_usage).unwrap_or_default();

    ChatResponse::assemble(
        req.service,
        req.model.clone(),
        content,
        (!reasoning.is_empty()).then_some(reasoning),
        tool_calls,
        usage,
        &req.messages,
    )
}

// -- Streaming decoding --

/// Streaming state machine for Google SSE chunks
///
/// Each SSE payload is a complete `generateContent`-shaped object; parts are
/// forwarded chunk-by-chunk and `finishReason` terminates the stream.
pub(crate) struct GoogleStreamDecoder {
    service: Service,
    model: String,
    input_messages: Vec<Message>,
    content: String,
    reasoning: String,
    tool_calls: Vec<ToolCall>,
    usage: Option<Usage>,
    complete_emitted: bool,
}

impl GoogleStreamDecoder {
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

impl StreamDecoder for GoogleStreamDecoder {
    fn on_payload(&mut self, payload: &str) -> Vec<StreamChunk> {
        let chunk: GoogleResponse = match serde_json::from_str(payload) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::debug!(service = %self.service, error = %e, "skipping malformed stream chunk");
                return Vec::new();
            }
        };

        let mut out = Vec::new();
        let mut finished = false;

        if let Some(metadata) = &chunk.usage_metadata {
            self.usage = Some(decode_usage(metadata));
        }

        if let Some(candidate) = chunk.candidates.first() {
            let before_content = self.content.len();
            let before_reasoning = self.reasoning.len();
            let calls = decode_candidate(candidate, &mut self.content, &mut self.reasoning);

            if self.content.len() > before_content {
                out.push(StreamChunk::Content(self.content[before_content..].to_owned()));
            }
            if self.reasoning.len() > before_reasoning {
                out.push(StreamChunk::Reasoning(self.reasoning[before_reasoning..].to_owned()));
            }
            for call in calls {
                self.tool_calls.push(call.clone());
                out.push(StreamChunk::ToolCall(call));
            }

            finished = candidate.finish_reason.is_some();
        }

        if finished && !self.complete_emitted {
            if let Some(usage) = self.usage.clone() {
                out.push(StreamChunk::Usage(usage));
            }
            out.push(self.complete());
        }

        out
    }

    fn on_end(&mut self) -> Vec<StreamChunk> {
        if self.complete_emitted {
            return Vec::new();
        }
        let mut out = Vec::new();
        if let Some(usage) = self.usage.clone() {
            out.push(StreamChunk::Usage(usage));
        }
        out.push(self.complete());
        out
    }
}
