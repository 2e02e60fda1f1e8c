//! Conversion between the unified model and the Ollama chat API
//!
//! Ollama flattens all content to text and takes no tools; a config that
//! carries a tools list is accepted and the list is ignored.

use crate::protocol::ollama::{OllamaMessage, OllamaOptions, OllamaRequest, OllamaResponse};
use crate::provider::ProviderRequest;
use crate::types::{ChatResponse, Message, Role, Service, StreamChunk, Usage};

use super::StreamDecoder;

// -- Request encoding --

/// Encode a merged request into the Ollama chat shape
pub(crate) fn encode_request(req: &ProviderRequest, stream: bool) -> OllamaRequest {
    if req.tools.as_ref().is_some_and(|t| !t.is_empty()) {
        tracing::debug!("ollama adapter ignores the configured tools list");
    }

    let options = (req.temperature.is_some() || req.max_tokens.is_some()).then(|| OllamaOptions {
        temperature: req.temperature,
        num_predict: req.max_tokens,
    });

    OllamaRequest {
        model: req.model.clone(),
        messages: req.messages.iter().map(encode_message).collect(),
        stream,
        options,
    }
}

/// Lower one message, flattening structured content to text
fn encode_message(msg: &Message) -> OllamaMessage {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant | Role::ToolCall => "assistant",
        Role::ToolResult => "tool",
    };
    OllamaMessage {
        role: role.to_owned(),
        content: msg.content.as_text(),
    }
}

// -- Decoding --

fn decode_usage(wire: &OllamaResponse) -> Usage {
    Usage::from_counts(wire.prompt_eval_count.unwrap_or(0), wire.eval_count.unwrap_or(0))
}

/// Decode a unary chat response
pub(crate) fn decode_response(wire: &OllamaResponse, req: &ProviderRequest) -> ChatResponse {
    let content = wire.message.as_ref().map(|m| m.content.clone()).unwrap_or_default();
    let model = wire
        .model
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| req.model.clone());

    ChatResponse::assemble(
        req.service,
        model,
        content,
        None,
        Vec::new(),
        decode_usage(wire),
        &req.messages,
    )
}

// -- Streaming decoding --

/// Streaming state machine for NDJSON lines
///
/// Each line is a complete response object; a line with `done: true` yields
/// the usage and the terminal chunk.
pub(crate) struct OllamaStreamDecoder {
    service: Service,
    model: String,
    input_messages: Vec<Message>,
    content: String,
    usage: Option<Usage>,
    complete_emitted: bool,
}

impl OllamaStreamDecoder {
    pub(crate) fn new(req: &ProviderRequest) -> Self {
        Self {
            service: req.service,
            model: req.model.clone(),
            input_messages: req.messages.clone(),
            content: String::new(),
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
            None,
            Vec::new(),
            self.usage.clone().unwrap_or_default(),
            &self.input_messages,
        );
        StreamChunk::Complete(Box::new(response))
    }
}

impl StreamDecoder for OllamaStreamDecoder {
    fn on_payload(&mut self, payload: &str) -> Vec<StreamChunk> {
        let line: OllamaResponse = match serde_json::from_str(payload) {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!(service = %self.service, error = %e, "skipping malformed stream line");
                return Vec::new();
            }
        };

        let mut out = Vec::new();

        if let Some(model) = line.model.clone().filter(|m| !m.is_empty()) {
            self.model = model;
        }

        if let Some(message) = &line.message
            && !message.content.is_empty()
        {
            self.content.push_str(&message.content);
            out.push(StreamChunk::Content(message.content.clone()));
        }

        if line.done && !self.complete_emitted {
            let usage = decode_usage(&line);
            self.usage = Some(usage.clone());
            out.push(StreamChunk::Usage(usage));
            out.push(self.complete());
        }

        out
    }

    fn on_end(&mut self) -> Vec<StreamChunk> {
        if self.complete_emitted {
            Vec::new()
        } else {
            vec![self.complete()]
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::Tool;

    fn request(messages: Vec<Message>) -> ProviderRequest {
        ProviderRequest {
            service: Service::Ollama,
            model: "llama3.2".to_owned(),
            messages,
            api_key: None,
            base_url: None,
            headers: Vec::new(),
            temperature: None,
            max_tokens: None,
            tools: None,
            browser: false,
            reasoning_effort: None,
            reasoning_format: None,
            thinking_budget: None,
            include_thoughts: None,
        }
    }

    #[test]
    fn flattens_messages_and_maps_generation_options() {
        let mut req = request(vec![Message::system("hi"), Message::user("there")]);
        req.temperature = Some(0.7);
        req.max_tokens = Some(128);
        let wire = encode_request(&req, false);
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(wire.messages[1].role, "user");
        let options = wire.options.unwrap();
        assert_eq!(options.temperature, Some(0.7));
        assert_eq!(options.num_predict, Some(128));
        assert!(!wire.stream);
    }

    #[test]
    fn a_tools_list_is_accepted_and_ignored() {
        let mut req = request(vec![Message::user("hi")]);
        req.tools = Some(vec![Tool::new("f", "d", json!({"type": "object"}))]);
        // The wire shape has no tools field at all; encoding must not fail
        let wire = encode_request(&req, false);
        assert_eq!(wire.messages.len(), 1);
    }

    #[test]
    fn decodes_a_unary_response_with_eval_counts() {
        let req = request(vec![Message::user("hi")]);
        let wire: OllamaResponse = serde_json::from_str(
            r#"{"model":"llama3.2","message":{"role":"assistant","content":"Hello."},"done":true,"prompt_eval_count":4,"eval_count":3}"#,
        )
        .unwrap();
        let resp = decode_response(&wire, &req);
        assert_eq!(resp.content, "Hello.");
        assert_eq!(resp.usage, Usage::from_counts(4, 3));
        assert_eq!(resp.messages.len(), 2);
    }

    #[test]
    fn stream_yields_usage_and_complete_on_the_done_line() {
        let req = request(vec![Message::user("hi")]);
        let mut decoder = OllamaStreamDecoder::new(&req);
        let mut chunks: Vec<StreamChunk> = [
            r#"{"model":"llama3.2","message":{"role":"assistant","content":"Hel"},"done":false}"#,
            r#"{"model":"llama3.2","message":{"role":"assistant","content":"lo."},"done":false}"#,
            r#"{"model":"llama3.2","message":{"role":"assistant","content":""},"done":true,"prompt_eval_count":4,"eval_count":2}"#,
        ]
        .iter()
        .flat_map(|p| decoder.on_payload(p))
        .collect();
        chunks.extend(decoder.on_end());

        assert_eq!(chunks.len(), 4);
        assert!(matches!(&chunks[0], StreamChunk::Content(t) if t == "Hel"));
        assert!(matches!(&chunks[2], StreamChunk::Usage(u) if u.total_tokens == 6));
        let StreamChunk::Complete(resp) = &chunks[3] else { panic!() };
        assert_eq!(resp.content, "Hello.");
    }
}
