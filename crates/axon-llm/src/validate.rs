//! Pure validation of unified requests
//!
//! Three checks run before any request is encoded: config well-formedness,
//! tool-result linkage for the chosen provider, and the OpenAI-family
//! conversation-flow protocol for multi-round tool use.

use std::collections::HashSet;

use crate::error::LlmError;
use crate::types::{Message, Role, Service};

/// Check the merged config for well-formedness
///
/// The type system already guarantees a recognized service and shaped
/// messages; what remains dynamic is a usable model string, a non-empty
/// conversation, and that every message carries a payload: content, tool
/// calls, or tool-result linkage.
pub fn validate_config(service: Service, model: &str, messages: &[Message]) -> Result<(), LlmError> {
    if model.trim().is_empty() {
        return Err(LlmError::Config(format!("{service}: model must not be empty")));
    }
    if messages.is_empty() {
        return Err(LlmError::Config(format!("{service}: messages must not be empty")));
    }
    for (position, message) in messages.iter().enumerate() {
        let has_tool_calls = message.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty());
        if message.role != Role::ToolResult && !has_tool_calls && message.content.as_text().is_empty() {
            // Empty string content is permitted, but only when something is
            // there at all; a unit Parts list with no text is a caller bug
            if matches!(&message.content, crate::types::Content::Parts(parts) if parts.is_empty()) {
                return Err(LlmError::Config(format!(
                    "{service}: message {position} has neither content nor tool calls"
                )));
            }
        }
    }
    Ok(())
}

/// Check every `tool_result` message for the linkage the provider requires
///
/// OpenAI-family and Anthropic correlate results by `tool_call_id`; Google
/// correlates by function name (which may be recovered from a synthesized
/// id); Ollama ignores tools entirely.
pub fn validate_tool_results(service: Service, messages: &[Message]) -> Result<(), LlmError> {
    for (position, message) in messages.iter().enumerate() {
        if message.role != Role::ToolResult {
            continue;
        }

        if message.content.as_text().is_empty() {
            return Err(LlmError::ToolResult(format!(
                "{service}: tool result at message {position} has no content"
            )));
        }

        match service {
            Service::OpenAi | Service::Groq | Service::DeepSeek | Service::XAi | Service::Anthropic => {
                if message.tool_call_id.as_deref().is_none_or(str::is_empty) {
                    return Err(LlmError::ToolResult(format!(
                        "{service}: tool result at message {position} requires a tool_call_id"
                    )));
                }
            }
            Service::Google => {
                let has_name = message.name.as_deref().is_some_and(|n| !n.is_empty());
                let has_id = message.tool_call_id.as_deref().is_some_and(|id| !id.is_empty());
                if !has_name && !has_id {
                    return Err(LlmError::ToolResult(format!(
                        "{service}: tool result at message {position} requires a function name or tool_call_id"
                    )));
                }
            }
            Service::Ollama => {}
        }
    }
    Ok(())
}

/// Walk an OpenAI-family conversation checking the tool-call protocol
///
/// Maintains the set of unresolved tool-call ids issued by the most recent
/// assistant turn. Tool results must resolve a pending id; an id-less result
/// is accepted only when exactly one call is pending. Assistant turns
/// without tool calls and system messages clear the pending set; user
/// messages leave it alone, since they may appear between calls and results.
pub fn validate_flow(service: Service, messages: &[Message]) -> Result<(), LlmError> {
    let mut pending: HashSet<String> = HashSet::new();

    for (position, message) in messages.iter().enumerate() {
        match message.role {
            Role::Assistant | Role::ToolCall => {
                match message.tool_calls.as_ref().filter(|calls| !calls.is_empty()) {
                    Some(calls) => {
                        pending = calls.iter().map(|call| call.id.clone()).collect();
                    }
                    None => pending.clear(),
                }
            }
            Role::ToolResult => {
                if pending.is_empty() {
                    return Err(LlmError::Flow {
                        position,
                        message: format!("{service}: tool result without a preceding assistant tool call"),
                    });
                }
                match message.tool_call_id.as_deref() {
                    Some(id) => {
                        if !pending.remove(id) {
                            return Err(LlmError::Flow {
                                position,
                                message: format!("{service}: tool result references unknown tool_call_id {id}"),
                            });
                        }
                    }
                    None => {
                        if pending.len() == 1 {
                            // Unambiguous: bind the result to the single
                            // outstanding call
                            pending.clear();
                        } else {
                            return Err(LlmError::Flow {
                                position,
                                message: format!(
                                    "{service}: tool result without tool_call_id while {} calls are pending",
                                    pending.len()
                                ),
                            });
                        }
                    }
                }
            }
            Role::User => {}
            Role::System => pending.clear(),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::{Content, ToolCall};

    fn assistant_with_calls(ids: &[&str]) -> Message {
        let calls = ids
            .iter()
            .map(|id| ToolCall {
                id: (*id).to_owned(),
                name: "get_weather".to_owned(),
                input: json!({}),
            })
            .collect();
        Message {
            tool_calls: Some(calls),
            ..Message::assistant("")
        }
    }

    #[test]
    fn config_requires_model_and_messages() {
        let err = validate_config(Service::OpenAi, "  ", &[Message::user("hi")]).unwrap_err();
        assert!(matches!(err, LlmError::Config(_)));

        let err = validate_config(Service::OpenAi, "gpt-4o", &[]).unwrap_err();
        assert!(matches!(err, LlmError::Config(_)));

        validate_config(Service::OpenAi, "gpt-4o", &[Message::user("hi")]).unwrap();
    }

    #[test]
    fn config_permits_empty_string_content() {
        validate_config(Service::OpenAi, "gpt-4o", &[Message::user("")]).unwrap();
    }

    #[test]
    fn config_rejects_partless_messages() {
        let message = Message {
            content: Content::Parts(vec![]),
            ..Message::user("")
        };
        let err = validate_config(Service::OpenAi, "gpt-4o", &[message]).unwrap_err();
        assert!(matches!(err, LlmError::Config(_)));
    }

    #[test]
    fn tool_results_need_an_id_for_openai_and_anthropic() {
        let orphan = Message {
            tool_call_id: None,
            ..Message::tool_result("", "72F")
        };
        for service in [Service::OpenAi, Service::Groq, Service::Anthropic] {
            let err = validate_tool_results(service, &[orphan.clone()]).unwrap_err();
            assert!(matches!(err, LlmError::ToolResult(_)), "{service}");
        }
        validate_tool_results(Service::OpenAi, &[Message::tool_result("call_1", "72F")]).unwrap();
    }

    #[test]
    fn google_accepts_name_or_id_linkage() {
        let by_name = Message {
            tool_call_id: None,
            name: Some("get_weather".to_owned()),
            ..Message::tool_result("", "72F")
        };
        validate_tool_results(Service::Google, &[by_name]).unwrap();

        let by_id = Message::tool_result("google_get_weather_1700000000_1", "72F");
        validate_tool_results(Service::Google, &[by_id]).unwrap();

        let neither = Message {
            tool_call_id: None,
            ..Message::tool_result("", "72F")
        };
        assert!(validate_tool_results(Service::Google, &[neither]).is_err());
    }

    #[test]
    fn ollama_skips_tool_result_linkage() {
        let orphan = Message {
            tool_call_id: None,
            ..Message::tool_result("", "72F")
        };
        validate_tool_results(Service::Ollama, &[orphan]).unwrap();
    }

    #[test]
    fn tool_results_require_content() {
        let empty = Message::tool_result("call_1", "");
        assert!(matches!(
            validate_tool_results(Service::OpenAi, &[empty]),
            Err(LlmError::ToolResult(_))
        ));
    }

    #[test]
    fn flow_accepts_the_multi_round_tool_pattern() {
        let messages = vec![
            Message::user("What's the weather in SF and NYC?"),
            assistant_with_calls(&["c1", "c2"]),
            Message::tool_result("c1", "72F"),
            Message::tool_result("c2", "65F"),
            Message::assistant("SF is 72F and NYC is 65F."),
        ];
        validate_flow(Service::OpenAi, &messages).unwrap();
    }

    #[test]
    fn flow_rejects_an_orphan_tool_result_with_its_position() {
        let messages = vec![
            Message::user("hi"),
            Message::assistant("hi"),
            Message::tool_result("x", "data"),
        ];
        let err = validate_flow(Service::OpenAi, &messages).unwrap_err();
        assert!(matches!(err, LlmError::Flow { position: 2, .. }));
    }

    #[test]
    fn flow_rejects_an_unknown_tool_call_id() {
        let messages = vec![
            Message::user("hi"),
            assistant_with_calls(&["c1"]),
            Message::tool_result("other", "data"),
        ];
        let err = validate_flow(Service::OpenAi, &messages).unwrap_err();
        assert!(matches!(err, LlmError::Flow { position: 2, .. }));
    }

    #[test]
    fn flow_binds_an_idless_result_to_a_single_pending_call() {
        let mut result = Message::tool_result("", "data");
        result.tool_call_id = None;
        let messages = vec![Message::user("hi"), assistant_with_calls(&["c1"]), result];
        validate_flow(Service::OpenAi, &messages).unwrap();
    }

    #[test]
    fn flow_rejects_an_idless_result_with_multiple_pending_calls() {
        let mut result = Message::tool_result("", "data");
        result.tool_call_id = None;
        let messages = vec![Message::user("hi"), assistant_with_calls(&["c1", "c2"]), result];
        let err = validate_flow(Service::OpenAi, &messages).unwrap_err();
        assert!(matches!(err, LlmError::Flow { position: 2, .. }));
    }

    #[test]
    fn flow_lets_user_messages_sit_between_calls_and_results() {
        let messages = vec![
            Message::user("weather?"),
            assistant_with_calls(&["c1"]),
            Message::user("(still waiting)"),
            Message::tool_result("c1", "72F"),
        ];
        validate_flow(Service::OpenAi, &messages).unwrap();
    }
}
