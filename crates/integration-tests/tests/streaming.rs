mod harness;

use axon_llm::{ChatConfig, Message, Service, StreamChunk, StreamingResponse, stream};
use harness::transport::MockTransport;
use serde_json::json;

fn kind(chunk: &StreamChunk) -> &'static str {
    match chunk {
        StreamChunk::Content(_) => "content",
        StreamChunk::Reasoning(_) => "reasoning",
        StreamChunk::ToolCall(_) => "tool_call",
        StreamChunk::Usage(_) => "usage",
        StreamChunk::Complete(_) => "complete",
    }
}

async fn drain(mut response: StreamingResponse) -> Vec<StreamChunk> {
    let mut chunks = Vec::new();
    while let Some(item) = response.next_chunk().await {
        chunks.push(item.unwrap());
    }
    chunks
}

#[tokio::test]
async fn openai_stream_reassembles_fragmented_tool_call_arguments() {
    let transport = MockTransport::new();
    transport.push_sse(&[
        r#"{"model":"gpt-4o","choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","function":{"name":"get_weather"}}]}}]}"#,
        r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"location\":"}}]}}]}"#,
        r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"\"SF\"}"}}]}}]}"#,
        r#"{"choices":[{"delta":{},"finish_reason":"tool_calls"}]}"#,
        r#"{"choices":[],"usage":{"prompt_tokens":15,"completion_tokens":25,"total_tokens":40}}"#,
    ]);

    let config = ChatConfig::new(Service::OpenAi, "gpt-4o")
        .with_api_key("sk-test")
        .with_messages(vec![Message::user("weather in SF?")])
        .with_transport(transport.clone());

    let chunks = drain(stream(&config, None).await.unwrap()).await;
    let kinds: Vec<_> = chunks.iter().map(kind).collect();
    assert_eq!(kinds, vec!["tool_call", "usage", "complete"]);

    let StreamChunk::ToolCall(call) = &chunks[0] else { panic!() };
    assert_eq!(call.id, "call_1");
    assert_eq!(call.name, "get_weather");
    assert_eq!(call.input, json!({"location": "SF"}));

    // The streaming request opts into trailing usage on canonical OpenAI
    let body = transport.last_body();
    assert_eq!(body["stream"], true);
    assert_eq!(body["stream_options"]["include_usage"], true);
}

#[tokio::test]
async fn the_final_chunk_carries_every_emitted_tool_call() {
    let transport = MockTransport::new();
    transport.push_sse(&[
        r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_a","function":{"name":"first","arguments":"{}"}}]}}]}"#,
        r#"{"choices":[{"delta":{"tool_calls":[{"index":1,"id":"call_b","function":{"name":"second","arguments":"{\"n\":1}"}}]}}]}"#,
        r#"{"choices":[{"delta":{},"finish_reason":"tool_calls"}]}"#,
        r#"{"choices":[],"usage":{"prompt_tokens":1,"completion_tokens":1,"total_tokens":2}}"#,
    ]);

    let config = ChatConfig::new(Service::OpenAi, "gpt-4o")
        .with_api_key("sk-test")
        .with_messages(vec![Message::user("go")])
        .with_transport(transport);

    let chunks = drain(stream(&config, None).await.unwrap()).await;

    let emitted: Vec<String> = chunks
        .iter()
        .filter_map(|c| match c {
            StreamChunk::ToolCall(call) => Some(call.id.clone()),
            _ => None,
        })
        .collect();
    let StreamChunk::Complete(response) = chunks.last().unwrap() else {
        panic!()
    };
    let in_final: Vec<String> = response
        .tool_calls
        .as_ref()
        .unwrap()
        .iter()
        .map(|c| c.id.clone())
        .collect();
    assert_eq!(emitted, in_final);
    assert_eq!(emitted, vec!["call_a", "call_b"]);
}

#[tokio::test]
async fn exactly_one_complete_chunk_and_it_is_last() {
    let transport = MockTransport::new();
    transport.push_sse(&[
        r#"{"choices":[{"delta":{"content":"Hel"}}]}"#,
        r#"{"choices":[{"delta":{"content":"lo"}}]}"#,
        r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
        r#"{"choices":[],"usage":{"prompt_tokens":2,"completion_tokens":2,"total_tokens":4}}"#,
    ]);

    let config = ChatConfig::new(Service::OpenAi, "gpt-4o")
        .with_api_key("sk-test")
        .with_messages(vec![Message::user("hi")])
        .with_transport(transport);

    let chunks = drain(stream(&config, None).await.unwrap()).await;
    let completes = chunks.iter().filter(|c| kind(c) == "complete").count();
    assert_eq!(completes, 1);
    assert_eq!(kind(chunks.last().unwrap()), "complete");
}

#[tokio::test]
async fn truncated_stream_completes_with_zeroed_usage() {
    let transport = MockTransport::new();
    transport.push_sse_truncated(&[r#"{"choices":[{"delta":{"content":"partial"}}]}"#]);

    let config = ChatConfig::new(Service::OpenAi, "gpt-4o")
        .with_api_key("sk-test")
        .with_messages(vec![Message::user("hi")])
        .with_transport(transport);

    let mut response = stream(&config, None).await.unwrap();
    let collected = response.collect().await.unwrap();
    assert_eq!(collected.content, "partial");
    assert_eq!(collected.usage.total_tokens, 0);
}

#[tokio::test]
async fn collect_is_memoized_across_calls() {
    let transport = MockTransport::new();
    transport.push_sse(&[
        r#"{"choices":[{"delta":{"content":"once"}}]}"#,
        r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
        r#"{"choices":[],"usage":{"prompt_tokens":1,"completion_tokens":1,"total_tokens":2}}"#,
    ]);

    let config = ChatConfig::new(Service::OpenAi, "gpt-4o")
        .with_api_key("sk-test")
        .with_messages(vec![Message::user("hi")])
        .with_transport(transport);

    let mut response = stream(&config, None).await.unwrap();
    let first = response.collect().await.unwrap();
    let second = response.collect().await.unwrap();
    assert_eq!(first.content, "once");
    assert_eq!(second.content, first.content);
    assert_eq!(second.usage, first.usage);
    assert_eq!(second.messages.len(), first.messages.len());
}

#[tokio::test]
async fn anthropic_stream_interleaves_thinking_tool_use_and_usage() {
    let transport = MockTransport::new();
    transport.push_sse_truncated(&[
        r#"{"type":"message_start","message":{"id":"msg_1","model":"claude-sonnet-4-0"}}"#,
        r#"{"type":"content_block_start","index":0,"content_block":{"type":"thinking","thinking":""}}"#,
        r#"{"type":"content_block_delta","index":0,"delta":{"type":"thinking_delta","thinking":"I should "}}"#,
        r#"{"type":"content_block_delta","index":0,"delta":{"type":"thinking_delta","thinking":"check the weather."}}"#,
        r#"{"type":"content_block_stop","index":0}"#,
        r#"{"type":"content_block_start","index":1,"content_block":{"type":"tool_use","id":"toolu_1","name":"get_weather","input":{"location":"SF"}}}"#,
        r#"{"type":"content_block_stop","index":1}"#,
        r#"{"type":"message_delta","delta":{"stop_reason":"tool_use"},"usage":{"input_tokens":30,"output_tokens":35}}"#,
        r#"{"type":"message_stop"}"#,
    ]);

    let config = ChatConfig::new(Service::Anthropic, "claude-sonnet-4-0")
        .with_api_key("sk-ant")
        .with_messages(vec![Message::user("weather in SF?")])
        .with_transport(transport);

    let chunks = drain(stream(&config, None).await.unwrap()).await;
    let kinds: Vec<_> = chunks.iter().map(kind).collect();
    assert_eq!(kinds, vec!["reasoning", "reasoning", "tool_call", "usage", "complete"]);

    let StreamChunk::Complete(response) = chunks.last().unwrap() else {
        panic!()
    };
    assert_eq!(response.reasoning.as_deref(), Some("I should check the weather."));
    let calls = response.tool_calls.as_ref().unwrap();
    assert_eq!(calls[0].id, "toolu_1");
    assert_eq!(calls[0].input, json!({"location": "SF"}));
    assert_eq!(response.usage.input_tokens, 30);
    assert_eq!(response.usage.output_tokens, 35);
}

#[tokio::test]
async fn google_stream_forwards_content_until_finish_reason() {
    let transport = MockTransport::new();
    transport.push_sse_truncated(&[
        r#"{"candidates":[{"content":{"parts":[{"text":"Hel"}]}}]}"#,
        r#"{"candidates":[{"content":{"parts":[{"text":"lo"}]},"finishReason":"STOP"}],"usageMetadata":{"promptTokenCount":3,"candidatesTokenCount":2,"totalTokenCount":5}}"#,
    ]);

    let config = ChatConfig::new(Service::Google, "gemini-2.0-flash")
        .with_api_key("g-key")
        .with_messages(vec![Message::user("hi")])
        .with_transport(transport.clone());

    let mut response = stream(&config, None).await.unwrap();
    let collected = response.collect().await.unwrap();
    assert_eq!(collected.content, "Hello");
    assert_eq!(collected.usage.total_tokens, 5);

    assert!(
        transport
            .last_request()
            .url
            .ends_with("models/gemini-2.0-flash:streamGenerateContent?alt=sse")
    );
}

#[tokio::test]
async fn ollama_stream_is_newline_delimited_json() {
    let transport = MockTransport::new();
    transport.push_ndjson(&[
        r#"{"model":"llama3.2","message":{"role":"assistant","content":"Hel"},"done":false}"#,
        r#"{"model":"llama3.2","message":{"role":"assistant","content":"lo."},"done":false}"#,
        r#"{"model":"llama3.2","message":{"role":"assistant","content":""},"done":true,"prompt_eval_count":4,"eval_count":2}"#,
    ]);

    let config = ChatConfig::new(Service::Ollama, "llama3.2")
        .with_messages(vec![Message::user("hi")])
        .with_transport(transport);

    let chunks = drain(stream(&config, None).await.unwrap()).await;
    let kinds: Vec<_> = chunks.iter().map(kind).collect();
    assert_eq!(kinds, vec!["content", "content", "usage", "complete"]);

    let StreamChunk::Complete(response) = chunks.last().unwrap() else {
        panic!()
    };
    assert_eq!(response.content, "Hello.");
    assert_eq!(response.usage.total_tokens, 6);
}

#[tokio::test]
async fn streamed_messages_equal_input_plus_assistant_turn() {
    let transport = MockTransport::new();
    transport.push_sse(&[
        r#"{"choices":[{"delta":{"content":"answer"}}]}"#,
        r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
        r#"{"choices":[],"usage":{"prompt_tokens":1,"completion_tokens":1,"total_tokens":2}}"#,
    ]);

    let input = vec![Message::system("be brief"), Message::user("question")];
    let config = ChatConfig::new(Service::OpenAi, "gpt-4o")
        .with_api_key("sk-test")
        .with_messages(input.clone())
        .with_transport(transport);

    let mut response = stream(&config, None).await.unwrap();
    let collected = response.collect().await.unwrap();
    assert_eq!(collected.messages.len(), 3);
    assert_eq!(collected.messages[..2], input[..]);
    assert_eq!(collected.messages[2].content.as_text(), "answer");
}
