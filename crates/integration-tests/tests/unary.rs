mod harness;

use axon_llm::{ChatConfig, LlmError, Message, Service, ask, send};
use harness::transport::MockTransport;
use http::StatusCode;

const OPENAI_HELLO_BODY: &str = r#"{"choices":[{"message":{"role":"assistant","content":"Hello! How can I help you today?"},"finish_reason":"stop"}],"usage":{"prompt_tokens":10,"completion_tokens":9,"total_tokens":19},"model":"gpt-3.5-turbo"}"#;

fn openai_config(transport: std::sync::Arc<MockTransport>) -> ChatConfig {
    ChatConfig::new(Service::OpenAi, "gpt-3.5-turbo")
        .with_api_key("sk-test")
        .with_messages(vec![Message::user("Hello!")])
        .with_transport(transport)
}

#[tokio::test]
async fn openai_unary_text_round_trip() {
    let transport = MockTransport::with_json(OPENAI_HELLO_BODY);
    let response = send(&openai_config(transport.clone()), None).await.unwrap();

    assert_eq!(response.content, "Hello! How can I help you today?");
    assert!(response.has_text_content());
    assert!(!response.has_reasoning());
    assert!(!response.has_tool_calls());
    assert_eq!(response.usage.input_tokens, 10);
    assert_eq!(response.usage.output_tokens, 9);
    assert_eq!(response.usage.total_tokens, 19);
    assert_eq!(response.messages.len(), 2);

    let request = transport.last_request();
    assert_eq!(request.url, "https://api.openai.com/v1/chat/completions");
    assert_eq!(
        transport.last_header("authorization").as_deref(),
        Some("Bearer sk-test")
    );
    let body = transport.last_body();
    assert_eq!(body["model"], "gpt-3.5-turbo");
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "Hello!");
    assert!(body.get("stream").is_none());
}

#[tokio::test]
async fn family_members_use_their_own_base_urls() {
    for (service, expected) in [
        (Service::Groq, "https://api.groq.com/openai/v1/chat/completions"),
        (Service::DeepSeek, "https://api.deepseek.com/v1/chat/completions"),
        (Service::XAi, "https://api.x.ai/v1/chat/completions"),
    ] {
        let transport = MockTransport::with_json(OPENAI_HELLO_BODY);
        let config = ChatConfig::new(service, "some-model")
            .with_api_key("sk-test")
            .with_messages(vec![Message::user("Hello!")])
            .with_transport(transport.clone());
        send(&config, None).await.unwrap();
        assert_eq!(transport.last_request().url, expected, "{service}");
    }
}

#[tokio::test]
async fn provider_errors_surface_status_and_vendor_message() {
    let transport = MockTransport::new();
    transport.push_json(
        StatusCode::UNAUTHORIZED,
        r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
    );

    let err = send(&openai_config(transport), None).await.unwrap_err();
    let LlmError::Provider { service, status, message } = err else {
        panic!("expected provider error, got {err}");
    };
    assert_eq!(service, Service::OpenAi);
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(message, "Incorrect API key provided");
}

#[tokio::test]
async fn provider_errors_fall_back_to_the_raw_body() {
    let transport = MockTransport::new();
    transport.push_json(StatusCode::BAD_GATEWAY, "upstream exploded");

    let err = send(&openai_config(transport), None).await.unwrap_err();
    assert!(matches!(
        err,
        LlmError::Provider { status, ref message, .. }
            if status == StatusCode::BAD_GATEWAY && message == "upstream exploded"
    ));
}

#[tokio::test]
async fn anthropic_unary_sends_version_and_api_key_headers() {
    let transport = MockTransport::with_json(
        r#"{"id":"msg_1","model":"claude-sonnet-4-0","content":[{"type":"text","text":"Hi."}],"stop_reason":"end_turn","usage":{"input_tokens":8,"output_tokens":4}}"#,
    );
    let config = ChatConfig::new(Service::Anthropic, "claude-sonnet-4-0")
        .with_api_key("sk-ant")
        .with_messages(vec![Message::system("Be brief."), Message::user("Hello!")])
        .with_transport(transport.clone());

    let response = send(&config, None).await.unwrap();
    assert_eq!(response.content, "Hi.");
    assert_eq!(response.usage.total_tokens, 12);

    let request = transport.last_request();
    assert_eq!(request.url, "https://api.anthropic.com/v1/messages");
    assert_eq!(transport.last_header("x-api-key").as_deref(), Some("sk-ant"));
    assert_eq!(transport.last_header("anthropic-version").as_deref(), Some("2023-06-01"));
    assert!(transport.last_header("anthropic-beta").is_none());

    let body = transport.last_body();
    assert_eq!(body["system"], "Be brief.");
    assert_eq!(body["max_tokens"], 4096);
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn anthropic_thinking_budget_adds_beta_header_and_body_parameter() {
    let transport = MockTransport::with_json(
        r#"{"id":"msg_1","model":"claude-sonnet-4-0","content":[{"type":"text","text":"Hi."}],"usage":{"input_tokens":1,"output_tokens":1}}"#,
    );
    let config = ChatConfig::new(Service::Anthropic, "claude-sonnet-4-0")
        .with_api_key("sk-ant")
        .with_messages(vec![Message::user("Hello!")])
        .with_thinking_budget(2048)
        .with_browser_mode(true)
        .with_transport(transport.clone());

    send(&config, None).await.unwrap();

    assert_eq!(
        transport.last_header("anthropic-beta").as_deref(),
        Some("thinking-2024-12-03")
    );
    assert_eq!(
        transport.last_header("anthropic-dangerous-direct-browser-access").as_deref(),
        Some("true")
    );
    let body = transport.last_body();
    assert_eq!(body["thinking"]["type"], "enabled");
    assert_eq!(body["thinking"]["budget_tokens"], 2048);
}

#[tokio::test]
async fn ollama_unary_needs_no_auth_and_maps_eval_counts() {
    let transport = MockTransport::with_json(
        r#"{"model":"llama3.2","message":{"role":"assistant","content":"Hello."},"done":true,"prompt_eval_count":6,"eval_count":3}"#,
    );
    let config = ChatConfig::new(Service::Ollama, "llama3.2")
        .with_messages(vec![Message::user("Hello!")])
        .with_transport(transport.clone());

    let response = send(&config, None).await.unwrap();
    assert_eq!(response.content, "Hello.");
    assert_eq!(response.usage.input_tokens, 6);
    assert_eq!(response.usage.output_tokens, 3);

    let request = transport.last_request();
    assert_eq!(request.url, "http://localhost:11434/api/chat");
    assert!(transport.last_header("authorization").is_none());
}

#[tokio::test]
async fn ask_prepends_the_system_prompt_and_question() {
    let transport = MockTransport::with_json(OPENAI_HELLO_BODY);
    let config = ChatConfig::new(Service::OpenAi, "gpt-3.5-turbo")
        .with_api_key("sk-test")
        .with_system_prompt("You are terse.")
        .with_transport(transport.clone());

    let response = ask(&config, "What is Rust?", None).await.unwrap();
    assert!(response.has_text_content());

    let body = transport.last_body();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[0]["content"], "You are terse.");
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["content"], "What is Rust?");
}

#[tokio::test]
async fn custom_base_url_and_headers_pass_through() {
    let transport = MockTransport::with_json(OPENAI_HELLO_BODY);
    let config = ChatConfig::new(Service::OpenAi, "gpt-3.5-turbo")
        .with_api_key("sk-test")
        .with_base_url("https://proxy.example.com/v1/".parse().unwrap())
        .with_header("x-request-tag", "unit")
        .with_messages(vec![Message::user("Hello!")])
        .with_transport(transport.clone());

    send(&config, None).await.unwrap();
    assert_eq!(
        transport.last_request().url,
        "https://proxy.example.com/v1/chat/completions"
    );
    assert_eq!(transport.last_header("x-request-tag").as_deref(), Some("unit"));
}
