//! Dispatcher: the public entry points
//!
//! Selects the adapter from the config's service discriminant, merges
//! per-call options over the config, validates the merged request, resolves
//! the transport by the four-tier precedence, and delegates.

use crate::error::LlmError;
use crate::provider::anthropic::AnthropicAdapter;
use crate::provider::google::GoogleAdapter;
use crate::provider::ollama::OllamaAdapter;
use crate::provider::openai::OpenAiAdapter;
use crate::provider::{Adapter, AdapterCapabilities, ProviderRequest};
use crate::transport::resolve_transport;
use crate::types::{CallOptions, ChatConfig, ChatResponse, Message, Service, StreamingResponse};
use crate::validate::{validate_config, validate_flow, validate_tool_results};

/// Adapter for a service; exhaustive so a new provider is a compile-time
/// checked extension
fn adapter_for(service: Service) -> Box<dyn Adapter> {
    match service {
        Service::OpenAi | Service::Groq | Service::DeepSeek | Service::XAi => Box::new(OpenAiAdapter::new(service)),
        Service::Anthropic => Box::new(AnthropicAdapter),
        Service::Google => Box::new(GoogleAdapter),
        Service::Ollama => Box::new(OllamaAdapter),
    }
}

/// Capabilities the adapter for a service advertises
pub fn capabilities(service: Service) -> AdapterCapabilities {
    adapter_for(service).capabilities()
}

/// Merge per-call options over the config; options win for the overlapping
/// fields
pub(crate) fn merge_request(config: &ChatConfig, options: Option<&CallOptions>) -> ProviderRequest {
    ProviderRequest {
        service: config.service,
        model: config.model.clone(),
        messages: config.messages.clone(),
        api_key: config.api_key.clone(),
        base_url: config.base_url.clone(),
        headers: config.headers.clone(),
        temperature: options.and_then(|o| o.temperature).or(config.temperature),
        max_tokens: options.and_then(|o| o.max_tokens).or(config.max_tokens),
        tools: options.and_then(|o| o.tools.clone()).or_else(|| config.tools.clone()),
        browser: config.browser,
        reasoning_effort: config.reasoning_effort,
        reasoning_format: config.reasoning_format,
        thinking_budget: config.thinking_budget,
        include_thoughts: config.include_thoughts,
    }
}

/// Run every validator that applies to the merged request
fn validate(request: &ProviderRequest) -> Result<(), LlmError> {
    validate_config(request.service, &request.model, &request.messages)?;
    validate_tool_results(request.service, &request.messages)?;
    if request.service.is_openai_compatible() {
        validate_flow(request.service, &request.messages)?;
    }
    Ok(())
}

/// Send a conversation and await the complete response
pub async fn send(config: &ChatConfig, options: Option<&CallOptions>) -> Result<ChatResponse, LlmError> {
    let transport = resolve_transport(
        options.and_then(|o| o.transport.as_ref()),
        config.transport.as_ref(),
    );
    let request = merge_request(config, options);
    validate(&request)?;
    adapter_for(request.service).call(&request, transport.as_ref()).await
}

/// Send a conversation and receive the response incrementally
pub async fn stream(config: &ChatConfig, options: Option<&CallOptions>) -> Result<StreamingResponse, LlmError> {
    let transport = resolve_transport(
        options.and_then(|o| o.transport.as_ref()),
        config.transport.as_ref(),
    );
    let request = merge_request(config, options);
    validate(&request)?;
    adapter_for(request.service).stream(&request, transport.as_ref()).await
}

/// One-shot convenience: build a message list from the config's system
/// prompt and a question, then send
pub async fn ask(config: &ChatConfig, question: &str, options: Option<&CallOptions>) -> Result<ChatResponse, LlmError> {
    let config = ask_config(config, question);
    send(&config, options).await
}

/// One-shot convenience: build a message list from the config's system
/// prompt and a question, then stream
pub async fn stream_ask(
    config: &ChatConfig,
    question: &str,
    options: Option<&CallOptions>,
) -> Result<StreamingResponse, LlmError> {
    let config = ask_config(config, question);
    stream(&config, options).await
}

fn ask_config(config: &ChatConfig, question: &str) -> ChatConfig {
    let mut messages = Vec::with_capacity(2);
    if let Some(prompt) = &config.system_prompt {
        messages.push(Message::system(prompt.clone()));
    }
    messages.push(Message::user(question));

    let mut config = config.clone();
    config.messages = messages;
    config
}
