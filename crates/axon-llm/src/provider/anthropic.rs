//! Anthropic Messages API adapter

use async_trait::async_trait;
use http::Method;
use secrecy::ExposeSecret;

use super::{Adapter, AdapterCapabilities, ProviderRequest, decode_body, encode_body};
use crate::convert::anthropic::{AnthropicStreamDecoder, decode_response, encode_request};
use crate::convert::decode_chunks;
use crate::error::LlmError;
use crate::protocol::anthropic::{AnthropicErrorResponse, AnthropicResponse};
use crate::sse::sse_payloads;
use crate::transport::{Transport, TransportRequest, TransportResponse};
use crate::types::{ChatResponse, Service, StreamingResponse};

/// Default Anthropic API base URL
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Beta header value enabling extended thinking
const THINKING_BETA: &str = "thinking-2024-12-03";

/// Anthropic Messages API adapter
pub struct AnthropicAdapter;

impl AnthropicAdapter {
    fn messages_url(request: &ProviderRequest) -> String {
        format!("{}/messages", request.base_url_or(DEFAULT_BASE_URL))
    }

    fn headers(request: &ProviderRequest) -> Vec<(String, String)> {
        let mut headers = vec![("anthropic-version".to_owned(), ANTHROPIC_VERSION.to_owned())];
        if let Some(key) = &request.api_key {
            headers.push(("x-api-key".to_owned(), key.expose_secret().to_owned()));
        }
        if request.thinking_budget.is_some() {
            headers.push(("anthropic-beta".to_owned(), THINKING_BETA.to_owned()));
        }
        if request.browser {
            headers.push((
                "anthropic-dangerous-direct-browser-access".to_owned(),
                "true".to_owned(),
            ));
        }
        headers.extend(request.headers.iter().cloned());
        headers
    }

    async fn dispatch(
        request: &ProviderRequest,
        transport: &dyn Transport,
        stream: bool,
    ) -> Result<TransportResponse, LlmError> {
        let wire = encode_request(request, stream);
        let response = transport
            .send(TransportRequest {
                method: Method::POST,
                url: Self::messages_url(request),
                headers: Self::headers(request),
                body: Some(encode_body(Service::Anthropic, &wire)?),
            })
            .await?;

        if !response.status.is_success() {
            let status = response.status;
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicErrorResponse>(&body)
                .map_or(body, |parsed| parsed.error.message);
            tracing::warn!(service = %Service::Anthropic, status = %status, "provider returned error");
            return Err(LlmError::Provider {
                service: Service::Anthropic,
                status,
                message,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Adapter for AnthropicAdapter {
    fn service(&self) -> Service {
        Service::Anthropic
    }

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities {
            streaming: true,
            tool_calling: true,
        }
    }

    async fn call(&self, request: &ProviderRequest, transport: &dyn Transport) -> Result<ChatResponse, LlmError> {
        let response = Self::dispatch(request, transport, false).await?;
        let status = response.status;
        let body = response.text().await?;
        let wire: AnthropicResponse = decode_body(Service::Anthropic, status, &body)?;
        Ok(decode_response(wire, request))
    }

    async fn stream(
        &self,
        request: &ProviderRequest,
        transport: &dyn Transport,
    ) -> Result<StreamingResponse, LlmError> {
        let response = Self::dispatch(request, transport, true).await?;
        let decoder = AnthropicStreamDecoder::new(request);
        let chunks = decode_chunks(sse_payloads(response.body), decoder);
        Ok(StreamingResponse::new(
            Service::Anthropic,
            request.model.clone(),
            chunks,
        ))
    }
}
