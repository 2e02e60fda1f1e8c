//! OpenAI-family adapter (OpenAI, Groq, DeepSeek, xAI)
//!
//! One adapter serves every provider speaking the chat-completions wire
//! format; they differ only in base URL and reasoning parameters, both
//! handled by the shared encoder.

use async_trait::async_trait;
use http::Method;
use secrecy::ExposeSecret;

use super::{Adapter, AdapterCapabilities, ProviderRequest, decode_body, encode_body};
use crate::convert::decode_chunks;
use crate::convert::openai::{OpenAiStreamDecoder, decode_response, encode_request};
use crate::error::LlmError;
use crate::protocol::openai::{OpenAiErrorResponse, OpenAiResponse};
use crate::sse::sse_payloads;
use crate::transport::{Transport, TransportRequest, TransportResponse};
use crate::types::{ChatResponse, Service, StreamingResponse};

/// OpenAI-compatible chat-completions adapter
pub struct OpenAiAdapter {
    service: Service,
}

impl OpenAiAdapter {
    /// Adapter for one member of the OpenAI family
    pub fn new(service: Service) -> Self {
        debug_assert!(service.is_openai_compatible());
        Self { service }
    }

    /// Default base URL for the family member
    const fn default_base_url(&self) -> &'static str {
        match self.service {
            Service::Groq => "https://api.groq.com/openai/v1",
            Service::DeepSeek => "https://api.deepseek.com/v1",
            Service::XAi => "https://api.x.ai/v1",
            _ => "https://api.openai.com/v1",
        }
    }

    fn completions_url(&self, request: &ProviderRequest) -> String {
        format!("{}/chat/completions", request.base_url_or(self.default_base_url()))
    }

    fn headers(&self, request: &ProviderRequest) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        if let Some(key) = &request.api_key {
            headers.push(("Authorization".to_owned(), format!("Bearer {}", key.expose_secret())));
        }
        headers.extend(request.headers.iter().cloned());
        headers
    }

    async fn dispatch(
        &self,
        request: &ProviderRequest,
        transport: &dyn Transport,
        stream: bool,
    ) -> Result<TransportResponse, LlmError> {
        let wire = encode_request(request, stream);
        let response = transport
            .send(TransportRequest {
                method: Method::POST,
                url: self.completions_url(request),
                headers: self.headers(request),
                body: Some(encode_body(self.service, &wire)?),
            })
            .await?;

        if !response.status.is_success() {
            let status = response.status;
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiErrorResponse>(&body)
                .map_or(body, |parsed| parsed.error.message);
            tracing::warn!(service = %self.service, status = %status, "provider returned error");
            return Err(LlmError::Provider {
                service: self.service,
                status,
                message,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Adapter for OpenAiAdapter {
    fn service(&self) -> Service {
        self.service
    }

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities {
            streaming: true,
            tool_calling: true,
        }
    }

    async fn call(&self, request: &ProviderRequest, transport: &dyn Transport) -> Result<ChatResponse, LlmError> {
        let response = self.dispatch(request, transport, false).await?;
        let status = response.status;
        let body = response.text().await?;
        let wire: OpenAiResponse = decode_body(self.service, status, &body)?;
        Ok(decode_response(wire, request))
    }

    async fn stream(
        &self,
        request: &ProviderRequest,
        transport: &dyn Transport,
    ) -> Result<StreamingResponse, LlmError> {
        let response = self.dispatch(request, transport, true).await?;
        let decoder = OpenAiStreamDecoder::new(request);
        let chunks = decode_chunks(sse_payloads(response.body), decoder);
        Ok(StreamingResponse::new(self.service, request.model.clone(), chunks))
    }
}
