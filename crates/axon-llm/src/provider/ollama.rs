//! Ollama local chat API adapter
//!
//! No authentication; streaming is newline-delimited JSON rather than SSE.

use async_trait::async_trait;
use http::Method;

use super::{Adapter, AdapterCapabilities, ProviderRequest, decode_body, encode_body};
use crate::convert::decode_chunks;
use crate::convert::ollama::{OllamaStreamDecoder, decode_response, encode_request};
use crate::error::LlmError;
use crate::protocol::ollama::{OllamaErrorResponse, OllamaResponse};
use crate::sse::ndjson_lines;
use crate::transport::{Transport, TransportRequest, TransportResponse};
use crate::types::{ChatResponse, Service, StreamingResponse};

/// Default local Ollama base URL
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama chat adapter
pub struct OllamaAdapter;

impl OllamaAdapter {
    fn chat_url(request: &ProviderRequest) -> String {
        format!("{}/api/chat", request.base_url_or(DEFAULT_BASE_URL))
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
                url: Self::chat_url(request),
                headers: request.headers.clone(),
                body: Some(encode_body(Service::Ollama, &wire)?),
            })
            .await?;

        if !response.status.is_success() {
            let status = response.status;
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OllamaErrorResponse>(&body).map_or(body, |parsed| parsed.error);
            tracing::warn!(service = %Service::Ollama, status = %status, "provider returned error");
            return Err(LlmError::Provider {
                service: Service::Ollama,
                status,
                message,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Adapter for OllamaAdapter {
    fn service(&self) -> Service {
        Service::Ollama
    }

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities {
            streaming: true,
            tool_calling: false,
        }
    }

    async fn call(&self, request: &ProviderRequest, transport: &dyn Transport) -> Result<ChatResponse, LlmError> {
        let response = Self::dispatch(request, transport, false).await?;
        let status = response.status;
        let body = response.text().await?;
        let wire: OllamaResponse = decode_body(Service::Ollama, status, &body)?;
        Ok(decode_response(&wire, request))
    }

    async fn stream(
        &self,
        request: &ProviderRequest,
        transport: &dyn Transport,
    ) -> Result<StreamingResponse, LlmError> {
        let response = Self::dispatch(request, transport, true).await?;
        let decoder = OllamaStreamDecoder::new(request);
        let chunks = decode_chunks(ndjson_lines(response.body), decoder);
        Ok(StreamingResponse::new(Service::Ollama, request.model.clone(), chunks))
    }
}
