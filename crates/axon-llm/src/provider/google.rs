//! Google Generative Language API adapter

use async_trait::async_trait;
use http::Method;
use secrecy::ExposeSecret;

use super::{Adapter, AdapterCapabilities, ProviderRequest, decode_body, encode_body};
use crate::convert::decode_chunks;
use crate::convert::google::{GoogleStreamDecoder, decode_response, encode_request};
use crate::error::LlmError;
use crate::protocol::google::{GoogleErrorResponse, GoogleResponse};
use crate::sse::sse_payloads;
use crate::transport::{Transport, TransportRequest, TransportResponse};
use crate::types::{ChatResponse, Service, StreamingResponse};

/// Default Generative Language API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Generative Language API adapter
pub struct GoogleAdapter;

impl GoogleAdapter {
    fn generate_url(request: &ProviderRequest) -> String {
        format!(
            "{}/models/{}:generateContent",
            request.base_url_or(DEFAULT_BASE_URL),
            request.model
        )
    }

    fn stream_url(request: &ProviderRequest) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            request.base_url_or(DEFAULT_BASE_URL),
            request.model
        )
    }

    fn headers(request: &ProviderRequest) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        if let Some(key) = &request.api_key {
            headers.push(("x-goog-api-key".to_owned(), key.expose_secret().to_owned()));
        }
        headers.extend(request.headers.iter().cloned());
        headers
    }

    async fn dispatch(
        request: &ProviderRequest,
        transport: &dyn Transport,
        url: String,
    ) -> Result<TransportResponse, LlmError> {
        let wire = encode_request(request);
        let response = transport
            .send(TransportRequest {
                method: Method::POST,
                url,
                headers: Self::headers(request),
                body: Some(encode_body(Service::Google, &wire)?),
            })
            .await?;

        if !response.status.is_success() {
            let status = response.status;
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleErrorResponse>(&body)
                .map_or(body, |parsed| parsed.error.message);
            tracing::warn!(service = %Service::Google, status = %status, "provider returned error");
            return Err(LlmError::Provider {
                service: Service::Google,
                status,
                message,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Adapter for GoogleAdapter {
    fn service(&self) -> Service {
        Service::Google
    }

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities {
            streaming: true,
            tool_calling: true,
        }
    }

    async fn call(&self, request: &ProviderRequest, transport: &dyn Transport) -> Result<ChatResponse, LlmError> {
        let response = Self::dispatch(request, transport, Self::generate_url(request)).await?;
        let status = response.status;
        let body = response.text().await?;
        let wire: GoogleResponse = decode_body(Service::Google, status, &body)?;
        Ok(decode_response(&wire, request))
    }

    async fn stream(
        &self,
        request: &ProviderRequest,
        transport: &dyn Transport,
    ) -> Result<StreamingResponse, LlmError> {
        let response = Self::dispatch(request, transport, Self::stream_url(request)).await?;
        let decoder = GoogleStreamDecoder::new(request);
        let chunks = decode_chunks(sse_payloads(response.body), decoder);
        Ok(StreamingResponse::new(Service::Google, request.model.clone(), chunks))
    }
}
