//! Injected HTTP transport port
//!
//! The transport is the only system call the core makes. Callers may inject
//! their own implementation per call, per config, or process-wide; when none
//! is provided an ambient `reqwest`-backed transport is used.

use std::sync::{Arc, LazyLock, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use http::StatusCode;
use thiserror::Error;

/// Byte stream produced by a transport response body
pub type ByteStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Failure of the injected transport (connection error, abort, ...)
///
/// Propagated to callers unchanged; the core never retries.
#[derive(Debug, Clone, Error)]
#[error("transport error: {message}")]
pub struct TransportError {
    /// Human-readable failure description
    pub message: String,
}

impl TransportError {
    /// Create a transport error from any displayable cause
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Request handed to the transport
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method
    pub method: http::Method,
    /// Fully-resolved request URL
    pub url: String,
    /// Header name/value pairs
    pub headers: Vec<(String, String)>,
    /// JSON request body, if any
    pub body: Option<String>,
}

/// Response returned by the transport
pub struct TransportResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response body as a lazy byte stream
    pub body: ByteStream,
}

impl TransportResponse {
    /// Build a response from an in-memory body (useful for test transports)
    pub fn from_bytes(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self {
            status,
            body: stream::once(async move { Ok(body) }).boxed(),
        }
    }

    /// Drain the body into a string (unary path)
    pub async fn text(mut self) -> Result<String, TransportError> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Port through which all provider HTTP traffic flows
///
/// Mirrors the fetch contract at the type level: one function from a request
/// to a status plus a byte stream, used for both unary and streaming calls.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one HTTP exchange
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Ambient transport backed by a shared `reqwest` client
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a fresh client
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self.client.request(request.method, &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = request.body {
            builder = builder.header(http::header::CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder.send().await.map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes_stream()
            .map(|result| result.map_err(|e| TransportError::new(e.to_string())))
            .boxed();

        Ok(TransportResponse { status, body })
    }
}

/// Process-wide default transport, installed via `set_default_transport`
static PROCESS_TRANSPORT: RwLock<Option<Arc<dyn Transport>>> = RwLock::new(None);

/// Lazily-constructed ambient transport used when nothing else is configured
static AMBIENT_TRANSPORT: LazyLock<Arc<dyn Transport>> = LazyLock::new(|| Arc::new(HttpTransport::new()));

/// Install the process-wide default transport
///
/// A single pointer assignment; readers always observe either the previous
/// or the new transport, both of which are valid.
pub fn set_default_transport(transport: Arc<dyn Transport>) {
    if let Ok(mut slot) = PROCESS_TRANSPORT.write() {
        *slot = Some(transport);
    }
}

/// The currently-installed process-wide default transport, if any
pub fn default_transport() -> Option<Arc<dyn Transport>> {
    PROCESS_TRANSPORT.read().ok().and_then(|slot| slot.clone())
}

/// Resolve the transport for one call: call override, then config override,
/// then the process-wide default, then the ambient client
pub(crate) fn resolve_transport(
    call: Option<&Arc<dyn Transport>>,
    config: Option<&Arc<dyn Transport>>,
) -> Arc<dyn Transport> {
    call.or(config)
        .cloned()
        .or_else(default_transport)
        .unwrap_or_else(|| Arc::clone(&AMBIENT_TRANSPORT))
}
