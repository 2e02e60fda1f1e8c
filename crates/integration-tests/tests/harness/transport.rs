//! Recording mock transport
//!
//! Queues canned responses and records every request so tests can assert on
//! the exact wire bodies, headers, and invocation counts without a network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axon_llm::{Transport, TransportError, TransportRequest, TransportResponse};
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream;
use http::StatusCode;

/// One canned response
pub struct MockResponse {
    pub status: StatusCode,
    pub chunks: Vec<Bytes>,
}

/// Transport that replays queued responses and records requests
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<TransportRequest>>,
    calls: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Transport preloaded with a single 200 JSON body
    pub fn with_json(body: &str) -> Arc<Self> {
        let transport = Self::new();
        transport.push_json(StatusCode::OK, body);
        transport
    }

    /// Queue a JSON body delivered in one read
    pub fn push_json(&self, status: StatusCode, body: &str) {
        self.push_response(MockResponse {
            status,
            chunks: vec![Bytes::copy_from_slice(body.as_bytes())],
        });
    }

    /// Queue an SSE body built from `data:` payloads, `[DONE]`-terminated
    pub fn push_sse(&self, payloads: &[&str]) {
        let mut body = String::new();
        for payload in payloads {
            body.push_str("data: ");
            body.push_str(payload);
            body.push_str("\n\n");
        }
        body.push_str("data: [DONE]\n\n");
        self.push_response(MockResponse {
            status: StatusCode::OK,
            chunks: vec![Bytes::from(body)],
        });
    }

    /// Queue an SSE body that ends without `[DONE]`
    pub fn push_sse_truncated(&self, payloads: &[&str]) {
        let mut body = String::new();
        for payload in payloads {
            body.push_str("data: ");
            body.push_str(payload);
            body.push_str("\n\n");
        }
        self.push_response(MockResponse {
            status: StatusCode::OK,
            chunks: vec![Bytes::from(body)],
        });
    }

    /// Queue an NDJSON body, one JSON object per line
    pub fn push_ndjson(&self, lines: &[&str]) {
        let mut body = String::new();
        for line in lines {
            body.push_str(line);
            body.push('\n');
        }
        self.push_response(MockResponse {
            status: StatusCode::OK,
            chunks: vec![Bytes::from(body)],
        });
    }

    pub fn push_response(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Number of requests dispatched through this transport
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request
    pub fn last_request(&self) -> TransportRequest {
        self.requests.lock().unwrap().last().cloned().expect("no request recorded")
    }

    /// The most recent request body parsed as JSON
    pub fn last_body(&self) -> serde_json::Value {
        let request = self.last_request();
        serde_json::from_str(request.body.as_deref().expect("request had no body")).expect("body was not JSON")
    }

    /// Value of a header on the most recent request, if present
    pub fn last_header(&self, name: &str) -> Option<String> {
        self.last_request()
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::new("no mock response queued"))?;

        Ok(TransportResponse {
            status: response.status,
            body: stream::iter(response.chunks.into_iter().map(Ok)).boxed(),
        })
    }
}
