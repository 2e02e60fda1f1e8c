use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::stream::{BoxStream, Stream, StreamExt};

use super::response::{ChatResponse, Usage};
use super::service::Service;
use super::tool::ToolCall;
use crate::error::LlmError;

/// One event on a streaming response
#[derive(Debug, Clone)]
pub enum StreamChunk {
    /// Incremental text content
    Content(String),
    /// Incremental reasoning trace
    Reasoning(String),
    /// A fully-reassembled tool call
    ToolCall(ToolCall),
    /// Token accounting, delivered before or after `Complete`
    Usage(Usage),
    /// Terminal chunk carrying the assembled response; exactly one per stream
    Complete(Box<ChatResponse>),
}

/// Internal chunk stream type produced by the streaming decoders
pub(crate) type ChunkStream = BoxStream<'static, Result<StreamChunk, LlmError>>;

/// Handle to an in-flight streaming response
///
/// Iterating drives the transport read loop; chunks arrive in wire order and
/// the terminal [`StreamChunk::Complete`] is strictly last. Dropping the
/// handle releases the underlying reader.
pub struct StreamingResponse {
    /// Provider serving the stream
    pub service: Service,
    /// Requested model
    pub model: String,
    inner: ChunkStream,
    finished: Option<Box<ChatResponse>>,
}

impl StreamingResponse {
    pub(crate) fn new(service: Service, model: String, inner: ChunkStream) -> Self {
        Self {
            service,
            model,
            inner,
            finished: None,
        }
    }

    /// Next chunk, or `None` once the stream has ended
    pub async fn next_chunk(&mut self) -> Option<Result<StreamChunk, LlmError>> {
        self.next().await
    }

    /// Drain the remaining chunks and return the final response
    ///
    /// Memoized: once the terminal chunk has been observed, further calls
    /// return the same response without touching the wire.
    pub async fn collect(&mut self) -> Result<ChatResponse, LlmError> {
        loop {
            if let Some(response) = &self.finished {
                return Ok((**response).clone());
            }
            match self.next().await {
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
                None => return Err(LlmError::Stream("stream ended without a terminal complete chunk".to_owned())),
            }
        }
    }
}

impl Stream for StreamingResponse {
    type Item = Result<StreamChunk, LlmError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                if let StreamChunk::Complete(response) = &chunk {
                    this.finished = Some(response.clone());
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            other => other,
        }
    }
}
