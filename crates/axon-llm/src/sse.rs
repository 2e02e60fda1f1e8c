//! Wire framing readers
//!
//! Turns a transport byte stream into a lazy sequence of payload strings:
//! SSE `data:` payloads for most providers, newline-delimited JSON for
//! Ollama. The framing layer handles CRLF normalization and partial UTF-8
//! sequences; dropping the returned stream releases the underlying reader.

use eventsource_stream::{EventStreamError, Eventsource};
use futures_util::stream::{BoxStream, StreamExt};
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;

use crate::error::LlmError;
use crate::transport::ByteStream;

/// Sentinel payload that terminates an OpenAI-style SSE stream
const DONE_SENTINEL: &str = "[DONE]";

/// Lazy sequence of SSE `data:` payloads
///
/// Empty payloads are skipped, non-data lines (events, comments) are
/// ignored, and a `[DONE]` payload terminates the sequence without being
/// yielded.
pub fn sse_payloads(bytes: ByteStream) -> BoxStream<'static, Result<String, LlmError>> {
    bytes
        .eventsource()
        .filter_map(|result| {
            let item = match result {
                Ok(event) => {
                    let data = event.data.trim().to_owned();
                    if data.is_empty() { None } else { Some(Ok(data)) }
                }
                Err(EventStreamError::Transport(e)) => Some(Err(LlmError::Transport(e))),
                Err(e) => Some(Err(LlmError::Stream(e.to_string()))),
            };
            std::future::ready(item)
        })
        .take_while(|item| {
            let done = matches!(item, Ok(data) if data.as_str() == DONE_SENTINEL);
            std::future::ready(!done)
        })
        .boxed()
}

/// Lazy sequence of newline-delimited JSON payloads (Ollama streaming)
pub fn ndjson_lines(bytes: ByteStream) -> BoxStream<'static, Result<String, LlmError>> {
    let reader = StreamReader::new(bytes.map(|result| result.map_err(std::io::Error::other)));
    FramedRead::new(reader, LinesCodec::new())
        .filter_map(|result| {
            let item = match result {
                Ok(line) => {
                    let line = line.trim().to_owned();
                    if line.is_empty() { None } else { Some(Ok(line)) }
                }
                Err(e) => Some(Err(LlmError::Stream(e.to_string()))),
            };
            std::future::ready(item)
        })
        .boxed()
}
