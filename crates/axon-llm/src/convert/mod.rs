//! Conversion between the unified model and vendor wire formats
//!
//! One module per vendor family, each holding the request encoder, the unary
//! response decoder, and a streaming decoder state machine. The state
//! machines share the [`decode_chunks`] driver, which guarantees the
//! end-of-stream contract: exactly one terminal `Complete` chunk, emitted
//! strictly last, with the underlying reader released on every exit path.

pub mod anthropic;
pub mod google;
pub mod ollama;
pub mod openai;

use std::collections::VecDeque;

use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};

use crate::error::LlmError;
use crate::types::StreamChunk;
use crate::types::stream::ChunkStream;

/// Incremental decoder turning wire payloads into stream chunks
///
/// Implementations keep whatever state their vendor needs (accumulators,
/// finalization flags, aggregation buffers). Malformed payloads must be
/// skipped with a debug log, never surfaced.
pub(crate) trait StreamDecoder: Send + 'static {
    /// Decode one wire payload into zero or more chunks
    fn on_payload(&mut self, payload: &str) -> Vec<StreamChunk>;

    /// The payload stream ended; flush pending state
    ///
    /// Must emit the terminal `Complete` chunk if it has not been emitted
    /// yet, and nothing at all if it has.
    fn on_end(&mut self) -> Vec<StreamChunk>;
}

struct Driver<D> {
    payloads: BoxStream<'static, Result<String, LlmError>>,
    decoder: D,
    queue: VecDeque<StreamChunk>,
    done: bool,
}

/// Drive a [`StreamDecoder`] over a payload stream
///
/// Chunks are yielded in decode order; once the terminal `Complete` chunk is
/// delivered the payload stream is not polled again, so dropping or draining
/// the result releases the reader. A payload-level error (transport failure,
/// framing error) is yielded once and terminates the stream without a
/// `Complete`.
pub(crate) fn decode_chunks<D: StreamDecoder>(
    payloads: BoxStream<'static, Result<String, LlmError>>,
    decoder: D,
) -> ChunkStream {
    let driver = Driver {
        payloads,
        decoder,
        queue: VecDeque::new(),
        done: false,
    };

    stream::unfold(driver, |mut driver| async move {
        loop {
            if let Some(chunk) = driver.queue.pop_front() {
                if matches!(chunk, StreamChunk::Complete(_)) {
                    driver.done = true;
                    driver.queue.clear();
                }
                return Some((Ok(chunk), driver));
            }
            if driver.done {
                return None;
            }
            match driver.payloads.next().await {
                Some(Ok(payload)) => {
                    let chunks = driver.decoder.on_payload(&payload);
                    driver.queue.extend(chunks);
                }
                Some(Err(e)) => {
                    driver.done = true;
                    return Some((Err(e), driver));
                }
                None => {
                    let chunks = driver.decoder.on_end();
                    driver.queue.extend(chunks);
                    if driver.queue.is_empty() {
                        return None;
                    }
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;
    use futures_util::stream;

    use super::*;
    use crate::types::{ChatResponse, Service, Usage};

    struct EchoDecoder {
        complete_emitted: bool,
    }

    impl EchoDecoder {
        fn complete(&mut self) -> StreamChunk {
            self.complete_emitted = true;
            StreamChunk::Complete(Box::new(ChatResponse::assemble(
                Service::OpenAi,
                "test".to_owned(),
                "done".to_owned(),
                None,
                vec![],
                Usage::default(),
                &[],
            )))
        }
    }

    impl StreamDecoder for EchoDecoder {
        fn on_payload(&mut self, payload: &str) -> Vec<StreamChunk> {
            if payload == "stop" {
                vec![self.complete()]
            } else {
                vec![StreamChunk::Content(payload.to_owned())]
            }
        }

        fn on_end(&mut self) -> Vec<StreamChunk> {
            if self.complete_emitted {
                vec![]
            } else {
                vec![self.complete()]
            }
        }
    }

    fn payloads(items: Vec<Result<String, LlmError>>) -> BoxStream<'static, Result<String, LlmError>> {
        stream::iter(items).boxed()
    }

    #[tokio::test]
    async fn flushes_a_complete_chunk_at_stream_end() {
        let chunks: Vec<_> = decode_chunks(
            payloads(vec![Ok("a".to_owned()), Ok("b".to_owned())]),
            EchoDecoder { complete_emitted: false },
        )
        .collect()
        .await;
        assert_eq!(chunks.len(), 3);
        assert!(matches!(chunks[2].as_ref().unwrap(), StreamChunk::Complete(_)));
    }

    #[tokio::test]
    async fn stops_polling_after_a_mid_stream_complete() {
        let chunks: Vec<_> = decode_chunks(
            payloads(vec![Ok("a".to_owned()), Ok("stop".to_owned()), Ok("after".to_owned())]),
            EchoDecoder { complete_emitted: false },
        )
        .collect()
        .await;
        // "after" must never be decoded: the stream ends at the terminal chunk
        assert_eq!(chunks.len(), 2);
        assert!(matches!(chunks[1].as_ref().unwrap(), StreamChunk::Complete(_)));
    }

    #[tokio::test]
    async fn an_error_terminates_without_a_complete() {
        let chunks: Vec<_> = decode_chunks(
            payloads(vec![
                Ok("a".to_owned()),
                Err(LlmError::Stream("boom".to_owned())),
                Ok("b".to_owned()),
            ]),
            EchoDecoder { complete_emitted: false },
        )
        .collect()
        .await;
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].is_err());
    }
}
