//! Re-frames a backend token stream as an SSE response.
//!
//! A producer task is spawned per request and writes one frame per body chunk
//! into a bounded channel. The task handle is owned by the response body, so
//! dropping the body (client disconnect) aborts the task and, with it, the
//! backend connection.

use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
};

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use lmg_protocols::{chat::ChatCompletionChunk, responses::ResponseObject};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, error};

use crate::{
    backend::ollama::{DeltaToken, TokenStream},
    routers::error as router_error,
};

/// Channel buffer size for SSE events sent to the client.
const SSE_CHANNEL_SIZE: usize = 128;

pub const SSE_DONE_FRAME: &str = "data: [DONE]\n\n";

/// Outbound wire shape of a streamed reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingMode {
    /// `chat.completion.chunk` per token, then a stop chunk, then `[DONE]`.
    Delta,
    /// A full `response` object per token holding all text so far, then only
    /// `[DONE]`. Clients of `/v1/responses` depend on the missing stop event.
    Cumulative,
}

// ============================================================================
// Transcoder
// ============================================================================

/// Per-request framing state. The id and timestamp are fixed for the whole stream.
#[derive(Debug)]
pub struct StreamTranscoder {
    mode: FramingMode,
    id: String,
    created: i64,
    model: String,
    role_sent: bool,
    collected: String,
}

impl StreamTranscoder {
    pub fn new(
        mode: FramingMode,
        id: impl Into<String>,
        created: i64,
        model: impl Into<String>,
    ) -> Self {
        Self {
            mode,
            id: id.into(),
            created,
            model: model.into(),
            role_sent: false,
            collected: String::new(),
        }
    }

    pub fn mode(&self) -> FramingMode {
        self.mode
    }

    /// One frame for one token. Error tokens are framed like content.
    pub fn frame_token(&mut self, token: &DeltaToken) -> Bytes {
        match self.mode {
            FramingMode::Delta => {
                let chunk = ChatCompletionChunk::content_delta(
                    &self.id,
                    self.created,
                    &self.model,
                    token.text(),
                    !self.role_sent,
                );
                self.role_sent = true;
                sse_data(&chunk)
            }
            FramingMode::Cumulative => {
                self.collected.push_str(token.text());
                let response = ResponseObject::assistant_text(
                    self.id.as_str(),
                    self.created,
                    self.model.as_str(),
                    self.collected.as_str(),
                );
                sse_data(&response)
            }
        }
    }

    /// Trailing frames after the last token.
    pub fn finish(self) -> Vec<Bytes> {
        let done = Bytes::from_static(SSE_DONE_FRAME.as_bytes());
        match self.mode {
            FramingMode::Delta => {
                let stop = ChatCompletionChunk::stop(&self.id, self.created, &self.model);
                vec![sse_data(&stop), done]
            }
            FramingMode::Cumulative => vec![done],
        }
    }
}

fn sse_data(data: &impl Serialize) -> Bytes {
    let json = serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string());
    Bytes::from(format!("data: {}\n\n", json))
}

// ============================================================================
// Producer
// ============================================================================

/// Drain `tokens` into `tx`; stops early once the receiver is gone.
async fn pump(
    mut tokens: TokenStream,
    mut transcoder: StreamTranscoder,
    tx: mpsc::Sender<Result<Bytes, io::Error>>,
) {
    let mut frames = 0usize;
    loop {
        let token = tokio::select! {
            _ = tx.closed() => {
                debug!(frames, "Client disconnected, stopping stream");
                return;
            }
            token = tokens.next() => token,
        };
        let Some(token) = token else {
            break;
        };
        if tx.send(Ok(transcoder.frame_token(&token))).await.is_err() {
            debug!(frames, "Client disconnected, stopping stream");
            return;
        }
        frames += 1;
    }

    for frame in transcoder.finish() {
        if tx.send(Ok(frame)).await.is_err() {
            return;
        }
    }
    debug!(frames, "Stream complete");
}

/// Response body that owns the producer task.
struct ProducerBoundStream {
    inner: ReceiverStream<Result<Bytes, io::Error>>,
    _producer: AbortOnDropHandle<()>,
}

impl Stream for ProducerBoundStream {
    type Item = Result<Bytes, io::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

/// Spawn the producer and return an SSE response bound to its lifetime.
pub fn streaming_response(tokens: TokenStream, transcoder: StreamTranscoder) -> Response {
    debug!(mode = ?transcoder.mode(), "Opening SSE stream");
    let (tx, rx) = mpsc::channel::<Result<Bytes, io::Error>>(SSE_CHANNEL_SIZE);
    let producer = AbortOnDropHandle::new(tokio::spawn(pump(tokens, transcoder, tx)));

    let body = Body::from_stream(ProducerBoundStream {
        inner: ReceiverStream::new(rx),
        _producer: producer,
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(body)
        .unwrap_or_else(|e| {
            error!("Failed to build streaming response: {}", e);
            router_error::internal_error("response_build_failed", "Failed to build response")
        })
}
