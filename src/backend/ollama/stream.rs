use std::{fmt, pin::Pin};

use bytes::Bytes;
use futures::{stream::BoxStream, Stream, StreamExt};
use lmg_multimodal::EnrichedMessage;
use lmg_protocols::ollama::OllamaChatChunk;
use tracing::{debug, warn};

use super::{client::OllamaClient, error::UpstreamError};

/// Longest NDJSON line accepted from the backend (1 MB).
pub const MAX_LINE_SIZE: usize = 1024 * 1024;

/// One unit of streamed text, consumed at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaToken {
    Content(String),
    /// Synthetic token describing the failure that ended the stream.
    Error(String),
}

impl DeltaToken {
    pub fn error(cause: impl fmt::Display) -> Self {
        Self::Error(format!("\n[Ollama streaming error: {cause}]\n"))
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Content(text) | Self::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Single-pass token stream; ends after `done`, end of body, or one error token.
pub type TokenStream = Pin<Box<dyn Stream<Item = DeltaToken> + Send>>;

// ============================================================================
// Line Decoding
// ============================================================================

/// Splits a byte stream into lines, tolerating lines split across chunks.
#[derive(Debug)]
pub struct LineDecoder {
    buffer: Vec<u8>,
    max_line: usize,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new(MAX_LINE_SIZE)
    }
}

impl LineDecoder {
    pub fn new(max_line: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_line,
        }
    }

    /// Append a chunk. Fails if the unterminated tail grows past the limit.
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), UpstreamError> {
        self.buffer.extend_from_slice(chunk);
        let tail = match self.buffer.iter().rposition(|&b| b == b'\n') {
            Some(pos) => self.buffer.len() - pos - 1,
            None => self.buffer.len(),
        };
        if tail > self.max_line {
            return Err(UpstreamError::LineTooLong {
                limit: self.max_line,
            });
        }
        Ok(())
    }

    /// Next complete line, without its terminator.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buffer.drain(..=pos).collect();
        Some(String::from_utf8_lossy(&line[..pos]).into_owned())
    }

    /// The trailing unterminated line, once the body has ended.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum LineEvent {
    Skip,
    Text(String),
    Done,
}

fn strip_data_prefix(line: &str) -> &str {
    let line = line.trim();
    match line.strip_prefix("data:") {
        Some(rest) => rest.trim(),
        None => line,
    }
}

fn decode_line(line: &str) -> Result<LineEvent, UpstreamError> {
    let line = strip_data_prefix(line);
    if line.is_empty() {
        return Ok(LineEvent::Skip);
    }
    if line == "[DONE]" {
        return Ok(LineEvent::Done);
    }

    let chunk: OllamaChatChunk = serde_json::from_str(line)?;
    if chunk.is_done() {
        return Ok(LineEvent::Done);
    }
    match chunk.text() {
        "" => Ok(LineEvent::Skip),
        text => Ok(LineEvent::Text(text.to_string())),
    }
}

// ============================================================================
// Stream State
// ============================================================================

struct PendingChat {
    client: OllamaClient,
    messages: Vec<EnrichedMessage>,
    model: String,
}

struct BodyReader {
    model: String,
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    decoder: LineDecoder,
    eof: bool,
}

impl BodyReader {
    fn new(model: String, response: reqwest::Response) -> Self {
        Self {
            model,
            body: response.bytes_stream().boxed(),
            decoder: LineDecoder::default(),
            eof: false,
        }
    }

    /// Next non-empty text; `Ok(None)` once the backend is done.
    async fn next_text(&mut self) -> Result<Option<String>, UpstreamError> {
        loop {
            let line = match self.decoder.next_line() {
                Some(line) => Some(line),
                None if self.eof => self.decoder.finish(),
                None => None,
            };

            if let Some(line) = line {
                match decode_line(&line)? {
                    LineEvent::Skip => continue,
                    LineEvent::Text(text) => return Ok(Some(text)),
                    LineEvent::Done => return Ok(None),
                }
            }
            if self.eof {
                return Ok(None);
            }

            match self.body.next().await {
                Some(chunk) => self.decoder.push(&chunk?)?,
                None => self.eof = true,
            }
        }
    }
}

enum StreamState {
    Idle(PendingChat),
    Streaming(BodyReader),
    Finished,
}

pub(super) fn open(
    client: OllamaClient,
    messages: Vec<EnrichedMessage>,
    model: String,
) -> TokenStream {
    let pending = PendingChat {
        client,
        messages,
        model,
    };
    Box::pin(futures::stream::unfold(StreamState::Idle(pending), advance))
}

async fn advance(mut state: StreamState) -> Option<(DeltaToken, StreamState)> {
    loop {
        state = match state {
            StreamState::Idle(pending) => {
                let num_ctx = pending.client.config().num_ctx;
                debug!(model = %pending.model, num_ctx, "Opening Ollama stream");
                match pending
                    .client
                    .send_chat(&pending.messages, &pending.model, num_ctx, true)
                    .await
                {
                    Ok(response) => {
                        StreamState::Streaming(BodyReader::new(pending.model, response))
                    }
                    Err(e) => return Some(fail(&pending.model, e)),
                }
            }
            StreamState::Streaming(mut reader) => {
                return match reader.next_text().await {
                    Ok(Some(text)) => {
                        Some((DeltaToken::Content(text), StreamState::Streaming(reader)))
                    }
                    Ok(None) => None,
                    Err(e) => Some(fail(&reader.model, e)),
                };
            }
            StreamState::Finished => return None,
        };
    }
}

fn fail(model: &str, error: UpstreamError) -> (DeltaToken, StreamState) {
    warn!(model = %model, error = %error, "Ollama stream failed");
    (DeltaToken::error(&error), StreamState::Finished)
}
