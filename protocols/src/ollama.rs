//! Ollama native API payloads (`/api/chat`, `/api/tags`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for `POST /api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<OllamaMessage<'a>>,
    pub stream: bool,
    pub options: OllamaOptions,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct OllamaMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct OllamaOptions {
    /// Context window in tokens.
    pub num_ctx: u32,
}

/// A non-streaming reply, or one line of a streaming reply.
///
/// Chat replies carry `message.content`; generate-style replies carry the
/// legacy top-level `response` field. Fields are read leniently: a field of
/// the wrong type is treated as absent rather than failing the line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OllamaChatChunk {
    #[serde(default)]
    message: Value,
    #[serde(default)]
    response: Value,
    #[serde(default)]
    done: Value,
}

impl OllamaChatChunk {
    /// Only a boolean `true` ends the stream.
    pub fn is_done(&self) -> bool {
        self.done.as_bool().unwrap_or(false)
    }

    /// Reply text, preferring `message.content` over `response`.
    pub fn text(&self) -> &str {
        self.message
            .get("content")
            .and_then(Value::as_str)
            .filter(|content| !content.is_empty())
            .or_else(|| self.response.as_str())
            .unwrap_or_default()
    }
}

/// Response body of `GET /api/tags`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OllamaTagsResponse {
    #[serde(default)]
    pub models: Vec<OllamaModelTag>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OllamaModelTag {
    #[serde(default)]
    pub name: String,
}

impl OllamaTagsResponse {
    pub fn model_names(self) -> Vec<String> {
        self.models
            .into_iter()
            .map(|m| m.name)
            .filter(|name| !name.is_empty())
            .collect()
    }
}
