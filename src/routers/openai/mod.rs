//! OpenAI-compatible chat endpoints backed by Ollama.
//!
//! - [`chat`]: `/v1/chat/completions`, delta framing when streaming
//! - [`responses`]: `/v1/responses`, cumulative framing when streaming

pub mod chat;
pub mod responses;

use chrono::Utc;

pub(crate) const CHAT_ID_PREFIX: &str = "chatcmpl";
pub(crate) const RESPONSE_ID_PREFIX: &str = "resp";

/// `<prefix>_<unix millis>`
pub(crate) fn generate_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Utc::now().timestamp_millis())
}

/// Unix seconds.
pub(crate) fn created_timestamp() -> i64 {
    Utc::now().timestamp()
}
