//! Wire types for the local model gateway.
//!
//! - [`chat`]: OpenAI Chat Completions requests, responses and stream chunks
//! - [`responses`]: OpenAI Responses API requests and response objects
//! - [`content`]: the message content union shared by both inbound APIs
//! - [`ollama`]: the local backend's `/api/chat` and `/api/tags` payloads
//! - [`images`]: image generation requests and the txt2img backend payload
//! - [`models`]: the `/v1/models` listing
//! - [`error`]: the error envelope shared by every route

pub mod chat;
pub mod content;
pub mod error;
pub mod images;
pub mod models;
pub mod ollama;
pub mod responses;
pub mod validated;

pub use content::{ChatMessage, MessageContent};
pub use error::{ErrorResponse, ErrorType, ERROR_CODE_HEADER};
pub use validated::Normalizable;
#[cfg(feature = "axum")]
pub use validated::ValidatedJson;
