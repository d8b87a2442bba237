//! OpenAI-compatible gateway in front of a local Ollama backend.
//!
//! Inbound chat requests are normalized, images are replaced by OCR text, and
//! the conversation is forwarded to `/api/chat`. Streamed replies are
//! re-framed for the Chat Completions or Responses wire format.

pub mod app_context;
pub mod backend;
pub mod config;
pub mod logging;
pub mod multimodal;
pub mod routers;
pub mod server;

pub use lmg_protocols as protocols;
