//! Ollama `/api/chat` client.
//!
//! Non-streaming calls walk a list of context sizes until one succeeds.
//! Streaming calls use only the primary size and decode the NDJSON body
//! line by line into [`DeltaToken`]s.

mod client;
mod error;
mod stream;

pub use client::{OllamaClient, OllamaConfig};
pub use error::UpstreamError;
pub use stream::{DeltaToken, TokenStream};
