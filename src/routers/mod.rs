//! HTTP route handlers.

pub mod error;
pub mod health;
pub mod images;
pub mod models;
pub mod openai;
pub mod streaming;

pub use streaming::{streaming_response, FramingMode, StreamTranscoder};
