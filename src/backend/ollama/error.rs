use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("model is required")]
    MissingModel,

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {}: {}", .status.as_u16(), .body)]
    Status { status: StatusCode, body: String },

    #[error("invalid JSON from Ollama: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("stream line exceeds {limit} bytes without a newline")]
    LineTooLong { limit: usize },

    #[error("Ollama error after ctx fallbacks: {last}")]
    Exhausted { last: Box<UpstreamError> },
}
