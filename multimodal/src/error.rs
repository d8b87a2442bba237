use reqwest::StatusCode;
use thiserror::Error;

/// Failure to turn an image reference into an image payload.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("bad data url: missing ',' separator")]
    MalformedDataUri,
    #[error("not URL or b64")]
    InvalidImageSource,
    #[error("failed to fetch image: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("image fetch returned HTTP {}", .status.as_u16())]
    Status { status: StatusCode },
    #[error("image payload is empty")]
    EmptyPayload,
}

/// Failure reported by an OCR engine.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {}: {}", .status.as_u16(), .body)]
    Status { status: StatusCode, body: String },
}
