//! Image resolution: data URIs, remote URLs and raw base64 payloads.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::ResolutionError;

static BASE64_PAYLOAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9+/=\r\n]+$").expect("static base64 regex"));

/// A base64-encoded image ready for OCR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload(String);

impl ImagePayload {
    pub fn new(base64: impl Into<String>) -> Self {
        Self(base64.into())
    }

    pub fn as_base64(&self) -> &str {
        &self.0
    }
}

/// Where an image reference points, in resolution priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource<'a> {
    /// Payload after the first comma of a `data:` URI, not validated.
    DataUri(&'a str),
    /// An absolute `http://` or `https://` address.
    Remote(&'a str),
    /// The whole string, which matches the base64 alphabet.
    RawBase64(&'a str),
}

impl<'a> ImageSource<'a> {
    pub fn classify(source: &'a str) -> Result<Self, ResolutionError> {
        if source.starts_with("data:") {
            return source
                .split_once(',')
                .map(|(_, payload)| Self::DataUri(payload))
                .ok_or(ResolutionError::MalformedDataUri);
        }
        if source.starts_with("http://") || source.starts_with("https://") {
            return Ok(Self::Remote(source));
        }
        if BASE64_PAYLOAD_RE.is_match(source.trim()) {
            return Ok(Self::RawBase64(source));
        }
        Err(ResolutionError::InvalidImageSource)
    }
}

#[derive(Debug, Clone)]
pub struct ImageResolverConfig {
    /// Upper bound for a single remote image download.
    pub fetch_timeout: Duration,
}

impl Default for ImageResolverConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

/// Resolves image references to base64 payloads.
///
/// Remote images are downloaded on every call; nothing is cached.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    client: reqwest::Client,
    config: ImageResolverConfig,
}

impl ImageResolver {
    pub fn new(client: reqwest::Client, config: ImageResolverConfig) -> Self {
        Self { client, config }
    }

    /// An empty payload, from a bare `data:...,` URI or an empty remote body,
    /// is an error: there is nothing to recognize.
    pub async fn resolve(&self, source: &str) -> Result<ImagePayload, ResolutionError> {
        let payload = match ImageSource::classify(source)? {
            ImageSource::DataUri(payload) | ImageSource::RawBase64(payload) => {
                ImagePayload::new(payload)
            }
            ImageSource::Remote(url) => self.fetch(url).await?,
        };
        if payload.as_base64().is_empty() {
            return Err(ResolutionError::EmptyPayload);
        }
        Ok(payload)
    }

    async fn fetch(&self, url: &str) -> Result<ImagePayload, ResolutionError> {
        debug!(url = %url, "Fetching remote image");
        let response = self
            .client
            .get(url)
            .timeout(self.config.fetch_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionError::Status { status });
        }

        let body = response.bytes().await?;
        debug!(url = %url, bytes = body.len(), "Fetched remote image");
        Ok(ImagePayload::new(BASE64_STANDARD.encode(&body)))
    }
}
