//! OCR sidecar client: multipart image upload, `{text}` reply.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use lmg_multimodal::{ImagePayload, OcrEngine, OcrError};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use super::body::{error_body, probe_status};

/// Reported when the sidecar cannot be reached at all.
pub const OCR_HEALTH_UNKNOWN: &str = "unknown";

#[derive(Debug, Default, Deserialize)]
struct OcrReply {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OcrClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl OcrClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }

    /// `.../ocr` is probed at `.../health`; any other URL is probed as is.
    pub fn health_url(&self) -> String {
        match self.url.strip_suffix("/ocr") {
            Some(base) => format!("{base}/health"),
            None => self.url.clone(),
        }
    }

    /// `"ok"`, `"bad:<code>"`, or `"unknown"` when unreachable.
    pub async fn health_check(&self) -> String {
        match self
            .client
            .get(self.health_url())
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => probe_status(response.status()),
            Err(e) => {
                debug!(error = %e, "OCR health probe failed");
                OCR_HEALTH_UNKNOWN.to_string()
            }
        }
    }
}

/// Line breaks inside the payload are ignored.
fn decode_payload(image: &ImagePayload) -> Result<Vec<u8>, OcrError> {
    let compact: String = image
        .as_base64()
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n'))
        .collect();
    Ok(BASE64_STANDARD.decode(compact.trim())?)
}

#[async_trait]
impl OcrEngine for OcrClient {
    async fn recognize(&self, image: &ImagePayload) -> Result<String, OcrError> {
        let bytes = decode_payload(image)?;
        debug!(bytes = bytes.len(), "Uploading image to OCR");

        let form = Form::new().part("file", Part::bytes(bytes).file_name("image.png"));
        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = error_body(response).await;
            return Err(OcrError::Status { status, body });
        }

        let reply: OcrReply = response.json().await?;
        Ok(reply.text.unwrap_or_default())
    }
}
