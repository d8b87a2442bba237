use std::time::Duration;

use lmg_protocols::images::{parse_image_size, Txt2ImgRequest, Txt2ImgResponse};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

use super::body::{error_body, probe_status};
use crate::config::base_url;

/// Pseudo-model id that routes chat requests to image generation.
pub const IMAGE_GEN_MODEL_ID: &str = "stable-diffusion-webui-txt2img";

const TXT2IMG_STEPS: u32 = 25;
const TXT2IMG_CFG_SCALE: f64 = 7.0;
const TXT2IMG_SAMPLER: &str = "Euler a";
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ImageGenError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("Stable Diffusion error: HTTP {}: {}", .status.as_u16(), .body)]
    Status { status: StatusCode, body: String },
    #[error("No image returned by Stable Diffusion")]
    NoImage,
}

/// Stable Diffusion WebUI client.
#[derive(Debug, Clone)]
pub struct StableDiffusionClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl StableDiffusionClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", base_url(&self.base_url), path)
    }

    /// Generate one image and return it base64-encoded.
    pub async fn txt2img(&self, prompt: &str, size: &str) -> Result<String, ImageGenError> {
        let (width, height) = parse_image_size(size);
        let payload = Txt2ImgRequest {
            prompt,
            steps: TXT2IMG_STEPS,
            cfg_scale: TXT2IMG_CFG_SCALE,
            width,
            height,
            sampler_name: TXT2IMG_SAMPLER,
        };
        debug!(width, height, "Requesting txt2img");

        let response = self
            .client
            .post(self.url("/sdapi/v1/txt2img"))
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = error_body(response).await;
            return Err(ImageGenError::Status { status, body });
        }

        let reply: Txt2ImgResponse = response.json().await?;
        reply.images.into_iter().next().ok_or(ImageGenError::NoImage)
    }

    pub async fn health_check(&self) -> Result<String, ImageGenError> {
        let response = self
            .client
            .get(self.url("/sdapi/v1/sd-models"))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await?;
        Ok(probe_status(response.status()))
    }
}
