//! Image generation (`/v1/images/generations`) and the txt2img backend payload.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validated::Normalizable;

pub const DEFAULT_IMAGE_SIZE: &str = "512x512";
pub const DEFAULT_IMAGE_DIMENSION: u32 = 512;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ImageGenerationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, message = "prompt is required for /v1/images/generations"))]
    pub prompt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl Normalizable for ImageGenerationRequest {
    fn normalize(&mut self) {
        if self.size.as_deref().map_or(true, str::is_empty) {
            self.size = Some(DEFAULT_IMAGE_SIZE.to_string());
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenerationResponse {
    pub created: i64,
    pub data: Vec<ImageData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    pub b64_json: String,
}

/// Request body for `POST /sdapi/v1/txt2img`.
#[derive(Debug, Clone, Serialize)]
pub struct Txt2ImgRequest<'a> {
    pub prompt: &'a str,
    pub steps: u32,
    pub cfg_scale: f64,
    pub width: u32,
    pub height: u32,
    pub sampler_name: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Txt2ImgResponse {
    #[serde(default)]
    pub images: Vec<String>,
}

/// Parse a `"WIDTHxHEIGHT"` size; missing or invalid sides default to 512.
pub fn parse_image_size(size: &str) -> (u32, u32) {
    let lowered = size.to_ascii_lowercase();
    let mut sides = lowered.split('x');
    match (sides.next(), sides.next(), sides.next()) {
        (Some(w), Some(h), None) => (parse_side(w), parse_side(h)),
        _ => (DEFAULT_IMAGE_DIMENSION, DEFAULT_IMAGE_DIMENSION),
    }
}

fn parse_side(side: &str) -> u32 {
    side.parse::<u32>()
        .ok()
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_IMAGE_DIMENSION)
}
