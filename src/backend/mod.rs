//! HTTP clients for the gateway's collaborators.
//!
//! - [`ollama`]: chat backend, model listing
//! - [`ocr`]: OCR sidecar used by message enrichment
//! - [`image_gen`]: Stable Diffusion WebUI txt2img

pub(crate) mod body;
pub mod image_gen;
pub mod ocr;
pub mod ollama;

pub use image_gen::{ImageGenError, StableDiffusionClient};
pub use ocr::OcrClient;
pub use ollama::{DeltaToken, OllamaClient, OllamaConfig, TokenStream, UpstreamError};
