use std::sync::Arc;

use lmg_multimodal::{EnrichmentPipeline, ImageResolver, ImageResolverConfig};

use crate::{
    backend::{OcrClient, OllamaClient, OllamaConfig, StableDiffusionClient},
    config::GatewayConfig,
};

/// Shared, immutable state handed to every route handler.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: GatewayConfig,
    pub ollama: OllamaClient,
    pub image_gen: StableDiffusionClient,
    pub ocr: Arc<OcrClient>,
    pub enrichment: EnrichmentPipeline,
}

impl AppContext {
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(config, client))
    }

    /// Build every collaborator client on top of one shared connection pool.
    pub fn with_client(config: GatewayConfig, client: reqwest::Client) -> Self {
        let ollama = OllamaClient::new(
            client.clone(),
            OllamaConfig {
                base_url: config.ollama_url.clone(),
                num_ctx: config.ollama_num_ctx,
                request_timeout: config.request_timeout(),
            },
        );
        let image_gen = StableDiffusionClient::new(
            client.clone(),
            config.sd_webui_url.clone(),
            config.request_timeout(),
        );
        let ocr = Arc::new(OcrClient::new(
            client.clone(),
            config.ocr_url.clone(),
            config.ocr_timeout(),
        ));
        let resolver = ImageResolver::new(
            client,
            ImageResolverConfig {
                fetch_timeout: config.image_fetch_timeout(),
            },
        );
        let enrichment = EnrichmentPipeline::new(Arc::new(resolver), ocr.clone());

        Self {
            config,
            ollama,
            image_gen,
            ocr,
            enrichment,
        }
    }
}
