//! Gateway configuration.
//!
//! Loaded once at startup from flags with environment fallbacks, then shared
//! read-only by every component.

use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use clap::Parser;

pub const DEFAULT_OLLAMA_URL: &str = "http://192.168.1.88:11434";
pub const DEFAULT_SD_WEBUI_URL: &str = "http://192.168.122.1:7860";
pub const DEFAULT_OCR_URL: &str = "http://192.168.122.1:5055/ocr";
pub const DEFAULT_SERVER_NAME: &str = "LlamaMux";
pub const DEFAULT_NUM_CTX: u32 = 8192;
pub const DEFAULT_LISTEN_ADDR: &str = ":8001";

#[derive(Debug, Clone, Parser)]
#[command(name = "lmg", version, about = "OpenAI-compatible gateway for a local Ollama backend")]
pub struct GatewayConfig {
    /// Base URL of the Ollama backend.
    #[arg(long, env = "OLLAMA_URL", default_value = DEFAULT_OLLAMA_URL)]
    pub ollama_url: String,

    /// Base URL of the Stable Diffusion WebUI.
    #[arg(long, env = "SD_WEBUI_URL", default_value = DEFAULT_SD_WEBUI_URL)]
    pub sd_webui_url: String,

    /// Full URL of the OCR upload endpoint.
    #[arg(long, env = "OCR_URL", default_value = DEFAULT_OCR_URL)]
    pub ocr_url: String,

    /// Reported as `owned_by` in the model listing.
    #[arg(long, env = "SERVER_NAME", default_value = DEFAULT_SERVER_NAME)]
    pub server_name: String,

    /// Primary context size sent as `options.num_ctx`.
    #[arg(long, env = "OLLAMA_NUM_CTX", default_value_t = DEFAULT_NUM_CTX)]
    pub ollama_num_ctx: u32,

    /// Listen address; `:8001` binds all interfaces.
    #[arg(long, env = "LLAMAMUX_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: String,

    /// Timeout for backend chat and image generation calls.
    #[arg(long, default_value_t = 180)]
    pub request_timeout_secs: u64,

    #[arg(long, default_value_t = 60)]
    pub ocr_timeout_secs: u64,

    #[arg(long, default_value_t = 30)]
    pub image_fetch_timeout_secs: u64,

    /// Maximum inbound request body.
    #[arg(long, default_value_t = 64 * 1024 * 1024)]
    pub max_body_bytes: usize,

    /// Log filter, overridden by `RUST_LOG` when set.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            sd_webui_url: DEFAULT_SD_WEBUI_URL.to_string(),
            ocr_url: DEFAULT_OCR_URL.to_string(),
            server_name: DEFAULT_SERVER_NAME.to_string(),
            ollama_num_ctx: DEFAULT_NUM_CTX,
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            request_timeout_secs: 180,
            ocr_timeout_secs: 60,
            image_fetch_timeout_secs: 30,
            max_body_bytes: 64 * 1024 * 1024,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl GatewayConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_secs(self.ocr_timeout_secs)
    }

    pub fn image_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.image_fetch_timeout_secs)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = normalize_listen_addr(&self.listen_addr);
        addr.parse()
            .with_context(|| format!("invalid listen address '{}'", self.listen_addr))
    }
}

/// `":8001"` means every interface.
fn normalize_listen_addr(addr: &str) -> String {
    let addr = addr.trim();
    match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => addr.to_string(),
    }
}

/// Strip trailing slashes so paths can be appended with `format!`.
pub(crate) fn base_url(url: &str) -> &str {
    url.trim_end_matches('/')
}
