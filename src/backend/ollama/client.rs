use std::time::Duration;

use lmg_multimodal::EnrichedMessage;
use lmg_protocols::ollama::{
    OllamaChatChunk, OllamaChatRequest, OllamaMessage, OllamaOptions, OllamaTagsResponse,
};
use tracing::{debug, info, warn};

use super::{
    error::UpstreamError,
    stream::{self, TokenStream},
};
use crate::{
    backend::body::{error_body, probe_status},
    config::base_url,
};

/// Sizes tried after the configured one, in order.
pub const CONTEXT_FALLBACKS: [u32; 3] = [65536, 32768, 8192];

/// Upper bound for listing and health probes.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// `[default, 65536, 32768, 8192]` with duplicates removed, first occurrence kept.
pub fn context_candidates(default: u32) -> Vec<u32> {
    let mut candidates = Vec::with_capacity(CONTEXT_FALLBACKS.len() + 1);
    for size in std::iter::once(default).chain(CONTEXT_FALLBACKS) {
        if !candidates.contains(&size) {
            candidates.push(size);
        }
    }
    candidates
}

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    /// Primary context size; the only one used for streaming.
    pub num_ctx: u32,
    /// Applies to non-streaming calls. Streams run until the backend finishes
    /// or the caller goes away.
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(client: reqwest::Client, config: OllamaConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", base_url(&self.config.base_url), path)
    }

    /// POST `/api/chat`; HTTP error statuses are turned into errors here.
    pub(super) async fn send_chat(
        &self,
        messages: &[EnrichedMessage],
        model: &str,
        num_ctx: u32,
        stream: bool,
    ) -> Result<reqwest::Response, UpstreamError> {
        let payload = OllamaChatRequest {
            model,
            messages: messages
                .iter()
                .map(|m| OllamaMessage {
                    role: &m.role,
                    content: &m.text,
                })
                .collect(),
            stream,
            options: OllamaOptions { num_ctx },
        };

        let mut request = self.client.post(self.url("/api/chat")).json(&payload);
        if !stream {
            request = request.timeout(self.config.request_timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = error_body(response).await;
            return Err(UpstreamError::Status { status, body });
        }
        Ok(response)
    }

    /// Non-streaming chat with context-size fallback.
    ///
    /// A reply obtained after the first candidate failed is prefixed with
    /// `"[ctx fallback to N]\n"`.
    pub async fn call_sync(
        &self,
        messages: &[EnrichedMessage],
        model: &str,
    ) -> Result<String, UpstreamError> {
        if model.is_empty() {
            return Err(UpstreamError::MissingModel);
        }

        let mut last_error = None;
        for (attempt, num_ctx) in context_candidates(self.config.num_ctx)
            .into_iter()
            .enumerate()
        {
            match self.chat_once(messages, model, num_ctx).await {
                Ok(text) if attempt == 0 => return Ok(text),
                Ok(text) => {
                    info!(
                        model = %model,
                        num_ctx,
                        attempt,
                        "Ollama chat succeeded after fallback"
                    );
                    return Ok(format!("[ctx fallback to {num_ctx}]\n{text}"));
                }
                Err(e) => {
                    warn!(model = %model, num_ctx, error = %e, "Ollama chat attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(UpstreamError::Exhausted {
            last: Box::new(last_error.unwrap_or(UpstreamError::MissingModel)),
        })
    }

    async fn chat_once(
        &self,
        messages: &[EnrichedMessage],
        model: &str,
        num_ctx: u32,
    ) -> Result<String, UpstreamError> {
        let response = self.send_chat(messages, model, num_ctx, false).await?;
        let body = response.bytes().await?;
        let reply: OllamaChatChunk = serde_json::from_slice(&body)?;
        debug!(model = %model, num_ctx, bytes = body.len(), "Ollama chat reply received");
        Ok(reply.text().to_string())
    }

    /// Streaming chat at the primary context size.
    ///
    /// Nothing is sent until the returned stream is first polled. Dropping the
    /// stream closes the backend connection.
    pub fn stream_chat(
        &self,
        messages: Vec<EnrichedMessage>,
        model: impl Into<String>,
    ) -> TokenStream {
        stream::open(self.clone(), messages, model.into())
    }

    /// Model names from `GET /api/tags`.
    pub async fn list_models(&self) -> Result<Vec<String>, UpstreamError> {
        let tags: OllamaTagsResponse = self
            .client
            .get(self.url("/api/tags"))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(tags.model_names())
    }

    pub async fn health_check(&self) -> Result<String, UpstreamError> {
        let response = self
            .client
            .get(self.url("/"))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await?;
        Ok(probe_status(response.status()))
    }
}
