use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use lmg_multimodal::first_text;
use lmg_protocols::{
    chat::{ChatCompletionRequest, ChatCompletionResponse},
    images::DEFAULT_IMAGE_SIZE,
    ValidatedJson,
};
use tracing::{debug, error, info};

use super::{created_timestamp, generate_id, CHAT_ID_PREFIX};
use crate::{
    app_context::AppContext,
    backend::image_gen::IMAGE_GEN_MODEL_ID,
    routers::{
        error as router_error,
        streaming::{streaming_response, FramingMode, StreamTranscoder},
    },
};

/// `POST /v1/chat/completions`
pub async fn chat_completions(
    State(ctx): State<Arc<AppContext>>,
    ValidatedJson(request): ValidatedJson<ChatCompletionRequest>,
) -> Response {
    if request.model == IMAGE_GEN_MODEL_ID {
        return image_chat(&ctx, &request).await;
    }

    let enriched = ctx.enrichment.enrich(&request.messages).await;
    let id = generate_id(CHAT_ID_PREFIX);
    let created = created_timestamp();
    debug!(
        model = %request.model,
        messages = enriched.len(),
        stream = request.is_stream(),
        "Chat completion request"
    );

    if request.is_stream() {
        let tokens = ctx.ollama.stream_chat(enriched, request.model.as_str());
        let transcoder = StreamTranscoder::new(FramingMode::Delta, id, created, request.model);
        return streaming_response(tokens, transcoder);
    }

    match ctx.ollama.call_sync(&enriched, &request.model).await {
        Ok(content) => Json(ChatCompletionResponse::assistant_reply(
            id,
            created,
            request.model,
            content,
        ))
        .into_response(),
        Err(e) => {
            error!(model = %request.model, error = %e, "Chat completion failed");
            router_error::internal_error("upstream_error", e.to_string())
        }
    }
}

/// Chat requests addressed to the image-generation pseudo-model.
///
/// The prompt is the first text of the last message; the reply embeds the
/// image as a Markdown data URI.
async fn image_chat(ctx: &AppContext, request: &ChatCompletionRequest) -> Response {
    let prompt = request
        .messages
        .last()
        .and_then(|message| first_text(&message.content))
        .unwrap_or_default();
    if prompt.trim().is_empty() {
        return router_error::bad_request("empty_prompt", "prompt is empty for image generation");
    }

    info!(model = %request.model, "Routing chat request to image generation");
    match ctx.image_gen.txt2img(&prompt, DEFAULT_IMAGE_SIZE).await {
        Ok(b64) => Json(ChatCompletionResponse::assistant_reply(
            generate_id(CHAT_ID_PREFIX),
            created_timestamp(),
            request.model.as_str(),
            format!("![generated image](data:image/png;base64,{b64})"),
        ))
        .into_response(),
        Err(e) => {
            error!(model = %request.model, error = %e, "Image generation failed");
            router_error::internal_error("image_generation_failed", e.to_string())
        }
    }
}
