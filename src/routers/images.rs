use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use lmg_protocols::{
    images::{ImageData, ImageGenerationRequest, ImageGenerationResponse, DEFAULT_IMAGE_SIZE},
    ValidatedJson,
};
use tracing::error;

use crate::{
    app_context::AppContext,
    routers::{error as router_error, openai::created_timestamp},
};

/// `POST /v1/images/generations`
pub async fn generate_images(
    State(ctx): State<Arc<AppContext>>,
    ValidatedJson(request): ValidatedJson<ImageGenerationRequest>,
) -> Response {
    let size = request.size.as_deref().unwrap_or(DEFAULT_IMAGE_SIZE);
    match ctx.image_gen.txt2img(&request.prompt, size).await {
        Ok(b64_json) => Json(ImageGenerationResponse {
            created: created_timestamp(),
            data: vec![ImageData { b64_json }],
        })
        .into_response(),
        Err(e) => {
            error!(size = %size, error = %e, "Image generation failed");
            router_error::internal_error("image_generation_failed", e.to_string())
        }
    }
}
