use std::sync::Arc;

use axum::{extract::State, Json};
use lmg_protocols::models::{ModelInfo, ModelList};
use tracing::warn;

use crate::{app_context::AppContext, backend::image_gen::IMAGE_GEN_MODEL_ID};

/// `GET /v1/models`: backend models plus the image-generation pseudo-model.
///
/// A backend failure is logged and yields only the pseudo-model.
pub async fn list_models(State(ctx): State<Arc<AppContext>>) -> Json<ModelList> {
    let owner = ctx.config.server_name.as_str();
    let names = ctx.ollama.list_models().await.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to list Ollama models");
        Vec::new()
    });

    let data = names
        .into_iter()
        .map(|name| ModelInfo::new(name, owner))
        .chain(std::iter::once(ModelInfo::new(IMAGE_GEN_MODEL_ID, owner)))
        .collect();
    Json(ModelList::new(data))
}
