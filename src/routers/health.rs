use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::app_context::AppContext;

/// Per-collaborator status; the route itself always answers 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub server: &'static str,
    pub ollama: String,
    pub sd_webui: String,
    pub ocr: String,
}

/// `GET /health`
pub async fn health(State(ctx): State<Arc<AppContext>>) -> Json<HealthReport> {
    let (ollama, sd_webui, ocr) = tokio::join!(
        ctx.ollama.health_check(),
        ctx.image_gen.health_check(),
        ctx.ocr.health_check(),
    );

    Json(HealthReport {
        server: "ok",
        ollama: ollama.unwrap_or_else(|e| format!("error:{e}")),
        sd_webui: sd_webui.unwrap_or_else(|e| format!("error:{e}")),
        ocr,
    })
}
