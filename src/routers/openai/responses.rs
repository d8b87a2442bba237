use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use lmg_protocols::{
    responses::{ResponseObject, ResponsesRequest},
    ValidatedJson,
};
use tracing::{debug, error};

use super::{created_timestamp, generate_id, RESPONSE_ID_PREFIX};
use crate::{
    app_context::AppContext,
    routers::{
        error as router_error,
        streaming::{streaming_response, FramingMode, StreamTranscoder},
    },
};

/// `POST /v1/responses`
pub async fn create_response(
    State(ctx): State<Arc<AppContext>>,
    ValidatedJson(request): ValidatedJson<ResponsesRequest>,
) -> Response {
    let conversation = request.conversation();
    let enriched = ctx.enrichment.enrich(&conversation).await;
    let id = generate_id(RESPONSE_ID_PREFIX);
    let created = created_timestamp();
    debug!(
        model = %request.model,
        messages = enriched.len(),
        stream = request.is_stream(),
        "Responses request"
    );

    if request.is_stream() {
        let tokens = ctx.ollama.stream_chat(enriched, request.model.as_str());
        let transcoder =
            StreamTranscoder::new(FramingMode::Cumulative, id, created, request.model);
        return streaming_response(tokens, transcoder);
    }

    match ctx.ollama.call_sync(&enriched, &request.model).await {
        Ok(text) => {
            Json(ResponseObject::assistant_text(id, created, request.model, text)).into_response()
        }
        Err(e) => {
            error!(model = %request.model, error = %e, "Response generation failed");
            router_error::internal_error("upstream_error", e.to_string())
        }
    }
}
