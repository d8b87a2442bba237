use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    app_context::AppContext,
    routers::{health, images, models, openai},
};

/// All routes with request tracing and the inbound body limit applied.
pub fn build_app(ctx: Arc<AppContext>) -> Router {
    let max_body_bytes = ctx.config.max_body_bytes;

    Router::new()
        .route("/v1/models", get(models::list_models))
        .route("/v1/chat/completions", post(openai::chat::chat_completions))
        .route("/v1/responses", post(openai::responses::create_response))
        .route("/v1/images/generations", post(images::generate_images))
        .route("/health", get(health::health))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Bind and serve until Ctrl-C or SIGTERM.
pub async fn serve(ctx: Arc<AppContext>) -> anyhow::Result<()> {
    let addr = ctx.config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        addr = %addr,
        ollama = %ctx.config.ollama_url,
        num_ctx = ctx.config.ollama_num_ctx,
        "{} listening",
        ctx.config.server_name
    );

    axum::serve(listener, build_app(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
