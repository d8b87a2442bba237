//! Mock collaborators and request helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use http_body_util::BodyExt;
use lmg::{app_context::AppContext, config::GatewayConfig, server::build_app};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Address nothing listens on.
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

// ============================================================================
// Ollama
// ============================================================================

/// How the mock backend answers `/api/chat`.
#[derive(Debug, Clone, Default)]
pub struct OllamaScript {
    /// Non-streaming reply text.
    pub reply: String,
    /// Context sizes answered with HTTP 500.
    pub fail_num_ctx: Vec<u32>,
    /// Streaming body, joined with newlines.
    pub stream_lines: Vec<String>,
    /// Model names served by `/api/tags`.
    pub models: Vec<String>,
}

impl OllamaScript {
    pub fn reply(text: &str) -> Self {
        Self {
            reply: text.to_string(),
            ..Self::default()
        }
    }

    pub fn streaming(lines: &[&str]) -> Self {
        Self {
            stream_lines: lines.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }
}

struct OllamaState {
    script: OllamaScript,
    requests: Arc<Mutex<Vec<Value>>>,
}

pub struct MockOllama {
    pub url: String,
    pub requests: Arc<Mutex<Vec<Value>>>,
}

impl MockOllama {
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().clone()
    }

    pub fn num_ctx_sent(&self) -> Vec<u64> {
        self.requests()
            .iter()
            .filter_map(|r| r["options"]["num_ctx"].as_u64())
            .collect()
    }
}

async fn ollama_chat(State(state): State<Arc<OllamaState>>, Json(body): Json<Value>) -> Response {
    state.requests.lock().push(body.clone());

    let num_ctx = body["options"]["num_ctx"].as_u64().unwrap_or_default() as u32;
    if state.script.fail_num_ctx.contains(&num_ctx) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "context too large").into_response();
    }

    if body["stream"] == true {
        return Response::builder()
            .header(header::CONTENT_TYPE, "application/x-ndjson")
            .body(Body::from(state.script.stream_lines.join("\n")))
            .unwrap();
    }

    Json(json!({
        "model": body["model"],
        "message": {"role": "assistant", "content": state.script.reply},
        "done": true
    }))
    .into_response()
}

async fn ollama_tags(State(state): State<Arc<OllamaState>>) -> Json<Value> {
    let models: Vec<Value> = state
        .script
        .models
        .iter()
        .map(|name| json!({"name": name, "size": 1}))
        .collect();
    Json(json!({ "models": models }))
}

pub async fn spawn_ollama(script: OllamaScript) -> MockOllama {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = Arc::new(OllamaState {
        script,
        requests: requests.clone(),
    });
    let router = Router::new()
        .route("/", get(|| async { "Ollama is running" }))
        .route("/api/chat", post(ollama_chat))
        .route("/api/tags", get(ollama_tags))
        .with_state(state);

    MockOllama {
        url: serve(router).await,
        requests,
    }
}

// ============================================================================
// OCR
// ============================================================================

pub struct MockOcr {
    /// Base URL; the upload endpoint is `<url>/ocr`.
    pub url: String,
    pub uploads: Arc<Mutex<Vec<Bytes>>>,
}

impl MockOcr {
    pub fn ocr_url(&self) -> String {
        format!("{}/ocr", self.url)
    }
}

pub async fn spawn_ocr(text: &'static str) -> MockOcr {
    let uploads = Arc::new(Mutex::new(Vec::new()));
    let recorded = uploads.clone();
    let router = Router::new()
        .route(
            "/ocr",
            post(move |body: Bytes| {
                let recorded = recorded.clone();
                async move {
                    recorded.lock().push(body);
                    Json(json!({ "text": text }))
                }
            }),
        )
        .route("/health", get(|| async { "ok" }));

    MockOcr {
        url: serve(router).await,
        uploads,
    }
}

// ============================================================================
// Stable Diffusion
// ============================================================================

pub struct MockStableDiffusion {
    pub url: String,
    pub requests: Arc<Mutex<Vec<Value>>>,
}

pub async fn spawn_stable_diffusion(image_b64: &'static str) -> MockStableDiffusion {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();
    let router = Router::new()
        .route(
            "/sdapi/v1/txt2img",
            post(move |Json(body): Json<Value>| {
                let recorded = recorded.clone();
                async move {
                    recorded.lock().push(body);
                    Json(json!({ "images": [image_b64], "parameters": {} }))
                }
            }),
        )
        .route(
            "/sdapi/v1/sd-models",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "loading") }),
        );

    MockStableDiffusion {
        url: serve(router).await,
        requests,
    }
}

// ============================================================================
// Gateway
// ============================================================================

pub fn gateway_config(ollama_url: &str, ocr_url: &str, sd_url: &str) -> GatewayConfig {
    GatewayConfig {
        ollama_url: ollama_url.to_string(),
        ocr_url: ocr_url.to_string(),
        sd_webui_url: sd_url.to_string(),
        ollama_num_ctx: 8192,
        server_name: "TestMux".to_string(),
        ..GatewayConfig::default()
    }
}

pub fn gateway(config: GatewayConfig) -> Router {
    build_app(Arc::new(AppContext::with_client(
        config,
        reqwest::Client::new(),
    )))
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Bytes) {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: impl Into<Body>) -> (StatusCode, Bytes) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap();
    send(app, request).await
}

pub async fn get_path(app: Router, uri: &str) -> (StatusCode, Bytes) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

pub fn json_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap()
}

/// `data:` payloads of an SSE body, in order.
pub fn sse_payloads(body: &Bytes) -> Vec<String> {
    std::str::from_utf8(body)
        .unwrap()
        .split("\n\n")
        .filter_map(|event| event.strip_prefix("data: "))
        .map(str::to_string)
        .collect()
}
