//! End-to-end tests for `/v1/chat/completions` against mock collaborators.

mod common;

use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use common::*;
use lmg::multimodal::IMAGE_OCR_MARKER;
use serde_json::{json, Value};

#[tokio::test]
async fn test_non_stream_reply_without_fallback_marker() {
    let ollama = spawn_ollama(OllamaScript::reply("Hello there")).await;
    let app = gateway(gateway_config(&ollama.url, UNREACHABLE_URL, UNREACHABLE_URL));

    let (status, body) = post_json(
        app,
        "/v1/chat/completions",
        json!({"model": "llama3", "messages": [{"role": "user", "content": "hi"}]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let reply = json_body(&body);
    assert_eq!(reply["object"], "chat.completion");
    assert_eq!(reply["model"], "llama3");
    assert!(reply["id"].as_str().unwrap().starts_with("chatcmpl_"));
    assert_eq!(reply["choices"][0]["message"]["role"], "assistant");
    assert_eq!(reply["choices"][0]["message"]["content"], "Hello there");
    assert_eq!(reply["choices"][0]["finish_reason"], "stop");

    assert_eq!(ollama.num_ctx_sent(), vec![8192]);
    let sent = ollama.requests()[0].clone();
    assert_eq!(sent["stream"], false);
    assert_eq!(sent["messages"], json!([{"role": "user", "content": "hi"}]));
}

#[tokio::test]
async fn test_context_fallback_marks_reply() {
    let ollama = spawn_ollama(OllamaScript {
        reply: "recovered".to_string(),
        fail_num_ctx: vec![8192],
        ..OllamaScript::default()
    })
    .await;
    let app = gateway(gateway_config(&ollama.url, UNREACHABLE_URL, UNREACHABLE_URL));

    let (status, body) = post_json(
        app,
        "/v1/chat/completions",
        json!({"model": "llama3", "messages": [{"content": "long prompt"}]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_body(&body)["choices"][0]["message"]["content"],
        "[ctx fallback to 65536]\nrecovered"
    );
    assert_eq!(ollama.num_ctx_sent(), vec![8192, 65536]);
    // Missing role defaults to user.
    assert_eq!(ollama.requests()[0]["messages"][0]["role"], "user");
}

#[tokio::test]
async fn test_exhausted_fallbacks_return_last_cause() {
    let ollama = spawn_ollama(OllamaScript {
        fail_num_ctx: vec![8192, 65536, 32768],
        ..OllamaScript::default()
    })
    .await;
    let app = gateway(gateway_config(&ollama.url, UNREACHABLE_URL, UNREACHABLE_URL));

    let (status, body) = post_json(
        app,
        "/v1/chat/completions",
        json!({"model": "llama3", "messages": []}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = json_body(&body);
    assert_eq!(
        error["error"]["message"],
        "Ollama error after ctx fallbacks: HTTP 500: context too large"
    );
    assert_eq!(error["error"]["type"], "server_error");
    assert_eq!(error["error"]["code"], "upstream_error");
    assert_eq!(ollama.num_ctx_sent(), vec![8192, 65536, 32768]);
}

#[tokio::test]
async fn test_malformed_json_never_reaches_backend() {
    let ollama = spawn_ollama(OllamaScript::reply("unused")).await;
    let app = gateway(gateway_config(&ollama.url, UNREACHABLE_URL, UNREACHABLE_URL));

    let (status, body) = post_raw(app, "/v1/chat/completions", "{\"model\": \"llama3\",").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = json_body(&body);
    assert_eq!(error["error"]["type"], "invalid_request_error");
    assert_eq!(error["error"]["code"], "json_parse_error");
    assert!(ollama.requests().is_empty());
}

#[tokio::test]
async fn test_missing_model_is_rejected() {
    let ollama = spawn_ollama(OllamaScript::reply("unused")).await;
    let app = gateway(gateway_config(&ollama.url, UNREACHABLE_URL, UNREACHABLE_URL));

    let (status, body) = post_json(
        app,
        "/v1/chat/completions",
        json!({"messages": [{"role": "user", "content": "hi"}]}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = json_body(&body)["error"]["message"].as_str().unwrap().to_string();
    assert!(message.contains("model is required for /v1/chat/completions"));
    assert!(ollama.requests().is_empty());
}

#[tokio::test]
async fn test_streaming_uses_delta_framing() {
    let ollama = spawn_ollama(OllamaScript::streaming(&[
        r#"{"message":{"content":"A"},"done":false}"#,
        r#"{"message":{"content":"B"},"done":false}"#,
        "",
        r#"{"message":{"content":"C"},"done":false}"#,
        r#"{"message":{"content":""},"done":true}"#,
    ]))
    .await;
    let app = gateway(gateway_config(&ollama.url, UNREACHABLE_URL, UNREACHABLE_URL));

    let (status, body) = post_json(
        app,
        "/v1/chat/completions",
        json!({"model": "llama3", "stream": true, "messages": [{"role": "user", "content": "abc"}]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let payloads = sse_payloads(&body);
    assert_eq!(payloads.len(), 5);
    assert_eq!(payloads[4], "[DONE]");

    let chunks: Vec<Value> = payloads[..4]
        .iter()
        .map(|p| serde_json::from_str(p).unwrap())
        .collect();
    let deltas: Vec<&Value> = chunks.iter().map(|c| &c["choices"][0]["delta"]).collect();
    assert_eq!(*deltas[0], json!({"role": "assistant", "content": "A"}));
    assert_eq!(*deltas[1], json!({"content": "B"}));
    assert_eq!(*deltas[2], json!({"content": "C"}));
    assert_eq!(*deltas[3], json!({}));
    assert_eq!(chunks[3]["choices"][0]["finish_reason"], "stop");
    assert!(chunks
        .iter()
        .all(|c| c["object"] == "chat.completion.chunk" && c["model"] == "llama3"));

    // Streaming uses the primary context size only.
    assert_eq!(ollama.num_ctx_sent(), vec![8192]);
    assert_eq!(ollama.requests()[0]["stream"], true);
}

#[tokio::test]
async fn test_stream_decoding_stops_at_done() {
    let ollama = spawn_ollama(OllamaScript::streaming(&[
        r#"{"message":{"content":"Hello"}}"#,
        r#"data: {"response":" world"}"#,
        r#"{"done":true}"#,
        r#"{"message":{"content":"never sent"}}"#,
    ]))
    .await;
    let app = gateway(gateway_config(&ollama.url, UNREACHABLE_URL, UNREACHABLE_URL));

    let (_, body) = post_json(
        app,
        "/v1/chat/completions",
        json!({"model": "llama3", "stream": true, "messages": []}),
    )
    .await;

    let contents: Vec<String> = sse_payloads(&body)
        .iter()
        .filter(|p| p.as_str() != "[DONE]")
        .filter_map(|p| {
            let chunk: Value = serde_json::from_str(p).unwrap();
            chunk["choices"][0]["delta"]["content"]
                .as_str()
                .map(str::to_string)
        })
        .collect();
    assert_eq!(contents, vec!["Hello", " world"]);
}

#[tokio::test]
async fn test_stream_backend_error_becomes_single_token() {
    let ollama = spawn_ollama(OllamaScript {
        fail_num_ctx: vec![8192],
        ..OllamaScript::default()
    })
    .await;
    let app = gateway(gateway_config(&ollama.url, UNREACHABLE_URL, UNREACHABLE_URL));

    let (status, body) = post_json(
        app,
        "/v1/chat/completions",
        json!({"model": "llama3", "stream": true, "messages": []}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let payloads = sse_payloads(&body);
    assert_eq!(payloads.len(), 3);
    let first: Value = serde_json::from_str(&payloads[0]).unwrap();
    assert_eq!(
        first["choices"][0]["delta"]["content"],
        "\n[Ollama streaming error: HTTP 500: context too large]\n"
    );
    assert_eq!(payloads[2], "[DONE]");
    // No fallback chain for streams.
    assert_eq!(ollama.num_ctx_sent(), vec![8192]);
}

#[tokio::test]
async fn test_stream_malformed_line_ends_stream() {
    let ollama = spawn_ollama(OllamaScript::streaming(&[
        r#"{"message":{"content":"ok"}}"#,
        "{broken",
        r#"{"message":{"content":"after"}}"#,
    ]))
    .await;
    let app = gateway(gateway_config(&ollama.url, UNREACHABLE_URL, UNREACHABLE_URL));

    let (_, body) = post_json(
        app,
        "/v1/responses",
        json!({"model": "llama3", "stream": true, "input": []}),
    )
    .await;

    let payloads = sse_payloads(&body);
    assert_eq!(payloads.len(), 3);
    let last: Value = serde_json::from_str(&payloads[1]).unwrap();
    let text = last["output"][0]["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("ok\n[Ollama streaming error: "));
    assert!(!text.contains("after"));
    assert_eq!(payloads[2], "[DONE]");
}

#[tokio::test]
async fn test_image_parts_are_replaced_by_ocr_text() {
    let ollama = spawn_ollama(OllamaScript::reply("It says cat")).await;
    let ocr = spawn_ocr("cat").await;
    let app = gateway(gateway_config(&ollama.url, &ocr.ocr_url(), UNREACHABLE_URL));
    let image = BASE64_STANDARD.encode(b"\x89PNG fake image");

    let (status, _) = post_json(
        app,
        "/v1/chat/completions",
        json!({
            "model": "llava",
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": "describe this"},
                    {"type": "image_url", "image_url": {"url": format!("data:image/png;base64,{image}")}}
                ]
            }]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let sent = ollama.requests()[0]["messages"][0].clone();
    assert_eq!(sent["role"], "user");
    assert_eq!(
        sent["content"],
        format!("describe this\n\n{IMAGE_OCR_MARKER}\ncat")
    );

    let uploads = ocr.uploads.lock();
    assert_eq!(uploads.len(), 1);
    let upload = String::from_utf8_lossy(&uploads[0]);
    assert!(upload.contains("name=\"file\""));
    assert!(upload.contains("filename=\"image.png\""));
    assert!(upload.contains("PNG fake image"));
}

#[tokio::test]
async fn test_unreachable_ocr_does_not_fail_request() {
    let ollama = spawn_ollama(OllamaScript::reply("fine")).await;
    let app = gateway(gateway_config(&ollama.url, UNREACHABLE_URL, UNREACHABLE_URL));

    let (status, _) = post_json(
        app,
        "/v1/chat/completions",
        json!({
            "model": "llava",
            "messages": [{"content": [
                {"type": "image", "url": "QUJD"},
                {"type": "image", "url": "not an image"}
            ]}]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let content = ollama.requests()[0]["messages"][0]["content"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(content.starts_with("[Image OCR]\n[OCR error: "));
    assert!(content.ends_with("\n\n[OCR could not read the image]"));
}

#[tokio::test]
async fn test_image_model_routes_to_stable_diffusion() {
    let ollama = spawn_ollama(OllamaScript::reply("unused")).await;
    let sd = spawn_stable_diffusion("aW1hZ2U=").await;
    let app = gateway(gateway_config(&ollama.url, UNREACHABLE_URL, &sd.url));

    let (status, body) = post_json(
        app,
        "/v1/chat/completions",
        json!({
            "model": "stable-diffusion-webui-txt2img",
            "messages": [
                {"role": "user", "content": "ignored"},
                {"role": "user", "content": [{"type": "text", "text": "a red fox"}]}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_body(&body)["choices"][0]["message"]["content"],
        "![generated image](data:image/png;base64,aW1hZ2U=)"
    );
    let sent = sd.requests.lock()[0].clone();
    assert_eq!(sent["prompt"], "a red fox");
    assert_eq!(sent["steps"], 25);
    assert_eq!(sent["width"], 512);
    assert_eq!(sent["sampler_name"], "Euler a");
    assert!(ollama.requests().is_empty());
}

#[tokio::test]
async fn test_image_model_rejects_empty_prompt() {
    let sd = spawn_stable_diffusion("aW1hZ2U=").await;
    let app = gateway(gateway_config(UNREACHABLE_URL, UNREACHABLE_URL, &sd.url));

    let (status, body) = post_json(
        app,
        "/v1/chat/completions",
        json!({
            "model": "stable-diffusion-webui-txt2img",
            "messages": [{"role": "user", "content": "   "}]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = json_body(&body);
    assert_eq!(error["error"]["message"], "prompt is empty for image generation");
    assert_eq!(error["error"]["type"], "invalid_request_error");
    assert_eq!(error["error"]["code"], "empty_prompt");
    assert!(sd.requests.lock().is_empty());
}
