//! Backends against a local stand-in for the provider APIs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use domain_pack_llm::{
    ClaudeBackend, ClaudeConfig, FinishReason, LlmBackend, LlmError, Message, OpenAIBackend,
    OpenAIConfig,
};
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<AtomicUsize>,
}

async fn chat(
    State(recorder): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    recorder.calls.fetch_add(1, Ordering::SeqCst);
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer good-key") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
    }
    let echoed = body["messages"][1]["content"].clone();
    (
        StatusCode::OK,
        Json(json!({
            "choices": [{
                "message": {"role": "assistant", "content": echoed},
                "finish_reason": "stop"
            }],
            "usage": {"completion_tokens": 7, "prompt_tokens": 20, "total_tokens": 27}
        })),
    )
}

async fn messages(State(recorder): State<Recorder>, Json(body): Json<Value>) -> Json<Value> {
    recorder.calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "content": [{"type": "text", "text": body["system"].clone()}],
        "stop_reason": "max_tokens",
        "usage": {"input_tokens": 3, "output_tokens": 2}
    }))
}

async fn serve() -> (String, Recorder) {
    let recorder = Recorder::default();
    let app = Router::new()
        .route("/v1/chat/completions", post(chat))
        .route("/v1/messages", post(messages))
        .with_state(recorder.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://127.0.0.1:{}", addr.port()), recorder)
}

fn conversation() -> Vec<Message> {
    vec![Message::system("Return JSON"), Message::user("add entity Judge")]
}

#[tokio::test]
async fn test_openai_compatible_round_trip() {
    let (base, recorder) = serve().await;
    let backend = OpenAIBackend::new(
        OpenAIConfig::groq("good-key", "llama-3.3-70b-versatile")
            .with_endpoint(format!("{}/v1", base)),
    )
    .unwrap();

    let result = backend.generate(&conversation()).await.unwrap();
    assert_eq!(result.text, "add entity Judge");
    assert_eq!(result.tokens, 7);
    assert_eq!(result.finish_reason, FinishReason::Stop);
    assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_api_error_is_not_retried() {
    let (base, recorder) = serve().await;
    let backend = OpenAIBackend::new(
        OpenAIConfig::openai("wrong-key", "gpt-4o-mini").with_endpoint(format!("{}/v1", base)),
    )
    .unwrap();

    let err = backend.generate(&conversation()).await.unwrap_err();
    match err {
        LlmError::Api(message) => assert!(message.starts_with("HTTP 401")),
        other => panic!("expected API error, got {:?}", other),
    }
    assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_claude_round_trip() {
    let (base, _) = serve().await;
    let backend =
        ClaudeBackend::new(ClaudeConfig::new("sk-ant").with_endpoint(base.as_str())).unwrap();

    let result = backend.generate(&conversation()).await.unwrap();
    assert_eq!(result.text, "Return JSON");
    assert_eq!(result.finish_reason, FinishReason::Length);
}

#[tokio::test]
async fn test_unreachable_provider_is_network_error() {
    let backend = OpenAIBackend::new(
        OpenAIConfig::openai("good-key", "gpt-4o-mini").with_endpoint("http://127.0.0.1:1/v1"),
    )
    .unwrap();
    let err = backend.generate(&conversation()).await.unwrap_err();
    assert!(matches!(err, LlmError::Network(_)), "{:?}", err);
}
