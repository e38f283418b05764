//! Router smoke tests through `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use domain_pack_config::Settings;
use domain_pack_core::FixedClock;
use domain_pack_llm::{FinishReason, GenerationResult, LlmBackend, LlmError, Message};
use domain_pack_server::{create_router, AppState};
use serde_json::Value;
use tower::ServiceExt;

const PACK: &str = "name: Legal
description: Legal domain
version: 3.0.0
entities:
  - {name: Contract, type: DOCUMENT, attributes: [parties]}
  - {name: Party, type: ORGANIZATION, attributes: [name]}
relationships:
  - {name: binds, from: Contract, to: Party, attributes: []}
";

const BOUNDARY: &str = "domain-pack-test-boundary";

struct FixedReply(&'static str);

#[async_trait]
impl LlmBackend for FixedReply {
    async fn generate(&self, _messages: &[Message]) -> Result<GenerationResult, LlmError> {
        Ok(GenerationResult {
            text: self.0.to_string(),
            tokens: 0,
            total_time_ms: 1,
            finish_reason: FinishReason::Stop,
        })
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

/// Answers with `reply` after `delay`
struct SlowReply {
    delay: Duration,
    reply: &'static str,
}

#[async_trait]
impl LlmBackend for SlowReply {
    async fn generate(&self, _messages: &[Message]) -> Result<GenerationResult, LlmError> {
        tokio::time::sleep(self.delay).await;
        Ok(GenerationResult {
            text: self.reply.to_string(),
            tokens: 0,
            total_time_ms: self.delay.as_millis() as u64,
            finish_reason: FinishReason::Stop,
        })
    }

    fn model_name(&self) -> &str {
        "slow"
    }
}

struct FailingBackend;

#[async_trait]
impl LlmBackend for FailingBackend {
    async fn generate(&self, _messages: &[Message]) -> Result<GenerationResult, LlmError> {
        Err(LlmError::Api("HTTP 503: upstream unavailable".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.llm.provider = "groq".to_string();
    settings.llm.groq_api_key = String::new();
    settings
}

fn app() -> (AppState, Router) {
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap());
    let state = AppState::new(settings()).with_clock(Arc::new(clock));
    (state.clone(), create_router(state))
}

fn file_request(uri: &str, filename: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: application/x-yaml\r\n\r\n{c}\r\n--{b}--\r\n",
        b = BOUNDARY,
        f = filename,
        c = content
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_validate_reports_verdict() {
    let (_, router) = app();
    let (status, body) = send(&router, file_request("/validate", "legal.yaml", PACK)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_valid"], true);

    let broken = PACK.replace("to: Party", "to: Court");
    let (status, body) = send(&router, file_request("/validate", "legal.yml", &broken)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_valid"], false);
    assert_eq!(body["errors"][0]["kind"], "CROSS_REFERENCE_ERROR");
    assert_eq!(body["errors"][0]["path"], "relationships.0.to");
}

#[tokio::test]
async fn test_validate_rejects_non_yaml_filename() {
    let (_, router) = app();
    let (status, body) = send(&router, file_request("/validate", "legal.json", PACK)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unsupported_file");
}

#[tokio::test]
async fn test_upload_then_list() {
    let (_, router) = app();
    let (status, body) = send(&router, file_request("/upload", "legal.yaml", PACK)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["filename"], "legal.yaml");
    assert_eq!(body["metadata"]["name"], "Legal");
    assert_eq!(body["sections_count"], 2);
    let document_id = body["document_id"].as_str().unwrap().to_string();

    let (status, body) = send(&router, get("/domain_pack_list")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["domain_packs"][0]["domain_pack_id"], document_id.as_str());
    assert_eq!(body["domain_packs"][0]["domain_name"], "Legal");
    assert_eq!(body["domain_packs"][0]["uploaded_at"], "2024-06-01T08:00:00Z");
}

#[tokio::test]
async fn test_invalid_upload_is_not_stored() {
    let (state, router) = app();
    let (status, body) =
        send(&router, file_request("/upload", "legal.yaml", "name: Legal\n")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["is_valid"], false);
    assert!(state.store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_intent_without_provider_key() {
    let (_, router) = app();
    let request = serde_json::json!({
        "domain_pack_id": "p1",
        "domain_name": "Legal",
        "description": "Legal domain",
        "user_request": "Add a Judge entity",
    });
    let (status, body) = send(&router, json_request("/intent", request)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "LLM_CONFIGURATION_ERROR");
    assert_eq!(body["confidence"], 0.0);

    let (_, health) = send(&router, get("/intent/health")).await;
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["api_key_configured"], false);
    assert_eq!(health["llm_provider"], "groq");
}

#[tokio::test]
async fn test_intent_empty_request_is_bad_request() {
    let (_, router) = app();
    let request = serde_json::json!({"domain_pack_id": "p1", "user_request": "   "});
    let (status, body) = send(&router, json_request("/intent", request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_intent_checks_stored_pack() {
    let reply = r#"{"operation": "ADD", "target_section": "entities", "target_path": ["Contract"],
        "rationale": "Add contract", "payload": {"name": "Contract", "type": "DOCUMENT", "attributes": []}}"#;
    let (state, _) = app();
    let router = create_router(state.with_backend(Arc::new(FixedReply(reply))));

    let (_, uploaded) = send(&router, file_request("/upload", "legal.yaml", PACK)).await;
    let pack_id = uploaded["document_id"].as_str().unwrap().to_string();

    let fresh = serde_json::json!({"domain_pack_id": "unknown", "user_request": "Add Contract"});
    let (status, body) = send(&router, json_request("/intent", fresh)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"]["operation"], "ADD");
    assert_eq!(body["intent"]["domain_pack_id"], "unknown");

    let stored = serde_json::json!({"domain_pack_id": pack_id, "user_request": "Add Contract"});
    let (status, body) = send(&router, json_request("/intent", stored)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "LLM_OUTPUT_INVALID");
    assert_eq!(body["details"][0]["kind"], "SEMANTIC_COLLISION");
}

#[tokio::test]
async fn test_health_endpoints() {
    let (state, _) = app();
    let router = create_router(state.with_backend(Arc::new(FixedReply("{}"))));

    let (status, body) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");

    let (_, body) = send(&router, get("/intent/health")).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["llm_model"], "fixed");
}

fn intent_body() -> Value {
    serde_json::json!({
        "domain_pack_id": "p1",
        "domain_name": "Legal",
        "description": "Legal domain",
        "user_request": "Add a Judge entity",
    })
}

#[tokio::test]
async fn test_intent_rejects_persistent_garbage() {
    let (state, _) = app();
    let router = create_router(state.with_backend(Arc::new(FixedReply("not json"))));

    let (status, body) = send(&router, json_request("/intent", intent_body())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "LLM_OUTPUT_INVALID");
    assert_eq!(body["confidence"], 0.0);
    let details = body["details"].as_array().unwrap();
    assert!(!details.is_empty());
    assert_eq!(details[0]["kind"], "INTENT_SCHEMA_ERROR");
    assert!(body["message"].as_str().unwrap().contains("3 attempt(s)"));
}

#[tokio::test]
async fn test_intent_reports_provider_failure() {
    let (state, _) = app();
    let router = create_router(state.with_backend(Arc::new(FailingBackend)));

    let (status, body) = send(&router, json_request("/intent", intent_body())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "LLM_API_ERROR");
    assert!(body["details"][0]["message"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_slow_repairs_end_in_typed_rejection_before_request_timeout() {
    let mut settings = settings();
    settings.server.timeout_seconds = 1;
    let backend = SlowReply {
        delay: Duration::from_millis(600),
        reply: "not json",
    };
    let state = AppState::new(settings).with_backend(Arc::new(backend));
    let router = create_router(state);

    let (status, body) = send(&router, json_request("/intent", intent_body())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "LLM_API_ERROR");
    assert_eq!(body["confidence"], 0.0);
    assert!(body["details"][0]["message"].as_str().unwrap().contains("budget"));
}
