//! HTTP Endpoints
//!
//! REST API for domain pack validation, storage and intent interpretation.

use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Json, Multipart, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use domain_pack_config::DomainConfigDocument;
use domain_pack_core::ValidationVerdict;
use domain_pack_intent::{IntentContext, InterpretationVerdict};
use domain_pack_llm::LlmProviderConfig;
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::metrics::{metrics_handler, record_intent, record_upload, record_validation};
use crate::state::AppState;
use crate::ServerError;

const FALLBACK_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let timeout = Duration::from_secs(server.timeout_seconds);
    let body_limit = server.max_upload_bytes;

    Router::new()
        .route("/validate", post(validate_pack))
        .route("/upload", post(upload_pack))
        .route("/domain_pack_list", get(list_packs))
        .route("/intent", post(interpret_intent))
        .route("/intent/health", get(intent_health))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

/// CORS from configured origins
///
/// Disabled CORS is permissive. No usable origin falls back to
/// `localhost:3000`.
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    let parsed_origins = if parsed_origins.is_empty() {
        tracing::info!("No usable CORS origins configured, defaulting to {}", FALLBACK_ORIGIN);
        vec![HeaderValue::from_static(FALLBACK_ORIGIN)]
    } else {
        tracing::info!("CORS configured with {} origins", parsed_origins.len());
        parsed_origins
    };

    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Uploaded domain pack file
struct UploadedFile {
    filename: String,
    text: String,
}

fn is_yaml_filename(filename: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    lower.ends_with(".yaml") || lower.ends_with(".yml")
}

fn unreadable(err: impl std::fmt::Display) -> ServerError {
    ServerError::InvalidRequest(format!("unreadable multipart body: {}", err))
}

/// Read the `file` field of a multipart body
async fn read_file(multipart: &mut Multipart) -> Result<UploadedFile, ServerError> {
    while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if !is_yaml_filename(&filename) {
            return Err(ServerError::UnsupportedFile(format!(
                "'{}' is not a .yaml or .yml file",
                filename
            )));
        }
        let bytes = field.bytes().await.map_err(unreadable)?;
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|_| ServerError::InvalidRequest("file is not valid UTF-8".to_string()))?;
        return Ok(UploadedFile { filename, text });
    }
    Err(ServerError::InvalidRequest(
        "multipart field 'file' is required".to_string(),
    ))
}

/// `POST /validate`
async fn validate_pack(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ValidationVerdict>, ServerError> {
    let file = read_file(&mut multipart).await?;
    let verdict = state.pipeline.validate(&file.text);
    record_validation("validate", &verdict);
    tracing::info!(filename = %file.filename, summary = %verdict.summary(), "Validated domain pack");
    Ok(Json(verdict))
}

/// `POST /upload`
async fn upload_pack(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ServerError> {
    let file = read_file(&mut multipart).await?;
    let outcome = state.pipeline.validate_document(&file.text);
    record_validation("upload", &outcome.verdict);

    let validated = match outcome.into_validated() {
        Ok(validated) => validated,
        Err(verdict) => {
            record_upload("rejected");
            tracing::info!(filename = %file.filename, summary = %verdict.summary(), "Upload rejected");
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(verdict)).into_response());
        }
    };

    let record = state.builder.build(&file.text, &validated, &file.filename);
    let metadata = record.metadata.clone();
    let sections_count = record.sections_count;
    let document_id = match state.store.insert(record).await {
        Ok(id) => id,
        Err(e) => {
            record_upload("failed");
            return Err(e.into());
        }
    };
    record_upload("stored");
    tracing::info!(document_id = %document_id, name = %metadata.name, "Domain pack uploaded");

    let message = format!("Domain pack '{}' uploaded successfully", metadata.name);
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "document_id": document_id,
            "filename": file.filename,
            "metadata": metadata,
            "sections_count": sections_count,
            "message": message,
        })),
    )
        .into_response())
}

#[derive(Debug, Serialize)]
struct DomainPackSummary {
    domain_pack_id: String,
    domain_name: String,
    description: String,
    uploaded_at: DateTime<Utc>,
}

/// `GET /domain_pack_list`
async fn list_packs(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ServerError> {
    let packs: Vec<DomainPackSummary> = state
        .store
        .list()
        .await?
        .into_iter()
        .map(|record| DomainPackSummary {
            domain_pack_id: record.identifier.unwrap_or_default(),
            domain_name: record.metadata.name,
            description: record.metadata.description,
            uploaded_at: record.uploaded_at,
        })
        .collect();

    Ok(Json(serde_json::json!({
        "total_count": packs.len(),
        "domain_packs": packs,
    })))
}

#[derive(Debug, Deserialize)]
struct IntentRequest {
    domain_pack_id: String,
    #[serde(default)]
    domain_name: String,
    #[serde(default)]
    description: String,
    user_request: String,
}

/// Stored pack for `domain_pack_id`, revalidated
async fn current_document(
    state: &AppState,
    domain_pack_id: &str,
) -> Result<Option<DomainConfigDocument>, ServerError> {
    let Some(record) = state.store.get(domain_pack_id).await? else {
        return Ok(None);
    };
    match state.pipeline.validate_document(&record.raw_text).into_validated() {
        Ok(validated) => Ok(Some(validated.into_document())),
        Err(verdict) => {
            tracing::warn!(
                domain_pack_id = %domain_pack_id,
                summary = %verdict.summary(),
                "Stored pack no longer validates; interpreting without it"
            );
            Ok(None)
        }
    }
}

/// `POST /intent`
async fn interpret_intent(
    State(state): State<AppState>,
    Json(request): Json<IntentRequest>,
) -> Result<Response, ServerError> {
    let context = IntentContext::new(
        request.domain_pack_id,
        request.domain_name,
        request.description,
        request.user_request,
    )
    .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;

    let context = match current_document(&state, &context.domain_pack_id).await? {
        Some(document) => context.with_document(document),
        None => context,
    };

    let verdict = match state.interpreter() {
        Ok(interpreter) => interpreter.interpret(&context).await,
        Err(err) => InterpretationVerdict::configuration_error(err),
    };
    record_intent(&verdict);

    let message = verdict.message();
    match verdict.intent {
        Some(intent) => Ok((
            StatusCode::OK,
            Json(serde_json::json!({
                "intent": intent,
                "message": message,
            })),
        )
            .into_response()),
        None => Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": verdict.kind.map(|kind| kind.as_str()),
                "message": message,
                "confidence": 0.0,
                "details": verdict.errors,
            })),
        )
            .into_response()),
    }
}

/// `GET /intent/health`; never calls the model
async fn intent_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let llm = &state.config.llm;
    let provider_config = LlmProviderConfig::from_settings(llm).ok();
    let api_key_configured = provider_config
        .as_ref()
        .is_some_and(LlmProviderConfig::has_api_key);

    let body = match state.interpreter() {
        Ok(interpreter) => serde_json::json!({
            "status": "healthy",
            "llm_provider": llm.provider,
            "llm_model": interpreter.model_name(),
            "api_key_configured": api_key_configured,
            "message": "Intent interpretation is available",
        }),
        Err(err) => serde_json::json!({
            "status": "degraded",
            "llm_provider": llm.provider,
            "llm_model": provider_config.map(|c| c.model).or_else(|| llm.model.clone()),
            "api_key_configured": api_key_configured,
            "message": err.to_string(),
        }),
    };
    Json(body)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "store": state.store.backend_name(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_pack_config::Settings;

    #[test]
    fn test_router_creation() {
        let state = AppState::new(Settings::default());
        let _ = create_router(state);
    }

    #[test]
    fn test_yaml_filenames() {
        assert!(is_yaml_filename("legal.yaml"));
        assert!(is_yaml_filename("LEGAL.YML"));
        assert!(!is_yaml_filename("legal.json"));
        assert!(!is_yaml_filename(""));
    }

    #[test]
    fn test_cors_layer_variants() {
        let _ = build_cors_layer(&[], true);
        let _ = build_cors_layer(&["https://packs.example.com".to_string()], true);
        let _ = build_cors_layer(&["not a header\n".to_string()], true);
        let _ = build_cors_layer(&[], false);
    }
}
