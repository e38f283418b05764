//! Prometheus metrics

use axum::http::StatusCode;
use axum::response::IntoResponse;
use domain_pack_core::ValidationVerdict;
use domain_pack_intent::InterpretationVerdict;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the global Prometheus recorder
///
/// Later calls return the handle installed by the first one.
pub fn init_metrics() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE
        .get_or_try_init(|| PrometheusBuilder::new().install_recorder())
        .map(Clone::clone)
        .map_err(|e| tracing::warn!(error = %e, "Failed to install Prometheus recorder"))
        .ok()
}

/// `GET /metrics`
pub async fn metrics_handler() -> impl IntoResponse {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}

pub fn record_validation(endpoint: &'static str, verdict: &ValidationVerdict) {
    let outcome = if verdict.is_valid { "valid" } else { "invalid" };
    metrics::counter!(
        "domain_pack_validations_total",
        "endpoint" => endpoint,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("domain_pack_validation_errors").record(verdict.errors.len() as f64);
}

pub fn record_upload(outcome: &'static str) {
    metrics::counter!("domain_pack_uploads_total", "outcome" => outcome).increment(1);
}

pub fn record_intent(verdict: &InterpretationVerdict) {
    let outcome = match verdict.kind {
        Some(kind) => kind.as_str(),
        None => "ACCEPTED",
    };
    metrics::counter!("domain_pack_intents_total", "outcome" => outcome).increment(1);
    metrics::histogram!("domain_pack_intent_model_calls").record(verdict.attempts as f64);
    metrics::histogram!("domain_pack_model_latency_seconds")
        .record(verdict.model_latency_ms as f64 / 1000.0);
}
