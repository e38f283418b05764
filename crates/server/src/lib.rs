//! Domain pack server
//!
//! HTTP endpoints for validating, uploading and listing domain packs and
//! for interpreting change requests against them.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::{init_metrics, record_intent, record_upload, record_validation};
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domain_pack_persistence::PersistenceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::UnsupportedFile(_) => StatusCode::BAD_REQUEST,
            ServerError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::UnsupportedFile(_) => "unsupported_file",
            ServerError::Persistence(_) => "persistence_error",
        }
    }
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        err.status()
    }
}

impl From<PersistenceError> for ServerError {
    fn from(err: PersistenceError) -> Self {
        ServerError::Persistence(err.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = Json(serde_json::json!({
            "error": self.code(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
