use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::report::ReportError;

/// Errors surfaced at the HTTP boundary. User-visible failures surface only
/// at the ingestion and admin boundaries (401 for bad keys, 404 for missing
/// entities); the asynchronous pipeline reports via the case timeline rather
/// than via HTTP.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InputInvalid(String),

    #[error(transparent)]
    Storage(#[from] soar_state::StateError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InputInvalid(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            Self::Storage(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::Report(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}
