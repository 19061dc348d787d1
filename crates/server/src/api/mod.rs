pub mod admin;
pub mod health;
pub mod read;
pub mod webhook;

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{MatchedPath, Request};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

use soar_queue::TaskQueue;
use soar_state::CaseStore;

use crate::config::Config;
use crate::error::ServerError;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CaseStore>,
    pub queue: Arc<TaskQueue>,
    pub config: Arc<Config>,
    pub metrics_handle: PrometheusHandle,
}

/// Build the Axum router: webhook ingestion, admin operations, the read API,
/// and health/metrics, all under one `TraceLayer`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook/email", post(webhook::email))
        .route("/webhook/auth", post(webhook::auth))
        .route("/webhook/network", post(webhook::network))
        .route("/cases/{case_id}/actions/{action_type}", post(admin::trigger_action))
        .route("/cases/{case_id}/close", post(admin::close_case))
        .route("/alerts/{alert_id}", get(read::get_alert))
        .route("/cases", get(read::list_cases))
        .route("/cases/{case_id}", get(read::get_case))
        .route("/tickets/{ticket_id}", get(read::get_ticket))
        .route("/stats", get(read::stats))
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .layer(middleware::from_fn(observe_request))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Observes `api_request_latency_seconds{route,method,status}` for every
/// request. Uses the matched route pattern rather than the raw path so that
/// e.g. `/cases/{case_id}` doesn't create one series per id.
async fn observe_request(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let start = Instant::now();
    let response = next.run(request).await;
    let status = response.status().as_u16().to_string();

    metrics::histogram!(
        "api_request_latency_seconds",
        "route" => route,
        "method" => method,
        "status" => status,
    )
    .record(start.elapsed().as_secs_f64());

    response
}

/// `X-API-Key == webhook_api_key`.
pub(crate) fn require_webhook_key(config: &Config, headers: &HeaderMap) -> Result<(), ServerError> {
    require_key(headers, "x-api-key", &config.webhook_api_key)
}

/// `X-Admin-Key == admin_api_key`.
pub(crate) fn require_admin_key(config: &Config, headers: &HeaderMap) -> Result<(), ServerError> {
    require_key(headers, "x-admin-key", &config.admin_api_key)
}

fn require_key(headers: &HeaderMap, header_name: &str, expected: &str) -> Result<(), ServerError> {
    let provided = headers.get(header_name).and_then(|v| v.to_str().ok());
    if provided == Some(expected) {
        Ok(())
    } else {
        Err(ServerError::Unauthorized(format!("invalid {header_name}")))
    }
}
