//! Webhook ingestion: persist a raw alert and enqueue `process_alert`.
//!
//! Each route is a thin, identically-shaped wrapper that differs only in
//! `source`.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde_json::{Value as Json_, json};

use soar_core::{Alert, dedup_hash, Source};

use super::{require_webhook_key, AppState};
use crate::error::ServerError;

pub async fn email(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Json_>,
) -> Result<impl IntoResponse, ServerError> {
    ingest(&state, &headers, Source::Email, payload).await
}

pub async fn auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Json_>,
) -> Result<impl IntoResponse, ServerError> {
    ingest(&state, &headers, Source::Auth, payload).await
}

pub async fn network(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Json_>,
) -> Result<impl IntoResponse, ServerError> {
    ingest(&state, &headers, Source::Network, payload).await
}

async fn ingest(
    state: &AppState,
    headers: &HeaderMap,
    source: Source,
    payload: Json_,
) -> Result<impl IntoResponse, ServerError> {
    require_webhook_key(&state.config, headers)?;

    metrics::counter!("alerts_received_total", "source" => source.to_string()).increment(1);
    metrics::counter!("webhook_requests_total", "source" => source.to_string()).increment(1);

    let start = Instant::now();
    let hash = dedup_hash(source, &payload);
    let alert = Alert::new(source, payload, hash);
    let alert_id = alert.id;
    state.store.insert_alert(alert).await?;
    metrics::histogram!("webhook_db_write_latency_seconds", "source" => source.to_string())
        .record(start.elapsed().as_secs_f64());

    state.queue.enqueue_process_alert(alert_id);

    Ok((StatusCode::ACCEPTED, Json(json!({"alert_id": alert_id.to_string(), "case_id": Json_::Null}))))
}
