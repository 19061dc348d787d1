//! Admin operations (`X-Admin-Key`): trigger a response action out-of-band,
//! and close a case (generating its incident report and observing
//! time-to-contain).

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value as Json_, json};

use soar_core::{ActionType, CaseId, EventType};

use super::{require_admin_key, AppState};
use crate::error::ServerError;
use crate::report;

#[derive(Debug, Deserialize, Default)]
pub struct TriggerActionBody {
    #[serde(default)]
    pub params: Json_,
}

/// `POST /cases/{id}/actions/{action_type}` -- enqueue `run_action` and
/// return immediately.
pub async fn trigger_action(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((case_id, action_type)): Path<(String, String)>,
    body: Option<Json<TriggerActionBody>>,
) -> Result<impl IntoResponse, ServerError> {
    require_admin_key(&state.config, &headers)?;

    let case_id = CaseId::from_str(&case_id).map_err(|e| ServerError::InputInvalid(e.to_string()))?;
    let action_type =
        ActionType::from_str(&action_type).map_err(ServerError::InputInvalid)?;
    let params = body.map(|Json(b)| b.params).unwrap_or_default();

    state.queue.enqueue_run_action(case_id, action_type, params);

    // Synthetic correlation token: the in-process queue has no task-id
    // concept of its own.
    let task_id = uuid::Uuid::new_v4();
    Ok((StatusCode::ACCEPTED, Json(json!({"queued": true, "task_id": task_id.to_string()}))))
}

/// `POST /cases/{id}/close` -- transition the case to `closed`, render its
/// incident report, and observe `time_to_contain_seconds`.
pub async fn close_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(case_id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    require_admin_key(&state.config, &headers)?;
    let case_id = CaseId::from_str(&case_id).map_err(|e| ServerError::InputInvalid(e.to_string()))?;

    let now = Utc::now();
    let case = state
        .store
        .close_case(case_id, now)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("case {case_id} not found")))?;

    state
        .store
        .append_timeline_event(
            case_id,
            EventType::Close,
            "case closed".to_string(),
            json!({"closed_at": now.to_rfc3339()}),
            now,
        )
        .await?;

    let artifacts = state.store.list_artifacts(case_id).await?;
    let timeline = state.store.list_timeline(case_id).await?;
    let actions = state.store.list_actions(case_id).await?;
    let tickets = state.store.list_tickets(case_id).await?;
    let markdown = report::build_markdown(&case, &artifacts, &timeline, &actions, &tickets);
    let paths = report::write_files(&state.config.report_dir, case_id, &markdown, state.config.report_pdf)?;

    state
        .store
        .append_timeline_event(
            case_id,
            EventType::Report,
            "incident report generated".to_string(),
            json!({
                "markdown_path": paths.markdown_path.display().to_string(),
                "pdf_path": paths.pdf_path.as_ref().map(|p| p.display().to_string()),
            }),
            now,
        )
        .await?;

    let seconds = (now - case.created_at).num_milliseconds().max(0) as f64 / 1000.0;
    metrics::histogram!(
        "time_to_contain_seconds",
        "type" => case.r#type.to_string(),
        "severity" => case.severity.to_string(),
    )
    .record(seconds);

    Ok(Json(json!({
        "closed": true,
        "case_id": case_id.to_string(),
        "report": {
            "markdown_path": paths.markdown_path.display().to_string(),
            "pdf_path": paths.pdf_path.as_ref().map(|p| p.display().to_string()),
        },
        "markdown_preview": markdown,
    })))
}
