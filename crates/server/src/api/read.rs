//! Read-only query API: alert/case/ticket lookups plus the `/stats` rollup.

use std::collections::BTreeMap;
use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

use soar_core::{AlertId, CaseId, TicketId};
use soar_state::CaseFilter;

use super::AppState;
use crate::error::ServerError;

/// `GET /alerts/{id}`.
pub async fn get_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let alert_id = AlertId::from_str(&alert_id).map_err(|e| ServerError::InputInvalid(e.to_string()))?;
    let alert = state
        .store
        .get_alert(alert_id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("alert {alert_id} not found")))?;
    Ok(Json(json!({"alert": alert})))
}

#[derive(Debug, Deserialize, Default)]
pub struct CasesQuery {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub r#type: Option<String>,
    pub severity: Option<String>,
    pub limit: Option<usize>,
}

/// `GET /cases` -- filtered, most recently created first.
pub async fn list_cases(
    State(state): State<AppState>,
    Query(query): Query<CasesQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let filter = CaseFilter {
        status: query.status,
        r#type: query.r#type,
        severity: query.severity,
        limit: query.limit.unwrap_or(50).clamp(1, 200),
    };
    let cases = state.store.list_cases(filter).await?;
    Ok(Json(json!({"cases": cases})))
}

/// `GET /cases/{id}` -- the case plus every record it owns.
pub async fn get_case(
    State(state): State<AppState>,
    Path(case_id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let case_id = CaseId::from_str(&case_id).map_err(|e| ServerError::InputInvalid(e.to_string()))?;
    let case = state
        .store
        .get_case(case_id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("case {case_id} not found")))?;

    let artifacts = state.store.list_artifacts(case_id).await?;
    let timeline = state.store.list_timeline(case_id).await?;
    let actions = state.store.list_actions(case_id).await?;
    let tickets = state.store.list_tickets(case_id).await?;

    Ok(Json(json!({
        "case": case,
        "artifacts": artifacts,
        "timeline": timeline,
        "actions": actions,
        "tickets": tickets,
    })))
}

/// `GET /tickets/{id}`.
pub async fn get_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let ticket_id = TicketId::from_str(&ticket_id).map_err(|e| ServerError::InputInvalid(e.to_string()))?;
    let ticket = state
        .store
        .get_ticket(ticket_id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("ticket {ticket_id} not found")))?;
    Ok(Json(json!({"ticket": ticket})))
}

/// `GET /stats` -- case counts by status/type/severity plus the 10 most
/// recent cases.
pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, ServerError> {
    let all = state.store.list_cases(CaseFilter { limit: usize::MAX, ..Default::default() }).await?;

    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_severity: BTreeMap<String, usize> = BTreeMap::new();
    for case in &all {
        *by_status.entry(case.status.to_string()).or_default() += 1;
        *by_type.entry(case.r#type.to_string()).or_default() += 1;
        *by_severity.entry(case.severity.to_string()).or_default() += 1;
    }

    let total = all.len();
    let latest: Vec<_> = all.into_iter().take(10).collect();

    Ok(Json(json!({
        "totals": {"cases": total},
        "by_status": by_status,
        "by_type": by_type,
        "by_severity": by_severity,
        "latest_cases": latest,
    })))
}
