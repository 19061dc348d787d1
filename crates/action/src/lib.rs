//! Durable action executor.
//!
//! [`ActionExecutor::run_action`] loads the case, inserts a pending
//! [`soar_core::Action`] row, runs exactly one of the closed set of handlers,
//! and marks the row terminal exactly once -- whether the handler succeeded,
//! failed with an `InputInvalid` condition, or panicked with an unexpected
//! error.

pub mod error;

pub use error::ActionError;

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value as Json};
use tracing::{info, instrument, warn};

use soar_blocklist::BlocklistStore;
use soar_core::{ActionId, ActionType, CaseId, EventType};
use soar_state::CaseStore;

/// The outcome of one `run_action` invocation.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub action_id: ActionId,
    pub ok: bool,
    pub result: Json,
}

/// Runs the closed set of response-action handlers against durable storage.
pub struct ActionExecutor {
    store: Arc<dyn CaseStore>,
    blocklist: Arc<BlocklistStore>,
}

impl ActionExecutor {
    #[must_use]
    pub fn new(store: Arc<dyn CaseStore>, blocklist: Arc<BlocklistStore>) -> Self {
        Self { store, blocklist }
    }

    /// Execute `action_type` against `case_id` with `params`.
    #[instrument(skip(self, params), fields(%case_id, %action_type))]
    pub async fn run_action(
        &self,
        case_id: CaseId,
        action_type: ActionType,
        params: Json,
    ) -> Result<ActionOutcome, ActionError> {
        let Some(case) = self.store.get_case(case_id).await? else {
            metrics::counter!("action_runs_total", "action_type" => action_type.to_string(), "success" => "false")
                .increment(1);
            return Err(ActionError::CaseNotFound(case_id.to_string()));
        };

        let started_at = Utc::now();
        let action = soar_core::Action::pending(case_id, action_type, params.clone(), started_at);
        let action_id = action.id;
        self.store.insert_action(action).await?;

        let (ok, result) = match self.execute_handler(action_type, &params, &case).await {
            Ok(result) => (true, result),
            Err(message) => (false, json!({"error": message, "params": params})),
        };

        let finished_at = Utc::now();
        self.store.finish_action(action_id, ok, result.clone(), finished_at).await?;

        self.store
            .append_timeline_event(
                case_id,
                EventType::Action,
                format!("action {action_type} {}", if ok { "succeeded" } else { "failed" }),
                json!({"action_id": action_id, "action_type": action_type.to_string(), "success": ok, "result": result}),
                finished_at,
            )
            .await?;

        metrics::counter!(
            "action_runs_total",
            "action_type" => action_type.to_string(),
            "success" => ok.to_string(),
        )
        .increment(1);

        if ok {
            info!(%action_id, "action completed");
        } else {
            warn!(%action_id, result = %result, "action failed");
        }

        Ok(ActionOutcome { action_id, ok, result })
    }

    async fn execute_handler(
        &self,
        action_type: ActionType,
        params: &Json,
        case: &soar_core::Case,
    ) -> Result<Json, String> {
        match action_type {
            ActionType::BlockDomain => {
                let domain = non_empty_str(params, "domain").ok_or("missing params.domain")?;
                let domain = domain.to_lowercase();
                self.blocklist
                    .block_domain(&domain)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(json!({"updated": true, "domain": domain}))
            }
            ActionType::BlockIp => {
                let ip = non_empty_str(params, "ip").ok_or("missing params.ip")?;
                self.blocklist.block_ip(ip).await.map_err(|e| e.to_string())?;
                Ok(json!({"updated": true, "ip": ip}))
            }
            ActionType::Notify => {
                let message = non_empty_str(params, "message")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Notification for case {}", case.id));
                Ok(json!({
                    "notified": true,
                    "message": message,
                    "meta": {
                        "case_id": case.id.to_string(),
                        "severity": case.severity.to_string(),
                        "score": case.score,
                        "type": case.r#type.to_string(),
                    },
                }))
            }
            ActionType::CreateTicket => {
                let summary = non_empty_str(params, "summary").map(str::to_string).unwrap_or_else(|| {
                    format!(
                        "[{}] Case {} (score={}) requires review",
                        case.severity.to_string().to_uppercase(),
                        case.id,
                        case.score
                    )
                });
                let ticket = soar_core::Ticket {
                    id: soar_core::TicketId::new(),
                    case_id: case.id,
                    external_ref: None,
                    summary: summary.clone(),
                    status: "open".to_string(),
                    created_at: Utc::now(),
                };
                let ticket_id = ticket.id;
                self.store.insert_ticket(ticket).await.map_err(|e| e.to_string())?;
                Ok(json!({"created": true, "ticket_id": ticket_id.to_string(), "summary": summary}))
            }
        }
    }
}

fn non_empty_str<'a>(params: &'a Json, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Json::as_str).map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use soar_core::{CaseType, Severity, Source};
    use soar_state::InMemoryCaseStore;

    async fn seeded_case(store: &InMemoryCaseStore) -> CaseId {
        let alert = soar_core::Alert::new(Source::Network, json!({}), "hash".to_string());
        store.insert_alert(alert.clone()).await.unwrap();
        let attach = store
            .attach_alert_to_case(alert.id, "hash", CaseType::Beacon, Utc::now())
            .await
            .unwrap();
        store
            .update_case_score(attach.case.id, 85, Severity::Critical, Utc::now())
            .await
            .unwrap();
        attach.case.id
    }

    #[tokio::test]
    async fn missing_case_fails_without_creating_an_action() {
        let store = Arc::new(InMemoryCaseStore::new());
        let blocklist = Arc::new(BlocklistStore::new(tempfile::tempdir().unwrap().path().join("bl.json")));
        let executor = ActionExecutor::new(store.clone(), blocklist);

        let err = executor
            .run_action(CaseId::new(), ActionType::Notify, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::CaseNotFound(_)));
    }

    #[tokio::test]
    async fn block_domain_lowercases_and_persists() {
        let store = Arc::new(InMemoryCaseStore::new());
        let dir = tempfile::tempdir().unwrap();
        let blocklist = Arc::new(BlocklistStore::new(dir.path().join("bl.json")));
        let case_id = seeded_case(&store).await;
        let executor = ActionExecutor::new(store.clone(), blocklist.clone());

        let outcome = executor
            .run_action(case_id, ActionType::BlockDomain, json!({"domain": "Evil.Example.com"}))
            .await
            .unwrap();
        assert!(outcome.ok);
        let (domains, _) = blocklist.snapshot().await;
        assert_eq!(domains, vec!["evil.example.com"]);

        let timeline = store.list_timeline(case_id).await.unwrap();
        assert!(timeline.iter().any(|e| e.event_type == EventType::Action));
    }

    #[tokio::test]
    async fn block_domain_without_param_fails_the_action_but_not_the_call() {
        let store = Arc::new(InMemoryCaseStore::new());
        let blocklist = Arc::new(BlocklistStore::new(tempfile::tempdir().unwrap().path().join("bl.json")));
        let case_id = seeded_case(&store).await;
        let executor = ActionExecutor::new(store.clone(), blocklist);

        let outcome = executor.run_action(case_id, ActionType::BlockDomain, json!({})).await.unwrap();
        assert!(!outcome.ok);
        assert_eq!(outcome.result["error"], "missing params.domain");
    }

    #[tokio::test]
    async fn create_ticket_defaults_summary_from_case() {
        let store = Arc::new(InMemoryCaseStore::new());
        let blocklist = Arc::new(BlocklistStore::new(tempfile::tempdir().unwrap().path().join("bl.json")));
        let case_id = seeded_case(&store).await;
        let executor = ActionExecutor::new(store.clone(), blocklist);

        let outcome = executor.run_action(case_id, ActionType::CreateTicket, json!({})).await.unwrap();
        assert!(outcome.ok);
        assert!(outcome.result["summary"].as_str().unwrap().starts_with("[CRITICAL]"));

        let tickets = store.list_tickets(case_id).await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].status, "open");
    }

    #[tokio::test]
    async fn notify_defaults_message_when_absent() {
        let store = Arc::new(InMemoryCaseStore::new());
        let blocklist = Arc::new(BlocklistStore::new(tempfile::tempdir().unwrap().path().join("bl.json")));
        let case_id = seeded_case(&store).await;
        let executor = ActionExecutor::new(store.clone(), blocklist);

        let outcome = executor.run_action(case_id, ActionType::Notify, json!({})).await.unwrap();
        assert!(outcome.ok);
        let msg = outcome.result["message"].as_str().unwrap();
        assert!(msg.starts_with("Notification for case"));
    }
}
