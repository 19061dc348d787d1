//! Playbook orchestrator.
//!
//! [`Orchestrator::process_alert`] runs the per-alert pipeline: load the
//! alert, run the case-attachment protocol, append an `ingest` timeline
//! event, dispatch to the playbook matching the alert's source (extraction,
//! enrichment, and scoring wired together per playbook), and -- once the
//! case has a fresh score -- enqueue the auto-response actions the policy
//! below calls for.

mod beacon;
pub mod error;
mod login;
mod phishing;

pub use error::PlaybookError;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument, warn};

use soar_core::{ActionType, AlertId, AlertStatus, CaseId, CaseType, EventType, Severity, Source};
use soar_queue::TaskQueue;
use soar_state::CaseStore;

/// What a per-source playbook run hands back to the orchestrator for use by
/// the auto-response policy.
#[derive(Debug, Clone)]
pub(crate) struct PlaybookOutcome {
    pub score: u8,
    pub severity: Severity,
    pub domains: Vec<String>,
    pub ips: Vec<String>,
}

/// Runs the extract/enrich/score pipeline for one alert at a time and enqueues the
/// resulting auto-response actions onto the task queue.
pub struct Orchestrator {
    store: Arc<dyn CaseStore>,
    http: reqwest::Client,
    queue: Arc<TaskQueue>,
    bad_domains_path: PathBuf,
    bad_ips_path: PathBuf,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        store: Arc<dyn CaseStore>,
        http: reqwest::Client,
        queue: Arc<TaskQueue>,
        bad_domains_path: PathBuf,
        bad_ips_path: PathBuf,
    ) -> Self {
        Self { store, http, queue, bad_domains_path, bad_ips_path }
    }

    /// Process one ingested alert.
    ///
    /// An alert that no longer exists, or that has already been processed, is
    /// not an error: both are logged and the call returns `Ok(())` so the
    /// task queue does not retry a no-op.
    #[instrument(skip(self), fields(%alert_id))]
    pub async fn process_alert(&self, alert_id: AlertId) -> Result<(), PlaybookError> {
        let Some(alert) = self.store.get_alert(alert_id).await? else {
            metrics::counter!("playbook_runs_total", "playbook" => "unknown", "outcome" => "error")
                .increment(1);
            warn!(%alert_id, "alert not found, dropping process_alert task");
            return Ok(());
        };

        if alert.status == AlertStatus::Processed {
            info!(%alert_id, "alert already processed, skipping");
            return Ok(());
        }

        let now = Utc::now();
        let case_type = alert.source.default_case_type();
        let attach = self
            .store
            .attach_alert_to_case(alert.id, &alert.dedup_hash, case_type, now)
            .await?;

        self.store
            .append_timeline_event(
                attach.case.id,
                EventType::Ingest,
                if attach.created {
                    "case created".to_string()
                } else {
                    "alert attached to existing case".to_string()
                },
                json!({
                    "alert_id": alert.id.to_string(),
                    "dedup_hash": alert.dedup_hash,
                    "created": attach.created,
                    "source": alert.source.to_string(),
                }),
                now,
            )
            .await?;

        if attach.created {
            metrics::counter!("cases_created_total", "type" => attach.case.r#type.to_string())
                .increment(1);
        }

        let playbook_name = match alert.source {
            Source::Email => "phishing_v1",
            Source::Auth => "suspicious_login_v1",
            Source::Network => "beacon_v1",
        };

        let run = match alert.source {
            Source::Email => {
                phishing::run(
                    self.store.as_ref(),
                    &self.http,
                    &self.bad_domains_path,
                    attach.case.id,
                    &alert.raw_payload,
                    now,
                )
                .await
            }
            Source::Auth => {
                login::run(self.store.as_ref(), &self.bad_ips_path, attach.case.id, &alert.raw_payload, now)
                    .await
            }
            Source::Network => {
                beacon::run(self.store.as_ref(), &self.http, attach.case.id, &alert.raw_payload, now).await
            }
        };

        let outcome = match run {
            Ok(outcome) => outcome,
            Err(err) => {
                metrics::counter!("playbook_runs_total", "playbook" => playbook_name, "outcome" => "error")
                    .increment(1);
                return Err(err);
            }
        };

        metrics::counter!("playbook_runs_total", "playbook" => playbook_name, "outcome" => "ok")
            .increment(1);
        info!(case_id = %attach.case.id, score = outcome.score, severity = %outcome.severity, "playbook run completed");

        self.dispatch_auto_response(attach.case.id, attach.case.r#type, outcome);

        Ok(())
    }

    /// For a high/critical severity case, enqueue the fixed action set for
    /// its case type.
    fn dispatch_auto_response(&self, case_id: CaseId, case_type: CaseType, outcome: PlaybookOutcome) {
        if !outcome.severity.warrants_auto_response() {
            return;
        }

        let severity = outcome.severity;
        let score = outcome.score;

        match case_type {
            CaseType::Phishing => {
                for domain in &outcome.domains {
                    self.queue.enqueue_run_action(
                        case_id,
                        ActionType::BlockDomain,
                        json!({"domain": domain}),
                    );
                }
                self.queue.enqueue_run_action(case_id, ActionType::CreateTicket, json!({}));
                self.queue.enqueue_run_action(
                    case_id,
                    ActionType::Notify,
                    json!({"message": format!(
                        "Auto-response: phishing case {case_id} severity={severity} score={score}"
                    )}),
                );
            }
            CaseType::Login => {
                self.queue.enqueue_run_action(case_id, ActionType::CreateTicket, json!({}));
                self.queue.enqueue_run_action(
                    case_id,
                    ActionType::Notify,
                    json!({"message": format!(
                        "Auto-response: suspicious login case {case_id} severity={severity} score={score}"
                    )}),
                );
            }
            CaseType::Beacon => {
                for domain in &outcome.domains {
                    self.queue.enqueue_run_action(
                        case_id,
                        ActionType::BlockDomain,
                        json!({"domain": domain}),
                    );
                }
                for ip in &outcome.ips {
                    self.queue.enqueue_run_action(case_id, ActionType::BlockIp, json!({"ip": ip}));
                }
                self.queue.enqueue_run_action(case_id, ActionType::CreateTicket, json!({}));
                self.queue.enqueue_run_action(
                    case_id,
                    ActionType::Notify,
                    json!({"message": format!(
                        "Auto-response: beacon case {case_id} severity={severity} score={score}"
                    )}),
                );
            }
            CaseType::Unknown => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use soar_core::Alert;
    use soar_queue::{QueueConfig, Task, TaskError, TaskHandler};
    use soar_state::InMemoryCaseStore;

    #[derive(Default)]
    struct RecordingHandler {
        tasks: Mutex<Vec<Task>>,
    }

    #[async_trait]
    impl TaskHandler for RecordingHandler {
        async fn handle(&self, task: Task) -> Result<(), TaskError> {
            self.tasks.lock().unwrap().push(task);
            Ok(())
        }
    }

    fn action_types(handler: &RecordingHandler) -> Vec<ActionType> {
        handler
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter_map(|t| match t {
                Task::RunAction { action_type, .. } => Some(*action_type),
                Task::ProcessAlert { .. } => None,
            })
            .collect()
    }

    fn orchestrator(store: Arc<dyn CaseStore>, queue: Arc<TaskQueue>, dir: &tempfile::TempDir) -> Orchestrator {
        Orchestrator::new(
            store,
            reqwest::Client::new(),
            queue,
            dir.path().join("bad_domains.txt"),
            dir.path().join("bad_ips.txt"),
        )
    }

    #[tokio::test]
    async fn phishing_high_severity_enqueues_block_ticket_and_notify() {
        let store: Arc<dyn CaseStore> = Arc::new(InMemoryCaseStore::new());
        let handler = Arc::new(RecordingHandler::default());
        let queue = TaskQueue::spawn(Arc::clone(&handler) as Arc<dyn TaskHandler>, QueueConfig::default());
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad_domains.txt"), "micros0ft-support.com\n").unwrap();

        let orchestrator = orchestrator(store.clone(), queue, &dir);

        let payload = json!({
            "sender": "security@micros0ft-support.com",
            "subject": "Verify your account",
            "body": "Please verify here: https://micros0ft-support.com/login",
        });
        let alert = Alert::new(Source::Email, payload, "dedup-phish-1".to_string());
        store.insert_alert(alert.clone()).await.unwrap();

        orchestrator.process_alert(alert.id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        let actions = action_types(&handler);
        assert!(actions.contains(&ActionType::BlockDomain));
        assert!(actions.contains(&ActionType::CreateTicket));
        assert!(actions.contains(&ActionType::Notify));

        let reloaded = store.get_alert(alert.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, AlertStatus::Processed);
    }

    #[tokio::test]
    async fn benign_login_does_not_enqueue_any_action() {
        let store: Arc<dyn CaseStore> = Arc::new(InMemoryCaseStore::new());
        let handler = Arc::new(RecordingHandler::default());
        let queue = TaskQueue::spawn(Arc::clone(&handler) as Arc<dyn TaskHandler>, QueueConfig::default());
        let dir = tempfile::tempdir().unwrap();

        let orchestrator = orchestrator(store.clone(), queue, &dir);

        let payload = json!({"user": "neil@example.com", "ip": "10.0.0.5", "success": true, "country": "US"});
        let alert = Alert::new(Source::Auth, payload, "dedup-login-1".to_string());
        store.insert_alert(alert.clone()).await.unwrap();

        orchestrator.process_alert(alert.id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(action_types(&handler).is_empty());
    }

    #[tokio::test]
    async fn reprocessing_an_already_processed_alert_is_a_noop() {
        let store: Arc<dyn CaseStore> = Arc::new(InMemoryCaseStore::new());
        let handler = Arc::new(RecordingHandler::default());
        let queue = TaskQueue::spawn(Arc::clone(&handler) as Arc<dyn TaskHandler>, QueueConfig::default());
        let dir = tempfile::tempdir().unwrap();

        let orchestrator = orchestrator(store.clone(), queue, &dir);

        let payload = json!({"user": "neil@example.com", "ip": "10.0.0.5", "success": true, "country": "US"});
        let alert = Alert::new(Source::Auth, payload, "dedup-login-2".to_string());
        store.insert_alert(alert.clone()).await.unwrap();

        orchestrator.process_alert(alert.id).await.unwrap();
        let case_count_first = store.list_cases(Default::default()).await.unwrap().len();

        orchestrator.process_alert(alert.id).await.unwrap();
        let case_count_second = store.list_cases(Default::default()).await.unwrap().len();

        assert_eq!(case_count_first, case_count_second);
    }

    #[tokio::test]
    async fn missing_alert_returns_ok_without_creating_a_case() {
        let store: Arc<dyn CaseStore> = Arc::new(InMemoryCaseStore::new());
        let handler = Arc::new(RecordingHandler::default());
        let queue = TaskQueue::spawn(Arc::clone(&handler) as Arc<dyn TaskHandler>, QueueConfig::default());
        let dir = tempfile::tempdir().unwrap();

        let orchestrator = orchestrator(store.clone(), queue, &dir);

        orchestrator.process_alert(AlertId::new()).await.unwrap();
        assert!(store.list_cases(Default::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn beacon_fans_out_block_domain_and_block_ip() {
        let store: Arc<dyn CaseStore> = Arc::new(InMemoryCaseStore::new());
        let handler = Arc::new(RecordingHandler::default());
        let queue = TaskQueue::spawn(Arc::clone(&handler) as Arc<dyn TaskHandler>, QueueConfig::default());
        let dir = tempfile::tempdir().unwrap();

        let orchestrator = orchestrator(store.clone(), queue, &dir);

        let timestamps: Vec<String> = (0..12).map(|i| format!("2024-01-01T00:{i:02}:00Z")).collect();
        let payload = json!({
            "dst_domain": "evil.example.com",
            "dst_ip": "203.0.113.9",
            "hosts": ["h1", "h2", "h3"],
            "timestamps": timestamps,
        });
        let alert = Alert::new(Source::Network, payload, "dedup-beacon-1".to_string());
        store.insert_alert(alert.clone()).await.unwrap();

        orchestrator.process_alert(alert.id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        let actions = action_types(&handler);
        assert!(actions.contains(&ActionType::BlockDomain));
        assert!(actions.contains(&ActionType::BlockIp));
        assert!(actions.contains(&ActionType::CreateTicket));
        assert!(actions.contains(&ActionType::Notify));
    }
}
