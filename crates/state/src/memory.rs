use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as Json;
use tokio::sync::Mutex;

use soar_core::{
    Action, ActionId, Alert, AlertId, AlertStatus, Artifact, ArtifactId, ArtifactType, Case,
    CaseId, CaseStatus, CaseType, Severity, Ticket, TicketId, TimelineEvent, TimelineEventId,
    EventType,
};

use crate::error::StateError;
use crate::store::{AttachResult, CaseFilter, CaseStore};

#[derive(Default)]
struct Db {
    alerts: HashMap<AlertId, Alert>,
    cases: HashMap<CaseId, Case>,
    artifacts: HashMap<CaseId, Vec<Artifact>>,
    // Global, append-only, ordered by insertion (== by `ts` since the
    // orchestrator assigns monotonic timestamps within a task).
    timeline: Vec<TimelineEvent>,
    actions: HashMap<ActionId, Action>,
    tickets: HashMap<TicketId, Ticket>,
}

/// In-memory [`CaseStore`] backed by a single exclusive lock.
///
/// The whole `Db` is guarded by one `tokio::sync::Mutex`, so the
/// case-attachment protocol's lookup-then-insert is trivially atomic: no
/// separate transaction or unique-index machinery is needed for this
/// backend. A production deployment would swap this for a real database
/// behind the same trait.
#[derive(Default)]
pub struct InMemoryCaseStore {
    db: Mutex<Db>,
}

impl InMemoryCaseStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CaseStore for InMemoryCaseStore {
    async fn insert_alert(&self, alert: Alert) -> Result<(), StateError> {
        let mut db = self.db.lock().await;
        db.alerts.insert(alert.id, alert);
        Ok(())
    }

    async fn get_alert(&self, id: AlertId) -> Result<Option<Alert>, StateError> {
        let db = self.db.lock().await;
        Ok(db.alerts.get(&id).cloned())
    }

    async fn attach_alert_to_case(
        &self,
        alert_id: AlertId,
        dedup_hash: &str,
        case_type: CaseType,
        now: DateTime<Utc>,
    ) -> Result<AttachResult, StateError> {
        let mut db = self.db.lock().await;

        let existing = db
            .cases
            .values()
            .find(|c| c.status == CaseStatus::Open && c.title == dedup_hash)
            .cloned();

        let (case, created) = match existing {
            Some(case) => (case, false),
            None => {
                let case = Case::new_open(dedup_hash.to_string(), case_type, now);
                db.cases.insert(case.id, case.clone());
                (case, true)
            }
        };

        let alert = db
            .alerts
            .get_mut(&alert_id)
            .ok_or_else(|| StateError::NotFound(format!("alert {alert_id}")))?;
        alert.case_id = Some(case.id);
        alert.status = AlertStatus::Processed;

        Ok(AttachResult { case, created })
    }

    async fn get_case(&self, id: CaseId) -> Result<Option<Case>, StateError> {
        let db = self.db.lock().await;
        Ok(db.cases.get(&id).cloned())
    }

    async fn list_cases(&self, filter: CaseFilter) -> Result<Vec<Case>, StateError> {
        let db = self.db.lock().await;
        let mut cases: Vec<Case> = db
            .cases
            .values()
            .filter(|c| filter.status.as_deref().is_none_or(|s| c.status.to_string() == s))
            .filter(|c| filter.r#type.as_deref().is_none_or(|t| c.r#type.to_string() == t))
            .filter(|c| filter.severity.as_deref().is_none_or(|s| c.severity.to_string() == s))
            .cloned()
            .collect();
        cases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if filter.limit > 0 {
            cases.truncate(filter.limit);
        }
        Ok(cases)
    }

    async fn update_case_score(
        &self,
        id: CaseId,
        score: u8,
        severity: Severity,
        now: DateTime<Utc>,
    ) -> Result<(), StateError> {
        let mut db = self.db.lock().await;
        let case = db
            .cases
            .get_mut(&id)
            .ok_or_else(|| StateError::NotFound(format!("case {id}")))?;
        case.score = score;
        case.severity = severity;
        case.updated_at = now;
        Ok(())
    }

    async fn close_case(&self, id: CaseId, now: DateTime<Utc>) -> Result<Option<Case>, StateError> {
        let mut db = self.db.lock().await;
        let Some(case) = db.cases.get_mut(&id) else {
            return Ok(None);
        };
        case.status = CaseStatus::Closed;
        case.updated_at = now;
        Ok(Some(case.clone()))
    }

    async fn insert_artifact(
        &self,
        case_id: CaseId,
        r#type: ArtifactType,
        value: String,
        now: DateTime<Utc>,
    ) -> Result<Artifact, StateError> {
        let artifact = Artifact {
            id: ArtifactId::new(),
            case_id,
            r#type,
            value,
            first_seen: now,
        };
        let mut db = self.db.lock().await;
        db.artifacts.entry(case_id).or_default().push(artifact.clone());
        Ok(artifact)
    }

    async fn list_artifacts(&self, case_id: CaseId) -> Result<Vec<Artifact>, StateError> {
        let db = self.db.lock().await;
        Ok(db.artifacts.get(&case_id).cloned().unwrap_or_default())
    }

    async fn append_timeline_event(
        &self,
        case_id: CaseId,
        event_type: EventType,
        message: String,
        details: Json,
        now: DateTime<Utc>,
    ) -> Result<TimelineEvent, StateError> {
        let event = TimelineEvent {
            id: TimelineEventId::new(),
            case_id,
            ts: now,
            event_type,
            message,
            details,
        };
        let mut db = self.db.lock().await;
        db.timeline.push(event.clone());
        Ok(event)
    }

    async fn list_timeline(&self, case_id: CaseId) -> Result<Vec<TimelineEvent>, StateError> {
        let db = self.db.lock().await;
        let mut events: Vec<TimelineEvent> =
            db.timeline.iter().filter(|e| e.case_id == case_id).cloned().collect();
        events.sort_by_key(|e| e.ts);
        Ok(events)
    }

    async fn recent_login_contexts(&self, limit: usize) -> Result<Vec<TimelineEvent>, StateError> {
        let db = self.db.lock().await;
        let mut events: Vec<TimelineEvent> = db
            .timeline
            .iter()
            .filter(|e| e.event_type == EventType::LoginContext)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.ts.cmp(&a.ts));
        events.truncate(limit);
        Ok(events)
    }

    async fn insert_action(&self, action: Action) -> Result<(), StateError> {
        let mut db = self.db.lock().await;
        db.actions.insert(action.id, action);
        Ok(())
    }

    async fn finish_action(
        &self,
        id: ActionId,
        success: bool,
        result: Json,
        finished_at: DateTime<Utc>,
    ) -> Result<Option<Action>, StateError> {
        let mut db = self.db.lock().await;
        let Some(action) = db.actions.get_mut(&id) else {
            return Ok(None);
        };
        action.success = Some(success);
        action.result = result;
        action.finished_at = Some(finished_at);
        Ok(Some(action.clone()))
    }

    async fn list_actions(&self, case_id: CaseId) -> Result<Vec<Action>, StateError> {
        let db = self.db.lock().await;
        let mut actions: Vec<Action> =
            db.actions.values().filter(|a| a.case_id == case_id).cloned().collect();
        actions.sort_by_key(|a| a.started_at);
        Ok(actions)
    }

    async fn insert_ticket(&self, ticket: Ticket) -> Result<(), StateError> {
        let mut db = self.db.lock().await;
        db.tickets.insert(ticket.id, ticket);
        Ok(())
    }

    async fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, StateError> {
        let db = self.db.lock().await;
        Ok(db.tickets.get(&id).cloned())
    }

    async fn list_tickets(&self, case_id: CaseId) -> Result<Vec<Ticket>, StateError> {
        let db = self.db.lock().await;
        Ok(db.tickets.values().filter(|t| t.case_id == case_id).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soar_core::Source;

    fn payload() -> Json {
        serde_json::json!({"subject": "hi"})
    }

    #[tokio::test]
    async fn second_attach_with_same_hash_reuses_case() {
        let store = InMemoryCaseStore::new();
        let now = Utc::now();

        let a1 = Alert::new(Source::Email, payload(), "hash-1".to_string());
        let a2 = Alert::new(Source::Email, payload(), "hash-1".to_string());
        store.insert_alert(a1.clone()).await.unwrap();
        store.insert_alert(a2.clone()).await.unwrap();

        let r1 = store
            .attach_alert_to_case(a1.id, "hash-1", CaseType::Phishing, now)
            .await
            .unwrap();
        let r2 = store
            .attach_alert_to_case(a2.id, "hash-1", CaseType::Phishing, now)
            .await
            .unwrap();

        assert!(r1.created);
        assert!(!r2.created);
        assert_eq!(r1.case.id, r2.case.id);
        assert_eq!(store.list_cases(CaseFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn closed_case_with_same_title_does_not_get_reused() {
        let store = InMemoryCaseStore::new();
        let now = Utc::now();

        let a1 = Alert::new(Source::Email, payload(), "hash-2".to_string());
        store.insert_alert(a1.clone()).await.unwrap();
        let r1 = store
            .attach_alert_to_case(a1.id, "hash-2", CaseType::Phishing, now)
            .await
            .unwrap();
        store.close_case(r1.case.id, now).await.unwrap();

        let a2 = Alert::new(Source::Email, payload(), "hash-2".to_string());
        store.insert_alert(a2.clone()).await.unwrap();
        let r2 = store
            .attach_alert_to_case(a2.id, "hash-2", CaseType::Phishing, now)
            .await
            .unwrap();

        assert!(r2.created);
        assert_ne!(r1.case.id, r2.case.id);
    }

    #[tokio::test]
    async fn login_context_scan_is_global_across_cases() {
        let store = InMemoryCaseStore::new();
        let now = Utc::now();
        let case_a = CaseId::new();
        let case_b = CaseId::new();

        store
            .append_timeline_event(
                case_a,
                EventType::LoginContext,
                "ctx".into(),
                serde_json::json!({"user": "neil"}),
                now,
            )
            .await
            .unwrap();

        let results = store.recent_login_contexts(200).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].case_id, case_a);
        assert_ne!(results[0].case_id, case_b);
    }
}
