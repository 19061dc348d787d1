use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as Json;

use soar_core::{
    Action, ActionId, Alert, AlertId, Artifact, ArtifactType, Case, CaseId, CaseType, Severity,
    Source, Ticket, TicketId, TimelineEvent, EventType,
};

use crate::error::StateError;

/// The outcome of the case-attachment protocol.
#[derive(Debug, Clone)]
pub struct AttachResult {
    pub case: Case,
    pub created: bool,
}

/// A filter for listing cases through the read API.
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    pub status: Option<String>,
    pub r#type: Option<String>,
    pub severity: Option<String>,
    pub limit: usize,
}

/// Storage for the alert pipeline's entities.
///
/// Implementations must be `Send + Sync` to be shared across concurrently
/// running task handlers. [`CaseStore::attach_alert_to_case`] implements the
/// case-attachment protocol as a single atomic operation, so
/// a backend is free to implement it with a serializable transaction, a
/// unique index with retry, or (as the in-memory backend does) a single
/// exclusive lock held for the whole read-then-write.
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Persist a newly-ingested alert.
    async fn insert_alert(&self, alert: Alert) -> Result<(), StateError>;

    /// Fetch an alert by id.
    async fn get_alert(&self, id: AlertId) -> Result<Option<Alert>, StateError>;

    /// Look up an open case by `title == dedup_hash`, creating one if absent,
    /// and bind `alert.case_id`/`alert.status` in the same atomic step.
    ///
    /// `case_type` is used only when a new case must be created.
    async fn attach_alert_to_case(
        &self,
        alert_id: AlertId,
        dedup_hash: &str,
        case_type: CaseType,
        now: DateTime<Utc>,
    ) -> Result<AttachResult, StateError>;

    /// Fetch a case by id.
    async fn get_case(&self, id: CaseId) -> Result<Option<Case>, StateError>;

    /// List cases, most recently created first, honoring `filter`.
    async fn list_cases(&self, filter: CaseFilter) -> Result<Vec<Case>, StateError>;

    /// Overwrite a case's score/severity and bump `updated_at`.
    async fn update_case_score(
        &self,
        id: CaseId,
        score: u8,
        severity: Severity,
        now: DateTime<Utc>,
    ) -> Result<(), StateError>;

    /// Transition a case to `closed`, returning the updated case.
    async fn close_case(&self, id: CaseId, now: DateTime<Utc>) -> Result<Option<Case>, StateError>;

    /// Record an extracted observable.
    async fn insert_artifact(
        &self,
        case_id: CaseId,
        r#type: ArtifactType,
        value: String,
        now: DateTime<Utc>,
    ) -> Result<Artifact, StateError>;

    /// List all artifacts recorded for a case.
    async fn list_artifacts(&self, case_id: CaseId) -> Result<Vec<Artifact>, StateError>;

    /// Append a narrative entry to a case's timeline.
    async fn append_timeline_event(
        &self,
        case_id: CaseId,
        event_type: EventType,
        message: String,
        details: Json,
        now: DateTime<Utc>,
    ) -> Result<TimelineEvent, StateError>;

    /// List a case's timeline, ordered by `ts`.
    async fn list_timeline(&self, case_id: CaseId) -> Result<Vec<TimelineEvent>, StateError>;

    /// Scan the most recent `login_context` timeline events **globally**
    /// (not scoped to a case), bounded to `limit` events, most recent first.
    ///
    /// Previous-login correlation intentionally looks across all cases for
    /// the same user, not just the current one.
    async fn recent_login_contexts(&self, limit: usize) -> Result<Vec<TimelineEvent>, StateError>;

    /// Insert a pending action record.
    async fn insert_action(&self, action: Action) -> Result<(), StateError>;

    /// Mark a pending action as terminal. Returns `None` if the action did
    /// not exist.
    async fn finish_action(
        &self,
        id: ActionId,
        success: bool,
        result: Json,
        finished_at: DateTime<Utc>,
    ) -> Result<Option<Action>, StateError>;

    /// List all actions recorded for a case, in `started_at` order.
    async fn list_actions(&self, case_id: CaseId) -> Result<Vec<Action>, StateError>;

    /// Persist a ticket.
    async fn insert_ticket(&self, ticket: Ticket) -> Result<(), StateError>;

    /// Fetch a ticket by id.
    async fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, StateError>;

    /// List all tickets recorded for a case.
    async fn list_tickets(&self, case_id: CaseId) -> Result<Vec<Ticket>, StateError>;
}

/// Derive the case type a fresh case should take for a given alert source.
/// Exposed for backends that need it outside `attach_alert_to_case`.
#[must_use]
pub fn case_type_for_source(source: Source) -> CaseType {
    source.default_case_type()
}
