use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::ids::{ActionId, AlertId, ArtifactId, CaseId, TicketId, TimelineEventId};

/// The three alert source classes the pipeline ingests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Email,
    Auth,
    Network,
}

impl Source {
    /// The case type a fresh case takes when created from an alert of this source.
    #[must_use]
    pub fn default_case_type(self) -> CaseType {
        match self {
            Source::Email => CaseType::Phishing,
            Source::Auth => CaseType::Login,
            Source::Network => CaseType::Beacon,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Source::Email => "email",
            Source::Auth => "auth",
            Source::Network => "network",
        };
        f.write_str(s)
    }
}

/// Lifecycle status of an `Alert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    New,
    Processed,
}

/// One inbound event before classification, as persisted by the ingestor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub source: Source,
    pub received_at: DateTime<Utc>,
    pub raw_payload: Json,
    pub dedup_hash: String,
    pub status: AlertStatus,
    pub case_id: Option<CaseId>,
}

impl Alert {
    #[must_use]
    pub fn new(source: Source, raw_payload: Json, dedup_hash: String) -> Self {
        Self {
            id: AlertId::new(),
            source,
            received_at: Utc::now(),
            raw_payload,
            dedup_hash,
            status: AlertStatus::New,
            case_id: None,
        }
    }
}

/// The kind of incident a `Case` represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseType {
    Phishing,
    Login,
    Beacon,
    Unknown,
}

impl std::fmt::Display for CaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CaseType::Phishing => "phishing",
            CaseType::Login => "login",
            CaseType::Beacon => "beacon",
            CaseType::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Case severity, a total function of `score` (see [`crate::severity::severity_from_score`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// `true` for the tier at which auto-response actions are triggered.
    #[must_use]
    pub fn warrants_auto_response(self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Lifecycle status of a `Case`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Open,
    Investigating,
    Contained,
    Closed,
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CaseStatus::Open => "open",
            CaseStatus::Investigating => "investigating",
            CaseStatus::Contained => "contained",
            CaseStatus::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// A persistent incident record grouping one or more alerts by dedup fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    pub title: String,
    pub r#type: CaseType,
    pub severity: Severity,
    pub status: CaseStatus,
    pub score: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Case {
    #[must_use]
    pub fn new_open(title: String, r#type: CaseType, now: DateTime<Utc>) -> Self {
        Self {
            id: CaseId::new(),
            title,
            r#type,
            severity: Severity::Low,
            status: CaseStatus::Open,
            score: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The kind of observable an `Artifact` carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    Url,
    Domain,
    Ip,
    Email,
    User,
    UserAgent,
    Country,
    City,
    Host,
    Hash,
}

impl std::fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ArtifactType::Url => "url",
            ArtifactType::Domain => "domain",
            ArtifactType::Ip => "ip",
            ArtifactType::Email => "email",
            ArtifactType::User => "user",
            ArtifactType::UserAgent => "user_agent",
            ArtifactType::Country => "country",
            ArtifactType::City => "city",
            ArtifactType::Host => "host",
            ArtifactType::Hash => "hash",
        };
        f.write_str(s)
    }
}

/// An observable (url, domain, ip, etc.) extracted from an alert. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub case_id: CaseId,
    pub r#type: ArtifactType,
    pub value: String,
    pub first_seen: DateTime<Utc>,
}

/// The kind of narrative entry appended to a case's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Ingest,
    Extract,
    Enrich,
    Score,
    Action,
    LoginContext,
    Close,
    Report,
    Playbook,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventType::Ingest => "ingest",
            EventType::Extract => "extract",
            EventType::Enrich => "enrich",
            EventType::Score => "score",
            EventType::Action => "action",
            EventType::LoginContext => "login_context",
            EventType::Close => "close",
            EventType::Report => "report",
            EventType::Playbook => "playbook",
        };
        f.write_str(s)
    }
}

/// An append-only narrative entry for a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: TimelineEventId,
    pub case_id: CaseId,
    pub ts: DateTime<Utc>,
    pub event_type: EventType,
    pub message: String,
    pub details: Json,
}

/// The closed set of response actions the executor knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    BlockDomain,
    BlockIp,
    Notify,
    CreateTicket,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActionType::BlockDomain => "block_domain",
            ActionType::BlockIp => "block_ip",
            ActionType::Notify => "notify",
            ActionType::CreateTicket => "create_ticket",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "block_domain" => Ok(ActionType::BlockDomain),
            "block_ip" => Ok(ActionType::BlockIp),
            "notify" => Ok(ActionType::Notify),
            "create_ticket" => Ok(ActionType::CreateTicket),
            other => Err(format!("unsupported action_type: {other}")),
        }
    }
}

/// A durable record of one action-executor attempt. Created pending, updated exactly
/// once to a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub case_id: CaseId,
    pub action_type: ActionType,
    pub params: Json,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub success: Option<bool>,
    pub result: Json,
}

impl Action {
    #[must_use]
    pub fn pending(case_id: CaseId, action_type: ActionType, params: Json, now: DateTime<Utc>) -> Self {
        Self {
            id: ActionId::new(),
            case_id,
            action_type,
            params,
            started_at: now,
            finished_at: None,
            success: None,
            result: Json::Object(serde_json::Map::new()),
        }
    }
}

/// A tracking ticket created by the `create_ticket` action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub case_id: CaseId,
    pub external_ref: Option<String>,
    pub summary: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
