//! Shared entity types, ids, dedup fingerprinting, and error kinds for the
//! SOAR alert-processing pipeline.

pub mod error;
pub mod fingerprint;
pub mod ids;
pub mod severity;
pub mod types;

pub use error::CoreError;
pub use fingerprint::dedup_hash;
pub use ids::{ActionId, AlertId, ArtifactId, CaseId, TicketId, TimelineEventId};
pub use severity::{clamp_score, severity_from_score};
pub use types::{
    Action, ActionType, Alert, AlertStatus, Artifact, ArtifactType, Case, CaseStatus, CaseType,
    Severity, Source, Ticket, TimelineEvent, EventType,
};
