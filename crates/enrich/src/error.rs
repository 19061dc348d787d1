use thiserror::Error;

/// Never propagated to the orchestrator, only captured in the `enrich`
/// timeline event's `errors` list. Kept as a first-class type so callers can
/// format it consistently.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("dns lookup failed: {0}")]
    Dns(String),

    #[error("rdap request failed: {0}")]
    Rdap(String),

    #[error("threat feed io error: {0}")]
    ThreatFeed(#[from] std::io::Error),
}

/// One failed enrichment call against a single target, as carried in a
/// playbook's `enrich` timeline event.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EnrichErrorEntry {
    pub target: String,
    pub kind: String,
    pub error: String,
}

impl EnrichErrorEntry {
    #[must_use]
    pub fn new(target: impl Into<String>, kind: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            kind: kind.into(),
            error: error.into(),
        }
    }
}
