//! Per-playbook scoring heuristics. Each scorer produces a score in
//! `[0, 100]` plus a reason-tag list and a details document; severity is
//! derived from the score by `soar_core::severity_from_score`.

pub mod beacon;
pub mod haversine;
pub mod login;
pub mod periodicity;
pub mod phishing;

pub use beacon::score_beacon;
pub use login::{score_login, PrevLoginContext};
pub use phishing::score_phishing;

use serde::Serialize;
use serde_json::Value as Json;

/// The outcome of a scorer: the clamped score, the reason tags that
/// contributed to it, and a details document persisted on the `score`
/// timeline event.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreResult {
    pub score: u8,
    pub reasons: Vec<String>,
    pub details: Json,
}
