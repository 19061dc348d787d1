use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::{json, Value as Json};
use soar_core::clamp_score;

use crate::haversine::haversine_km;
use crate::ScoreResult;

/// Minimum elapsed hours used when computing implied travel speed, so a
/// near-simultaneous pair of logins doesn't divide by (near) zero.
const MIN_ELAPSED_HOURS: f64 = 0.001;
/// Speed above which travel between two login locations is implausible.
const IMPOSSIBLE_TRAVEL_KMH: f64 = 900.0;

/// The most recent login context recorded for a user, used to correlate the
/// current alert against their prior session.
#[derive(Debug, Clone, Default)]
pub struct PrevLoginContext {
    pub country: Option<String>,
    pub ip: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub ts: Option<DateTime<Utc>>,
}

/// Score a login/auth case.
#[must_use]
pub fn score_login(
    payload: &Json,
    ip: &str,
    success: bool,
    country: Option<&str>,
    prev: Option<&PrevLoginContext>,
    now: DateTime<Utc>,
    bad_ips: &HashSet<String>,
) -> ScoreResult {
    let mut score: i32 = 0;
    let mut reasons = Vec::new();

    let new_country_success = success
        && country.is_some_and(|c| !c.is_empty())
        && prev.and_then(|p| p.country.as_deref()).is_some_and(|pc| Some(pc) != country);
    if new_country_success {
        score += 30;
        reasons.push("new_country_success".to_string());
    }

    if let Some(prev) = prev
        && let (Some(prev_ts), Some(plat), Some(plon)) = (prev.ts, prev.lat, prev.lon)
        && let (Some(lat), Some(lon)) = (
            payload.get("lat").and_then(Json::as_f64),
            payload.get("lon").and_then(Json::as_f64),
        )
    {
        let ts = payload
            .get("ts")
            .and_then(Json::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now);
        let elapsed_hours = ((ts - prev_ts).num_seconds() as f64 / 3600.0).max(MIN_ELAPSED_HOURS);
        let distance_km = haversine_km(plat, plon, lat, lon);
        let speed_kmh = distance_km / elapsed_hours;
        if speed_kmh > IMPOSSIBLE_TRAVEL_KMH {
            score += 40;
            reasons.push("impossible_travel".to_string());
        }
    }

    if !ip.is_empty() && bad_ips.contains(ip) {
        score += 30;
        reasons.push("ip_reputation_bad".to_string());
    }

    if payload.get("mfa_fatigue").and_then(Json::as_bool).unwrap_or(false) {
        score += 25;
        reasons.push("mfa_fatigue_signals".to_string());
    }

    let score = clamp_score(score);
    let details = json!({
        "score": score,
        "reasons": reasons,
        "ip": ip,
        "country": country,
        "success": success,
        "prev_context": {
            "country": prev.and_then(|p| p.country.clone()),
            "ts": prev.and_then(|p| p.ts).map(|t| t.to_rfc3339()),
        },
    });

    ScoreResult { score, reasons, details }
}
