use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::{json, Value as Json};

use soar_core::{severity_from_score, ArtifactType, CaseId, EventType};
use soar_enrich::load_feed;
use soar_extract::extract_login;
use soar_score::{score_login, PrevLoginContext};
use soar_state::CaseStore;

use crate::{PlaybookError, PlaybookOutcome};

/// How far back `previous_login_context` scans the global `login_context`
/// timeline to find this user's last known session.
const LOGIN_CONTEXT_SCAN_LIMIT: usize = 200;

/// `suspicious_login_v1`: extract -> persist artifacts -> correlate against
/// the user's previous login context -> score -> persist a fresh context for
/// the next run to find.
pub(crate) async fn run(
    store: &dyn CaseStore,
    bad_ips_path: &Path,
    case_id: CaseId,
    payload: &Json,
    now: DateTime<Utc>,
) -> Result<PlaybookOutcome, PlaybookError> {
    let extracted = extract_login(payload);
    let user = extracted.users.first().cloned().unwrap_or_default();
    let ip = extracted.ips.first().cloned().unwrap_or_default();
    let user_agent = extracted.user_agents.first().cloned();
    let country = extracted.countries.first().cloned();
    let city = extracted.cities.first().cloned();

    if !user.is_empty() {
        store.insert_artifact(case_id, ArtifactType::User, user.clone(), now).await?;
    }
    if !ip.is_empty() {
        store.insert_artifact(case_id, ArtifactType::Ip, ip.clone(), now).await?;
    }
    if let Some(ua) = &user_agent {
        store.insert_artifact(case_id, ArtifactType::UserAgent, ua.clone(), now).await?;
    }
    if let Some(c) = &country {
        store.insert_artifact(case_id, ArtifactType::Country, c.clone(), now).await?;
    }
    if let Some(c) = &city {
        store.insert_artifact(case_id, ArtifactType::City, c.clone(), now).await?;
    }
    store
        .append_timeline_event(
            case_id,
            EventType::Extract,
            "extracted login artifacts".to_string(),
            json!({"user": user, "ip": ip, "user_agent": user_agent, "country": country, "city": city}),
            now,
        )
        .await?;

    let bad_ips: HashSet<String> = load_feed(bad_ips_path, false);
    let ip_reputation_bad = !ip.is_empty() && bad_ips.contains(&ip);
    let prev = previous_login_context(store, &user).await?;

    store
        .append_timeline_event(
            case_id,
            EventType::Enrich,
            "login enrichment completed".to_string(),
            json!({
                "ip_reputation": {"ip": ip, "bad": ip_reputation_bad},
                "prev_context_found": prev.is_some(),
            }),
            now,
        )
        .await?;

    let success = payload.get("success").and_then(Json::as_bool).unwrap_or(true);
    let score_result =
        score_login(payload, &ip, success, country.as_deref(), prev.as_ref(), now, &bad_ips);
    let severity = severity_from_score(score_result.score);
    store.update_case_score(case_id, score_result.score, severity, now).await?;
    store
        .append_timeline_event(
            case_id,
            EventType::Score,
            "scored login case".to_string(),
            json!({
                "score": score_result.score,
                "reasons": score_result.reasons,
                "details": score_result.details,
                "severity": severity.to_string(),
            }),
            now,
        )
        .await?;

    if !user.is_empty() {
        let ts = payload
            .get("ts")
            .and_then(Json::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| now.to_rfc3339());
        store
            .append_timeline_event(
                case_id,
                EventType::LoginContext,
                "login context saved".to_string(),
                json!({
                    "user": user,
                    "ip": ip,
                    "country": country,
                    "city": city,
                    "lat": payload.get("lat"),
                    "lon": payload.get("lon"),
                    "ts": ts,
                }),
                now,
            )
            .await?;
    }

    Ok(PlaybookOutcome { score: score_result.score, severity, domains: Vec::new(), ips: Vec::new() })
}

/// Scan the global `login_context` timeline for the most recent entry for
/// `user`. Unscoped by design: a repeat offender's prior logins across
/// different cases should still surface here.
async fn previous_login_context(
    store: &dyn CaseStore,
    user: &str,
) -> Result<Option<PrevLoginContext>, PlaybookError> {
    if user.is_empty() {
        return Ok(None);
    }

    let events = store.recent_login_contexts(LOGIN_CONTEXT_SCAN_LIMIT).await?;
    for event in events {
        if event.details.get("user").and_then(Json::as_str) != Some(user) {
            continue;
        }
        let ts = event
            .details
            .get("ts")
            .and_then(Json::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        return Ok(Some(PrevLoginContext {
            country: event.details.get("country").and_then(Json::as_str).map(str::to_string),
            ip: event.details.get("ip").and_then(Json::as_str).map(str::to_string),
            lat: event.details.get("lat").and_then(Json::as_f64),
            lon: event.details.get("lon").and_then(Json::as_f64),
            ts,
        }));
    }
    Ok(None)
}
