use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::{json, Value as Json};

use soar_core::{severity_from_score, ArtifactType, CaseId, EventType};
use soar_enrich::{dns_enrich, rdap_domain, DnsResult, EnrichErrorEntry, RdapResult};
use soar_extract::extract_beacon;
use soar_score::score_beacon;
use soar_state::CaseStore;

use crate::{PlaybookError, PlaybookOutcome};

/// `beacon_v1`: extract -> persist artifacts -> DNS/RDAP-enrich the lone
/// destination domain (if present) -> score for periodicity and fan-out.
pub(crate) async fn run(
    store: &dyn CaseStore,
    http: &reqwest::Client,
    case_id: CaseId,
    payload: &Json,
    now: DateTime<Utc>,
) -> Result<PlaybookOutcome, PlaybookError> {
    let extracted = extract_beacon(payload);

    if let Some(domain) = extracted.domains.first() {
        store.insert_artifact(case_id, ArtifactType::Domain, domain.clone(), now).await?;
    }
    if let Some(ip) = extracted.ips.first() {
        store.insert_artifact(case_id, ArtifactType::Ip, ip.clone(), now).await?;
    }
    for host in &extracted.hosts {
        store.insert_artifact(case_id, ArtifactType::Host, host.clone(), now).await?;
    }
    store
        .append_timeline_event(
            case_id,
            EventType::Extract,
            "extracted beacon artifacts".to_string(),
            json!({
                "dst_domain": extracted.domains.first(),
                "dst_ip": extracted.ips.first(),
                "hosts": extracted.hosts,
            }),
            now,
        )
        .await?;

    let mut dns_results: HashMap<String, DnsResult> = HashMap::new();
    let mut rdap_results: HashMap<String, RdapResult> = HashMap::new();
    let mut errors = Vec::new();

    if let Some(domain) = extracted.domains.first() {
        let dns_start = Instant::now();
        dns_results.insert(domain.clone(), dns_enrich(domain).await);
        metrics::histogram!("enrichment_latency_seconds", "enricher" => "dns")
            .record(dns_start.elapsed().as_secs_f64());

        let rdap_start = Instant::now();
        let result = rdap_domain(http, domain, now).await;
        if !result.ok
            && let Some(err) = &result.error
        {
            errors.push(EnrichErrorEntry::new(domain.clone(), "rdap_error", err.clone()));
        }
        rdap_results.insert(domain.clone(), result);
        metrics::histogram!("enrichment_latency_seconds", "enricher" => "rdap")
            .record(rdap_start.elapsed().as_secs_f64());
    }

    store
        .append_timeline_event(
            case_id,
            EventType::Enrich,
            "beacon enrichment completed".to_string(),
            json!({"dns": dns_results, "rdap": rdap_results, "errors": errors}),
            now,
        )
        .await?;

    let score_result = score_beacon(payload, &extracted, &rdap_results);
    let severity = severity_from_score(score_result.score);
    store.update_case_score(case_id, score_result.score, severity, now).await?;
    store
        .append_timeline_event(
            case_id,
            EventType::Score,
            "scored beacon case".to_string(),
            json!({
                "score": score_result.score,
                "reasons": score_result.reasons,
                "details": score_result.details,
                "severity": severity.to_string(),
            }),
            now,
        )
        .await?;

    Ok(PlaybookOutcome {
        score: score_result.score,
        severity,
        domains: extracted.domains,
        ips: extracted.ips,
    })
}
