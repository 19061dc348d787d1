use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::{json, Value as Json};

use soar_core::{severity_from_score, ArtifactType, CaseId, EventType};
use soar_enrich::{dns_enrich, load_feed, rdap_domain, DnsResult, EnrichErrorEntry, RdapResult};
use soar_extract::extract_phishing;
use soar_score::score_phishing;
use soar_state::CaseStore;

use crate::{PlaybookError, PlaybookOutcome};

/// `phishing_v1`: extract -> persist artifacts -> DNS/RDAP-enrich each domain
/// -> score against the local bad-domain feed -> persist score.
pub(crate) async fn run(
    store: &dyn CaseStore,
    http: &reqwest::Client,
    bad_domains_path: &Path,
    case_id: CaseId,
    payload: &Json,
    now: DateTime<Utc>,
) -> Result<PlaybookOutcome, PlaybookError> {
    let extracted = extract_phishing(payload);

    for url in &extracted.urls {
        store.insert_artifact(case_id, ArtifactType::Url, url.clone(), now).await?;
    }
    for domain in &extracted.domains {
        store.insert_artifact(case_id, ArtifactType::Domain, domain.clone(), now).await?;
    }
    for email in &extracted.emails {
        store.insert_artifact(case_id, ArtifactType::Email, email.clone(), now).await?;
    }
    store
        .append_timeline_event(
            case_id,
            EventType::Extract,
            "extracted phishing artifacts".to_string(),
            json!({"urls": extracted.urls, "domains": extracted.domains, "emails": extracted.emails}),
            now,
        )
        .await?;

    let mut dns_results: HashMap<String, DnsResult> = HashMap::new();
    let mut rdap_results: HashMap<String, RdapResult> = HashMap::new();
    let mut errors = Vec::new();

    let dns_start = Instant::now();
    for domain in &extracted.domains {
        dns_results.insert(domain.clone(), dns_enrich(domain).await);
    }
    metrics::histogram!("enrichment_latency_seconds", "enricher" => "dns")
        .record(dns_start.elapsed().as_secs_f64());

    let rdap_start = Instant::now();
    for domain in &extracted.domains {
        let result = rdap_domain(http, domain, now).await;
        if !result.ok
            && let Some(err) = &result.error
        {
            errors.push(EnrichErrorEntry::new(domain.clone(), "rdap_error", err.clone()));
        }
        rdap_results.insert(domain.clone(), result);
    }
    metrics::histogram!("enrichment_latency_seconds", "enricher" => "rdap")
        .record(rdap_start.elapsed().as_secs_f64());

    store
        .append_timeline_event(
            case_id,
            EventType::Enrich,
            "phishing enrichment completed".to_string(),
            json!({"dns": dns_results, "rdap": rdap_results, "errors": errors}),
            now,
        )
        .await?;

    let bad_domains: HashSet<String> = load_feed(bad_domains_path, true);
    let score_result = score_phishing(payload, &extracted, &rdap_results, &bad_domains);
    let severity = severity_from_score(score_result.score);
    store.update_case_score(case_id, score_result.score, severity, now).await?;
    store
        .append_timeline_event(
            case_id,
            EventType::Score,
            "scored phishing case".to_string(),
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
        ips: Vec::new(),
    })
}
