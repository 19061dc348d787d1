use std::collections::HashMap;

use serde_json::{json, Value as Json};
use soar_core::clamp_score;
use soar_enrich::RdapResult;
use soar_extract::BeaconObservables;

use crate::periodicity::periodicity_score;
use crate::ScoreResult;

/// Score a network-beacon case.
#[must_use]
pub fn score_beacon(
    payload: &Json,
    extracted: &BeaconObservables,
    rdap: &HashMap<String, RdapResult>,
) -> ScoreResult {
    let mut score: i32 = 0;
    let mut reasons = Vec::new();

    let (periodic_points, periodicity_details) = periodicity_score(payload);
    if periodic_points > 0 {
        score += i32::from(periodic_points);
        reasons.push("periodicity_detected".to_string());
    }

    let domain = extracted.domains.first();
    if let Some(domain) = domain
        && rdap
            .get(domain)
            .and_then(|r| r.domain_age_days)
            .is_some_and(|age| (0..30).contains(&age))
    {
        score += 20;
        reasons.push("domain_age_lt_30d".to_string());
    }

    if extracted.hosts.len() >= 3 {
        score += 40;
        reasons.push("multi_host_beacon".to_string());
    }

    let score = clamp_score(score);
    let details = json!({
        "score": score,
        "reasons": reasons,
        "domain": domain,
        "dst_ip": extracted.ips.first(),
        "hosts_count": extracted.hosts.len(),
        "periodicity": periodicity_details,
    });

    ScoreResult { score, reasons, details }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_plus_multi_host_is_critical() {
        let timestamps: Vec<String> = (0..12)
            .map(|i| format!("2024-01-01T00:{:02}:00Z", i))
            .collect();
        let payload = json!({"timestamps": timestamps});
        let extracted = BeaconObservables {
            domains: vec!["evil.example.com".to_string()],
            ips: vec!["203.0.113.9".to_string()],
            hosts: vec!["h1".to_string(), "h2".to_string(), "h3".to_string()],
        };

        let result = score_beacon(&payload, &extracted, &HashMap::new());
        assert_eq!(result.score, 80);
        assert!(result.reasons.contains(&"periodicity_detected".to_string()));
        assert!(result.reasons.contains(&"multi_host_beacon".to_string()));
    }

    #[test]
    fn quiet_beacon_scores_zero() {
        let extracted = BeaconObservables::default();
        let result = score_beacon(&json!({}), &extracted, &HashMap::new());
        assert_eq!(result.score, 0);
    }
}
