use std::collections::{HashMap, HashSet};

use serde_json::{json, Value as Json};
use soar_core::clamp_score;
use soar_enrich::RdapResult;
use soar_extract::PhishingObservables;

use crate::ScoreResult;

const SUSPICIOUS_TLDS: &[&str] = &["zip", "top", "click", "xyz", "icu", "kim", "gq", "tk"];
const CREDENTIAL_KEYWORDS: &[&str] = &["login", "verify", "password", "mfa", "account", "reset"];
const TYPOSQUAT_BRANDS: &[&str] = &["microsoft", "paypal", "google", "apple", "amazon"];

fn looks_like_typosquat(domain: &str) -> bool {
    let d = domain.to_lowercase();
    let normalized = d.replace('-', "").replace('0', "o").replace('1', "l");
    TYPOSQUAT_BRANDS
        .iter()
        .any(|brand| normalized.contains(brand) && !d.ends_with(&format!("{brand}.com")))
}

/// Score a phishing/email case.
///
/// `rdap` maps each extracted domain to its RDAP enrichment result; absent
/// entries are treated as "no signal" for that domain.
#[must_use]
pub fn score_phishing(
    payload: &Json,
    extracted: &PhishingObservables,
    rdap: &HashMap<String, RdapResult>,
    bad_domains: &HashSet<String>,
) -> ScoreResult {
    let mut score: i32 = 0;
    let mut reasons = Vec::new();
    let body = payload.get("body").and_then(Json::as_str).unwrap_or_default().to_lowercase();

    let young_domain = extracted.domains.iter().any(|d| {
        rdap.get(d)
            .and_then(|r| r.domain_age_days)
            .is_some_and(|age| (0..7).contains(&age))
    });
    if young_domain {
        score += 20;
        reasons.push("domain_age_lt_7d".to_string());
    }

    let suspicious_tld = extracted
        .domains
        .iter()
        .any(|d| d.rsplit('.').next().is_some_and(|tld| SUSPICIOUS_TLDS.contains(&tld)) && d.contains('.'));
    if suspicious_tld {
        score += 10;
        reasons.push("suspicious_tld".to_string());
    }

    let credential_keywords = extracted
        .urls
        .iter()
        .any(|u| CREDENTIAL_KEYWORDS.iter().any(|k| u.to_lowercase().contains(k)))
        || CREDENTIAL_KEYWORDS.iter().any(|k| body.contains(k));
    if credential_keywords {
        score += 15;
        reasons.push("credential_keywords".to_string());
    }

    let typosquat = extracted.domains.iter().any(|d| looks_like_typosquat(d));
    if typosquat {
        score += 15;
        reasons.push("typosquat_heuristic".to_string());
    }

    let threatfeed_match = extracted.domains.iter().any(|d| bad_domains.contains(d));
    if threatfeed_match {
        score += 50;
        reasons.push("threatfeed_match".to_string());
    }

    let sender = payload.get("sender").and_then(Json::as_str).unwrap_or_default().to_lowercase();
    let sender_display = payload
        .get("sender_display")
        .and_then(Json::as_str)
        .unwrap_or_default()
        .to_lowercase();
    if !sender_display.is_empty()
        && let Some((_, sender_domain)) = sender.split_once('@')
        && !sender_domain.is_empty()
        && !sender_display.contains(sender_domain)
    {
        score += 10;
        reasons.push("sender_display_mismatch".to_string());
    }

    let score = clamp_score(score);
    let details = json!({
        "score": score,
        "reasons": reasons,
        "domains": extracted.domains,
        "urls": extracted.urls,
    });

    ScoreResult { score, reasons, details }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(domains: &[&str], urls: &[&str]) -> PhishingObservables {
        PhishingObservables {
            urls: urls.iter().map(|s| s.to_string()).collect(),
            domains: domains.iter().map(|s| s.to_string()).collect(),
            emails: Vec::new(),
        }
    }

    #[test]
    fn typosquat_and_credential_keywords_score_high_severity() {
        let payload = json!({
            "subject": "Verify your account",
            "sender": "security@micros0ft-support.com",
            "body": "Verify here: https://micros0ft-support.com/login",
        });
        let extracted = obs(&["micros0ft-support.com"], &["https://micros0ft-support.com/login"]);
        let result = score_phishing(&payload, &extracted, &HashMap::new(), &HashSet::new());

        assert!(result.reasons.contains(&"typosquat_heuristic".to_string()));
        assert!(result.reasons.contains(&"credential_keywords".to_string()));
        assert!(result.score >= 30);
    }

    #[test]
    fn threatfeed_match_pushes_to_critical() {
        let payload = json!({"sender": "a@b.com", "body": "https://bad.zip/login"});
        let extracted = obs(&["bad.zip"], &["https://bad.zip/login"]);
        let mut bad = HashSet::new();
        bad.insert("bad.zip".to_string());

        let result = score_phishing(&payload, &extracted, &HashMap::new(), &bad);
        assert!(result.score >= 80);
        assert!(result.reasons.contains(&"threatfeed_match".to_string()));
    }

    #[test]
    fn score_clamps_at_one_hundred() {
        let payload = json!({
            "sender": "a@micros0ft.com",
            "sender_display": "Totally Legit",
            "body": "login verify password mfa account reset https://bad.zip/a",
        });
        let extracted = obs(&["bad.zip"], &["https://bad.zip/a"]);
        let mut bad = HashSet::new();
        bad.insert("bad.zip".to_string());
        let mut rdap = HashMap::new();
        rdap.insert(
            "bad.zip".to_string(),
            RdapResult { domain_age_days: Some(2), ..Default::default() },
        );

        let result = score_phishing(&payload, &extracted, &rdap, &bad);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn benign_payload_scores_zero() {
        let payload = json!({"sender": "a@b.com", "body": "hello there"});
        let extracted = obs(&[], &[]);
        let result = score_phishing(&payload, &extracted, &HashMap::new(), &HashSet::new());
        assert_eq!(result.score, 0);
        assert!(result.reasons.is_empty());
    }
}
