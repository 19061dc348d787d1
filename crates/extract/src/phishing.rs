use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value as Json;

use crate::dedup::dedup_preserve_order;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(https?://[^\s<>'"()\]]+)"#).expect("valid regex"));
static DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://([^/:\s]+)").expect("valid regex"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\w.+-]+@[\w-]+\.[\w.-]+)").expect("valid regex"));

/// Observables extracted from a phishing (email) alert payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhishingObservables {
    pub urls: Vec<String>,
    pub domains: Vec<String>,
    pub emails: Vec<String>,
}

fn str_field(payload: &Json, key: &str) -> String {
    payload
        .get(key)
        .and_then(Json::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Extract urls, their host domains, and email addresses from a phishing payload.
///
/// Does no I/O and never fails; malformed or missing fields simply yield empty
/// lists. `urls` are scanned from `body` only; `domains` are the host portion
/// of each extracted url; `emails` are scanned across `sender`, `recipient`,
/// `body`, and `subject`, plus the verbatim sender/recipient when they
/// themselves look like an address.
#[must_use]
pub fn extract_phishing(payload: &Json) -> PhishingObservables {
    let body = str_field(payload, "body");
    let subject = str_field(payload, "subject");
    let sender = str_field(payload, "sender");
    let recipient = str_field(payload, "recipient");

    let urls = dedup_preserve_order(
        URL_RE
            .find_iter(&body)
            .map(|m| m.as_str().to_string()),
    );

    let mut domains = Vec::new();
    let mut seen_domains = std::collections::HashSet::new();
    for url in &urls {
        if let Some(caps) = DOMAIN_RE.captures(url)
            && let Some(host) = caps.get(1)
        {
            let d = host.as_str().to_lowercase();
            if seen_domains.insert(d.clone()) {
                domains.push(d);
            }
        }
    }

    let mut raw_emails = Vec::new();
    for field in [&sender, &recipient, &body, &subject] {
        raw_emails.extend(EMAIL_RE.find_iter(field).map(|m| m.as_str().to_string()));
    }
    if sender.contains('@') {
        raw_emails.push(sender.clone());
    }
    if recipient.contains('@') {
        raw_emails.push(recipient.clone());
    }
    let emails = dedup_preserve_order(
        raw_emails
            .into_iter()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty()),
    );

    PhishingObservables {
        urls,
        domains,
        emails,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_urls_domains_and_emails() {
        let payload = serde_json::json!({
            "subject": "Verify your account",
            "sender": "security@micros0ft-support.com",
            "recipient": "u@c.com",
            "body": "Verify here: https://micros0ft-support.com/login and also https://micros0ft-support.com/login",
        });

        let out = extract_phishing(&payload);
        assert_eq!(out.urls, vec!["https://micros0ft-support.com/login"]);
        assert_eq!(out.domains, vec!["micros0ft-support.com"]);
        assert!(out.emails.contains(&"security@micros0ft-support.com".to_string()));
        assert!(out.emails.contains(&"u@c.com".to_string()));
    }

    #[test]
    fn missing_fields_yield_empty_output() {
        let out = extract_phishing(&serde_json::json!({}));
        assert!(out.urls.is_empty());
        assert!(out.domains.is_empty());
        assert!(out.emails.is_empty());
    }

    #[test]
    fn dedup_preserves_first_seen_order() {
        let payload = serde_json::json!({
            "body": "https://b.com/1 https://a.com/2 https://b.com/3",
        });
        let out = extract_phishing(&payload);
        assert_eq!(out.domains, vec!["b.com", "a.com"]);
    }
}
