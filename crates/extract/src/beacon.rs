use serde_json::Value as Json;

use crate::dedup::dedup_preserve_order;

/// Observables extracted from a network-beacon alert payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeaconObservables {
    pub domains: Vec<String>,
    pub ips: Vec<String>,
    pub hosts: Vec<String>,
}

/// Extract the destination domain/ip and host list from a beacon payload.
///
/// `dst_domain` is lowercased, `dst_ip` is trimmed, and `hosts` are lowercased
/// and deduplicated preserving first-seen order.
#[must_use]
pub fn extract_beacon(payload: &Json) -> BeaconObservables {
    let domain = payload
        .get("dst_domain")
        .and_then(Json::as_str)
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    let ip = payload
        .get("dst_ip")
        .and_then(Json::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    let hosts = payload
        .get("hosts")
        .and_then(Json::as_array)
        .map(|arr| {
            dedup_preserve_order(
                arr.iter()
                    .filter_map(Json::as_str)
                    .map(|h| h.trim().to_lowercase())
                    .filter(|h| !h.is_empty()),
            )
        })
        .unwrap_or_default();

    let mut out = BeaconObservables {
        domains: Vec::new(),
        ips: Vec::new(),
        hosts,
    };
    if !domain.is_empty() {
        out.domains.push(domain);
    }
    if !ip.is_empty() {
        out.ips.push(ip);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_domain_ip_and_hosts() {
        let payload = serde_json::json!({
            "dst_domain": "Evil.Example.com",
            "dst_ip": " 203.0.113.9 ",
            "hosts": ["Host-A", "host-b", "host-a"],
        });
        let out = extract_beacon(&payload);
        assert_eq!(out.domains, vec!["evil.example.com"]);
        assert_eq!(out.ips, vec!["203.0.113.9"]);
        assert_eq!(out.hosts, vec!["host-a", "host-b"]);
    }

    #[test]
    fn missing_fields_yield_empty_output() {
        let out = extract_beacon(&serde_json::json!({}));
        assert!(out.domains.is_empty());
        assert!(out.ips.is_empty());
        assert!(out.hosts.is_empty());
    }
}
