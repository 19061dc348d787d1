use std::time::Duration;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::TokioAsyncResolver;
use serde::Serialize;
use tracing::instrument;

/// Result of resolving all six record types for a single domain.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DnsResult {
    #[serde(rename = "A")]
    pub a: Vec<String>,
    #[serde(rename = "AAAA")]
    pub aaaa: Vec<String>,
    #[serde(rename = "CNAME")]
    pub cname: Vec<String>,
    #[serde(rename = "MX")]
    pub mx: Vec<String>,
    #[serde(rename = "NS")]
    pub ns: Vec<String>,
    #[serde(rename = "TXT")]
    pub txt: Vec<String>,
}

async fn query(resolver: &TokioAsyncResolver, domain: &str, record_type: RecordType) -> Vec<String> {
    match resolver.lookup(domain, record_type).await {
        Ok(lookup) => lookup.iter().map(|rdata| rdata.to_string()).collect(),
        Err(_) => Vec::new(),
    }
}

/// Query A, AAAA, CNAME, MX, NS, and TXT records for `domain` with a combined
/// lifetime of 3 seconds.
///
/// Never fails: a single record type's failure (NXDOMAIN, timeout, servfail)
/// yields an empty list for that type, and exceeding the overall deadline
/// yields an all-empty result rather than propagating to the caller.
#[instrument(skip_all, fields(%domain))]
pub async fn dns_enrich(domain: &str) -> DnsResult {
    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

    let lookups = async {
        let (a, aaaa, cname, mx, ns, txt) = tokio::join!(
            query(&resolver, domain, RecordType::A),
            query(&resolver, domain, RecordType::AAAA),
            query(&resolver, domain, RecordType::CNAME),
            query(&resolver, domain, RecordType::MX),
            query(&resolver, domain, RecordType::NS),
            query(&resolver, domain, RecordType::TXT),
        );
        DnsResult { a, aaaa, cname, mx, ns, txt }
    };

    tokio::time::timeout(Duration::from_secs(3), lookups)
        .await
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unresolvable_domain_yields_empty_result_not_panic() {
        // A domain under a reserved TLD that will never resolve in CI.
        let result = dns_enrich("definitely-does-not-exist.invalid").await;
        assert!(result.a.is_empty());
        assert!(result.aaaa.is_empty());
    }
}
