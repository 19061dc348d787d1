//! Network intelligence enrichers: DNS, RDAP, and local threat-feed
//! lookups. Every enricher has a hard per-call deadline and never propagates
//! failures to the caller -- they are captured as structured error entries.

pub mod dns;
pub mod error;
pub mod rdap;
pub mod threatfeed;

pub use dns::{dns_enrich, DnsResult};
pub use error::{EnrichError, EnrichErrorEntry};
pub use rdap::{rdap_domain, RdapEvent, RdapResult};
pub use threatfeed::load_feed;
