//! Pure, I/O-free observable extractors for each alert source shape.

mod beacon;
mod dedup;
mod login;
mod phishing;

pub use beacon::{extract_beacon, BeaconObservables};
pub use login::{extract_login, LoginObservables};
pub use phishing::{extract_phishing, PhishingObservables};
