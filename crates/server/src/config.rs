//! Process configuration, loaded entirely from the environment.
//!
//! Covers database/broker/result-backend URLs, webhook/admin keys, report
//! directory and PDF flag, and a metrics pushgateway URL. `soar-server` has
//! no relational database or external broker of its own (the in-process task
//! queue and in-memory `CaseStore` stand in for them), so those three URL
//! fields are accepted and surfaced for parity and for a future swap to a
//! real backend, but are not dialed by this binary.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// Process-wide configuration, loaded once at startup via [`Config::from_env`].
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub broker_url: String,
    pub result_backend_url: String,
    pub webhook_api_key: String,
    pub admin_api_key: String,
    pub report_dir: PathBuf,
    pub report_pdf: bool,
    pub metrics_pushgateway_url: Option<String>,
    pub blocklist_path: PathBuf,
    pub bad_domains_path: PathBuf,
    pub bad_ips_path: PathBuf,
    pub queue_workers: usize,
    pub queue_max_retries: u32,
    pub queue_retry_backoff: Duration,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup, so the defaulting
    /// and parsing rules can be unit-tested without touching process-global
    /// environment state (mutating that from tests races across the suite
    /// and, as of this edition, requires `unsafe`, which this workspace
    /// forbids outright).
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: env_or(&lookup, "SOAR_BIND_ADDR", "0.0.0.0:8080"),
            database_url: env_or(&lookup, "SOAR_DATABASE_URL", "memory://in-process"),
            broker_url: env_or(&lookup, "SOAR_BROKER_URL", "memory://in-process"),
            result_backend_url: env_or(&lookup, "SOAR_RESULT_BACKEND_URL", "memory://in-process"),
            webhook_api_key: env_or(&lookup, "SOAR_WEBHOOK_API_KEY", "dev-webhook-key"),
            admin_api_key: env_or(&lookup, "SOAR_ADMIN_API_KEY", "dev-admin-key"),
            report_dir: PathBuf::from(env_or(&lookup, "SOAR_REPORT_DIR", "/data/reports")),
            report_pdf: env_bool(&lookup, "SOAR_REPORT_PDF", false)?,
            metrics_pushgateway_url: lookup("SOAR_METRICS_PUSHGATEWAY_URL"),
            blocklist_path: PathBuf::from(env_or(&lookup, "SOAR_BLOCKLIST_PATH", "/data/blocklist.json")),
            bad_domains_path: PathBuf::from(env_or(
                &lookup,
                "SOAR_BAD_DOMAINS_PATH",
                "/data/feeds/bad_domains.txt",
            )),
            bad_ips_path: PathBuf::from(env_or(&lookup, "SOAR_BAD_IPS_PATH", "/data/feeds/bad_ips.txt")),
            queue_workers: env_parse(&lookup, "SOAR_QUEUE_WORKERS", 10)?,
            queue_max_retries: env_parse(&lookup, "SOAR_QUEUE_MAX_RETRIES", 3)?,
            queue_retry_backoff: Duration::from_millis(env_parse(
                &lookup,
                "SOAR_QUEUE_RETRY_BACKOFF_MS",
                500,
            )?),
        })
    }
}

fn env_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

fn env_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::Invalid(key, other.to_string())),
        },
    }
}

fn env_parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(key, raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert!(!config.report_pdf);
        assert_eq!(config.queue_workers, 10);
        assert!(config.metrics_pushgateway_url.is_none());
    }

    #[test]
    fn overrides_apply_when_set() {
        let config = Config::from_lookup(|key| match key {
            "SOAR_BIND_ADDR" => Some("127.0.0.1:9000".to_string()),
            "SOAR_REPORT_PDF" => Some("YES".to_string()),
            "SOAR_QUEUE_WORKERS" => Some("4".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert!(config.report_pdf);
        assert_eq!(config.queue_workers, 4);
    }

    #[test]
    fn rejects_unparseable_boolean() {
        let err = Config::from_lookup(|key| {
            (key == "SOAR_REPORT_PDF").then(|| "sideways".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("SOAR_REPORT_PDF", _)));
    }

    #[test]
    fn rejects_unparseable_integer() {
        let err = Config::from_lookup(|key| {
            (key == "SOAR_QUEUE_WORKERS").then(|| "many".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("SOAR_QUEUE_WORKERS", _)));
    }
}
