//! Prometheus metrics exporter wiring.
//!
//! Installs the global [`metrics`] recorder and exposes a [`PrometheusHandle`]
//! for the `/metrics` scrape endpoint. The counters/histograms themselves are
//! recorded at their call sites across the workspace (`soar-playbook`,
//! `soar-action`, `soar-queue`, `soar-enrich`, and this crate's own
//! webhook/admin handlers); this module only builds the recorder.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the process-wide Prometheus recorder and return a handle that
/// renders the current snapshot on demand.
///
/// A pushgateway URL is accepted in [`crate::config::Config`], but only the
/// pull-based `/metrics` scrape path is wired up; push-gateway support would
/// be added here once a target environment needs it.
pub fn install() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}
