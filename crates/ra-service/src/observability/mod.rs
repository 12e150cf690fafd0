//! Observability: metric definitions and the Prometheus exporter.
//!
//! Identities are email addresses and never appear as metric labels; the
//! only labels are low-cardinality enums defined in `metrics`.

pub mod metrics;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return the handle backing the
/// `/metrics` endpoint. Returns `None` when a recorder is already installed
/// (tests spawn several servers in one process).
#[must_use]
pub fn install_prometheus_recorder() -> Option<PrometheusHandle> {
    let builder = PrometheusBuilder::new();
    builder.install_recorder().ok()
}
