//! Metrics exposition
//!
//! Sets up the Prometheus recorder and provides the `Metrics` handle the
//! rest of the application uses to publish observations. The headline series
//! is a per-domain gauge holding the certificate expiration as seconds since
//! the Unix epoch; probe outcomes are counted alongside it.

use chrono::{DateTime, Utc};
use metrics::Unit;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::error;

use crate::config::MetricsConfig;
use crate::core::MetricsSink;

/// The public API for the metrics system.
#[derive(Debug, Clone, Default)]
pub struct Metrics;

impl Metrics {
    /// Creates a new `Metrics` instance and registers descriptions for all
    /// supported metrics with the global recorder.
    pub fn new() -> Self {
        metrics::describe_gauge!(
            "tls_certificate_expiration_timestamp_seconds",
            Unit::Seconds,
            "TLS certificate expiration dates, in seconds since 1970-01-01 midnight UTC, by domain name."
        );
        metrics::describe_counter!(
            "probes_total",
            Unit::Count,
            "Total number of certificate probes performed, labeled by their outcome."
        );
        Self
    }

    /// Sets the expiration gauge for a domain.
    pub fn set_expiration(&self, domain: &str, expiration: DateTime<Utc>) {
        metrics::gauge!(
            "tls_certificate_expiration_timestamp_seconds",
            "domain" => domain.to_string()
        )
        .set(expiration.timestamp() as f64);
    }
}

impl MetricsSink for Metrics {
    fn observe(&self, domain: &str, expiration: DateTime<Utc>) {
        self.set_expiration(domain, expiration);
    }
}

/// Builder for the metrics system.
///
/// Installs the Prometheus recorder and hands back the render handle for the
/// HTTP server's `/metrics` route. When metrics are disabled (or the
/// recorder cannot be installed, e.g. a second app instance in one process)
/// the returned `Metrics` handle still works; its macro calls just hit the
/// no-op recorder.
pub struct MetricsBuilder {
    config: MetricsConfig,
}

impl MetricsBuilder {
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    pub fn build(self) -> (Metrics, Option<PrometheusHandle>) {
        if !self.config.enabled {
            return (Metrics::default(), None);
        }

        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        if let Err(e) = metrics::set_global_recorder(recorder) {
            error!("Failed to install Prometheus recorder: {}", e);
            return (Metrics::default(), None);
        }

        (Metrics::new(), Some(handle))
    }
}
