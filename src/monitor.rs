//! Per-domain monitoring loops
//!
//! One independent task per configured domain. Each cycle waits the base
//! interval, sleeps a random jitter so many domains never probe in the same
//! instant, probes, and writes the result into the shared table. Monitors
//! never coordinate with each other; the only shared resource is the table.

use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::core::{ExpirationProber, MetricsSink};
use crate::table::ExpirationTable;

/// Monitors a single domain for the lifetime of the process.
pub struct DomainMonitor {
    domain: String,
    prober: Arc<dyn ExpirationProber>,
    table: Arc<ExpirationTable>,
    sink: Arc<dyn MetricsSink>,
    interval: Duration,
    max_jitter: Duration,
}

impl DomainMonitor {
    pub fn new(
        domain: String,
        config: &MonitorConfig,
        prober: Arc<dyn ExpirationProber>,
        table: Arc<ExpirationTable>,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            domain,
            prober,
            table,
            sink,
            // A zero interval is clamped; tokio's interval requires a
            // non-zero period.
            interval: Duration::from_secs(config.interval_secs.max(1)),
            max_jitter: Duration::from_millis(config.jitter_ms),
        }
    }

    /// Runs the monitor loop until the shutdown signal fires.
    ///
    /// The shutdown receiver is checked at every suspension point (interval
    /// tick, jitter sleep, and the probe itself), so the task exits promptly
    /// and never leaves a partial write behind.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<()>) {
        debug!(domain = %self.domain, "Monitor started");
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                _ = ticker.tick() => {}
            }

            let jitter = self.draw_jitter();
            if !jitter.is_zero() {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = sleep(jitter) => {}
                }
            }

            let result = tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                result = self.prober.probe(&self.domain) => result,
            };

            match result {
                Ok(expiration) => {
                    debug!(domain = %self.domain, %expiration, "Probe succeeded");
                    metrics::counter!("probes_total", "result" => "success").increment(1);
                    self.table
                        .record_success(&self.domain, expiration, Utc::now());
                    self.sink.observe(&self.domain, expiration);
                }
                Err(error) => {
                    // The previous expiration value is retained; the failure
                    // is recorded so the status page can show it.
                    warn!(domain = %self.domain, %error, "Probe failed");
                    metrics::counter!("probes_total", "result" => "failure").increment(1);
                    self.table.record_failure(&self.domain, &error.to_string());
                }
            }
        }

        info!(domain = %self.domain, "Monitor shut down");
    }

    fn draw_jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..max_ms))
    }
}
