//! Core domain types and service traits for certmon
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern component interactions throughout the application.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::probe::ProbeError;

/// Last-known certificate state for a single monitored domain.
///
/// `expiration` is `None` until the first successful probe; a failed probe
/// never overwrites a previously observed expiration. `last_error` carries
/// the most recent probe failure so that persistently failing domains are
/// observable on the status page instead of silently going stale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainStatus {
    /// Earliest `notAfter` across the chain seen by the last successful probe.
    pub expiration: Option<DateTime<Utc>>,
    /// When the last successful probe completed.
    pub last_success: Option<DateTime<Utc>>,
    /// The error from the most recent probe, if it failed.
    pub last_error: Option<String>,
}

/// Determines the expiration date of a domain's TLS certificate chain
#[async_trait]
pub trait ExpirationProber: Send + Sync {
    /// Probes `domain` and returns the earliest `notAfter` timestamp across
    /// the full certificate chain presented during the TLS handshake.
    ///
    /// # Returns
    /// * `Ok(timestamp)` of the soonest-to-expire certificate in the chain
    /// * `Err` for connection, handshake, hostname-verification, or
    ///   certificate-parsing failures
    async fn probe(&self, domain: &str) -> Result<DateTime<Utc>, ProbeError>;
}

/// Receives expiration observations, keyed by domain name.
///
/// Implemented by the Prometheus-backed metrics layer; tests substitute
/// counting fakes. Implementations must be internally thread-safe.
pub trait MetricsSink: Send + Sync {
    fn observe(&self, domain: &str, expiration: DateTime<Utc>);
}
