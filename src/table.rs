//! Shared expiration table
//!
//! The single point of truth for last-known certificate state, written by the
//! per-domain monitors and read by the status renderer. One mutex guards the
//! whole map; critical sections are limited to map access and never span
//! network I/O or formatting.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::core::DomainStatus;

/// Mutex-guarded mapping from domain name to its last-known status.
///
/// Keys are fixed at construction: one entry per configured domain,
/// pre-populated as "not yet probed". Entries are updated in place and never
/// removed. Each domain has exactly one writer (its monitor task); readers
/// take point-in-time snapshots.
#[derive(Debug)]
pub struct ExpirationTable {
    entries: Mutex<HashMap<String, DomainStatus>>,
}

impl ExpirationTable {
    /// Creates a table with one "not yet probed" entry per domain.
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = domains
            .into_iter()
            .map(|d| (d.into(), DomainStatus::default()))
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Records a successful probe: updates the expiration and success time
    /// and clears any previous error. Writes to domains that were not
    /// configured at construction are ignored.
    pub fn record_success(&self, domain: &str, expiration: DateTime<Utc>, at: DateTime<Utc>) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(status) = entries.get_mut(domain) {
            status.expiration = Some(expiration);
            status.last_success = Some(at);
            status.last_error = None;
        }
    }

    /// Records a failed probe. The last-known expiration is retained so the
    /// status page keeps showing the most recent good observation.
    pub fn record_failure(&self, domain: &str, error: &str) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(status) = entries.get_mut(domain) {
            status.last_error = Some(error.to_string());
        }
    }

    /// Returns a consistent point-in-time copy of the table, in no particular
    /// order. Callers iterate and format without holding the lock.
    pub fn snapshot(&self) -> Vec<(String, DomainStatus)> {
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .map(|(domain, status)| (domain.clone(), status.clone()))
            .collect()
    }
}
