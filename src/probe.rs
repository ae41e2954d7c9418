//! TLS expiration probing
//!
//! Connects to a domain on its TLS port, completes a handshake with the
//! platform's standard web trust roots, and extracts the earliest `notAfter`
//! timestamp from the presented certificate chain. Hostname verification is
//! part of the rustls handshake, so a name mismatch surfaces as a handshake
//! error rather than being silently ignored.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rustls::{ClientConfig, RootCertStore};
use rustls_pki_types::ServerName;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use x509_parser::prelude::*;

use crate::config::ProbeConfig;
use crate::core::ExpirationProber;

/// Errors that can occur while probing a domain's certificate chain.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid server name {0:?}")]
    InvalidName(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("TLS handshake failed: {0}")]
    Handshake(String),
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("server presented no certificates")]
    EmptyChain,
    #[error("failed to parse certificate: {0}")]
    CertParse(String),
}

/// Probes domains over TLS using the webpki root store.
pub struct TlsProber {
    connector: TlsConnector,
    port: u16,
    timeout: Duration,
}

impl TlsProber {
    /// Creates a prober from the probe section of the configuration.
    pub fn new(config: &ProbeConfig) -> Self {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls_config = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        Self {
            connector: TlsConnector::from(Arc::new(tls_config)),
            port: config.port,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    async fn connect_and_read_chain(
        &self,
        domain: &str,
    ) -> Result<Vec<Vec<u8>>, ProbeError> {
        let server_name = ServerName::try_from(domain)
            .map_err(|_| ProbeError::InvalidName(domain.to_string()))?
            .to_owned();

        let stream = TcpStream::connect((domain, self.port))
            .await
            .map_err(|e| ProbeError::Connect(e.to_string()))?;

        // Hostname verification happens inside the handshake, against
        // `server_name`.
        let tls_stream = self
            .connector
            .connect(server_name, stream)
            .await
            .map_err(|e| ProbeError::Handshake(e.to_string()))?;

        let (_io, connection) = tls_stream.into_inner();
        let chain: Vec<Vec<u8>> = connection
            .peer_certificates()
            .unwrap_or_default()
            .iter()
            .map(|der| der.as_ref().to_vec())
            .collect();

        if chain.is_empty() {
            return Err(ProbeError::EmptyChain);
        }
        Ok(chain)
    }
}

#[async_trait]
impl ExpirationProber for TlsProber {
    async fn probe(&self, domain: &str) -> Result<DateTime<Utc>, ProbeError> {
        let chain = timeout(self.timeout, self.connect_and_read_chain(domain))
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))??;
        chain_expiration(&chain)
    }
}

/// Returns the earliest `notAfter` across a chain of DER-encoded certificates.
///
/// The chain's weakest link determines overall validity, so the minimum is
/// what operators care about.
pub fn chain_expiration(chain: &[Vec<u8>]) -> Result<DateTime<Utc>, ProbeError> {
    let mut earliest: Option<DateTime<Utc>> = None;
    for der in chain {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| ProbeError::CertParse(e.to_string()))?;
        let not_after = cert.validity().not_after.timestamp();
        let not_after = DateTime::<Utc>::from_timestamp(not_after, 0)
            .ok_or_else(|| ProbeError::CertParse("notAfter out of range".to_string()))?;
        earliest = Some(match earliest {
            Some(current) if current <= not_after => current,
            _ => not_after,
        });
    }
    earliest.ok_or(ProbeError::EmptyChain)
}
