//! Configuration management for certmon
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to layer a `certmon.toml` file, environment variables, and
//! command-line arguments over built-in defaults.

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// The set of domains whose certificates are monitored. Fixed at startup.
    pub domains: Vec<String>,
    /// Configuration for the per-domain monitor loops.
    pub monitor: MonitorConfig,
    /// Configuration for the TLS prober.
    pub probe: ProbeConfig,
    /// Configuration for the HTTP status/metrics server.
    pub server: ServerConfig,
    /// Configuration for Prometheus metrics exposition.
    pub metrics: MetricsConfig,
}

/// Configuration for the per-domain monitor loops.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MonitorConfig {
    /// Base interval between probe attempts, in seconds.
    pub interval_secs: u64,
    /// Upper bound for the random per-cycle jitter, in milliseconds.
    pub jitter_ms: u64,
}

/// Configuration for the TLS prober.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProbeConfig {
    /// The port to probe on each domain.
    pub port: u16,
    /// Overall connect + handshake timeout, in seconds.
    pub timeout_secs: u64,
}

/// Configuration for the HTTP status/metrics server.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// The address the server binds to, e.g. "127.0.0.1:8080".
    pub listen_address: String,
}

/// Configuration for Prometheus metrics exposition.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MetricsConfig {
    /// Whether to install the Prometheus recorder and serve `/metrics`.
    pub enabled: bool,
}

impl Config {
    /// Loads the application configuration by layering sources: defaults,
    /// TOML file, environment variables, and CLI arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| "certmon.toml".into());

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // Allow overriding with environment variables, e.g.
            // CERTMON_LOG_LEVEL=debug
            .merge(Env::prefixed("CERTMON_").split("__"))
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            domains: vec![],
            monitor: MonitorConfig {
                interval_secs: 10,
                jitter_ms: 5000,
            },
            probe: ProbeConfig::default(),
            server: ServerConfig {
                listen_address: "127.0.0.1:8080".to_string(),
            },
            metrics: MetricsConfig { enabled: true },
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            port: 443,
            timeout_secs: 10,
        }
    }
}
