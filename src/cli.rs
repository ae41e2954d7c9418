//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using
//! the `clap` crate. These arguments are parsed at startup and then merged
//! with the configuration from the `certmon.toml` file and environment
//! variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Tag, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Monitors the TLS certificate expiration dates of a set of domains.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Comma-separated list of domains to monitor.
    #[arg(long, value_name = "DOMAINS")]
    pub domains: Option<String>,

    /// Address for the status/metrics HTTP server, e.g. 0.0.0.0:8080.
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<String>,

    /// Base interval between probes of the same domain, in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Port to probe on each domain.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(domains) = &self.domains {
            let domains: Vec<Value> = domains
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(Value::from)
                .collect();
            dict.insert("domains".into(), Value::Array(Tag::Default, domains));
        }

        if let Some(listen) = &self.listen {
            let mut server = Dict::new();
            server.insert("listen_address".into(), Value::from(listen.clone()));
            dict.insert("server".into(), Value::Dict(Tag::Default, server));
        }

        if let Some(interval) = self.interval {
            let mut monitor = Dict::new();
            monitor.insert("interval_secs".into(), Value::from(interval));
            dict.insert("monitor".into(), Value::Dict(Tag::Default, monitor));
        }

        if let Some(port) = self.port {
            let mut probe = Dict::new();
            probe.insert("port".into(), Value::from(port));
            dict.insert("probe".into(), Value::Dict(Tag::Default, probe));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
