//! certmon - TLS certificate expiration monitor
//!
//! Periodically checks the TLS certificate expiration dates of a configured
//! set of domains and exposes the results as a human-readable status page
//! and Prometheus metrics.

use anyhow::Result;
use certmon::{app::App, cli::Cli, config::Config};
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment,
    // and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("certmon starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Domains: {}", config.domains.join(", "));
    info!("Probe Interval: {}s", config.monitor.interval_secs);
    info!("Probe Jitter: up to {}ms", config.monitor.jitter_ms);
    info!("Probe Port: {}", config.probe.port);
    info!("Probe Timeout: {}s", config.probe.timeout_secs);
    info!("Listen Address: {}", config.server.listen_address);
    info!(
        "Metrics: {}",
        if config.metrics.enabled {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    info!("-------------------------------------------------------");

    let (shutdown_tx, shutdown_rx) = watch::channel(());

    let app = App::builder(config).build(shutdown_rx).await?;
    let app_handle = tokio::spawn(app.run());

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Shutting down gracefully...");

    shutdown_tx
        .send(())
        .expect("Failed to send shutdown signal");

    if let Err(e) = app_handle.await? {
        error!("Application failed during shutdown: {:?}", e);
    }

    info!("All tasks shut down. Exiting.");
    Ok(())
}
