//! The main application logic, decoupled from the entry point.

use anyhow::{bail, Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::{
    config::Config,
    core::{ExpirationProber, MetricsSink},
    metrics::{Metrics, MetricsBuilder},
    monitor::DomainMonitor,
    probe::TlsProber,
    server::StatusServer,
    table::ExpirationTable,
    task_manager::TaskManager,
};

/// A handle to the running application, containing all its task handles.
pub struct App {
    task_manager: TaskManager,
    local_addr: SocketAddr,
    table: Arc<ExpirationTable>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// The address the status/metrics server actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The shared expiration table, for inspection in tests.
    pub fn table(&self) -> Arc<ExpirationTable> {
        self.table.clone()
    }

    /// Waits for the shutdown signal and then gracefully shuts down all tasks.
    pub async fn run(self) -> Result<()> {
        let mut shutdown_rx = self.task_manager.get_shutdown_rx();
        shutdown_rx.changed().await.ok();
        info!("Shutdown signal received. Waiting for tasks to complete...");

        self.task_manager.shutdown().await;
        Ok(())
    }
}

/// Builder for the main application.
///
/// Separates constructing the application's components from running them,
/// and provides a way to override components for testing purposes.
pub struct AppBuilder {
    config: Config,
    prober_override: Option<Arc<dyn ExpirationProber>>,
    sink_override: Option<Arc<dyn MetricsSink>>,
}

impl AppBuilder {
    /// Creates a new `AppBuilder` with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            prober_override: None,
            sink_override: None,
        }
    }

    /// Overrides the TLS prober for testing.
    pub fn prober_override(mut self, prober: Arc<dyn ExpirationProber>) -> Self {
        self.prober_override = Some(prober);
        self
    }

    /// Overrides the metrics sink for testing.
    pub fn sink_override(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink_override = Some(sink);
        self
    }

    /// Builds and initializes all application components, returning a
    /// runnable `App`.
    pub async fn build(self, shutdown_rx: watch::Receiver<()>) -> Result<App> {
        let config = self.config;
        if config.domains.is_empty() {
            bail!("no domains configured; set `domains` in certmon.toml or pass --domains");
        }

        let task_manager = TaskManager::new(shutdown_rx);

        // Metrics recorder and render handle for /metrics.
        let (metrics, prom_handle) = MetricsBuilder::new(config.metrics.clone()).build();

        // The table is created with one "not yet probed" entry per domain;
        // the set of keys never changes after this point.
        let table = Arc::new(ExpirationTable::new(config.domains.iter().cloned()));

        let prober = match self.prober_override {
            Some(prober) => prober,
            None => Arc::new(TlsProber::new(&config.probe)) as Arc<dyn ExpirationProber>,
        };
        let sink = match self.sink_override {
            Some(sink) => sink,
            None => Arc::new(metrics) as Arc<dyn MetricsSink>,
        };

        // One independent monitor task per domain.
        for domain in &config.domains {
            debug!(domain = %domain, "Starting monitor");
            let monitor = DomainMonitor::new(
                domain.clone(),
                &config.monitor,
                prober.clone(),
                table.clone(),
                sink.clone(),
            );
            task_manager.spawn(
                format!("Monitor:{domain}"),
                monitor.run(task_manager.get_shutdown_rx()),
            );
        }

        // Bind eagerly so the bound address is known before `run` is awaited
        // (tests bind to port 0).
        let listener = TcpListener::bind(&config.server.listen_address)
            .await
            .with_context(|| format!("failed to bind {}", config.server.listen_address))?;
        let local_addr = listener.local_addr()?;
        info!("Status server listening on http://{}", local_addr);

        let server = StatusServer::new(
            listener,
            table.clone(),
            prom_handle,
            task_manager.get_shutdown_rx(),
        );
        task_manager.spawn("StatusServer", server.run());

        info!(
            "certmon initialized successfully. Monitoring {} domains.",
            config.domains.len()
        );

        Ok(App {
            task_manager,
            local_addr,
            table,
        })
    }
}
