//! HTTP status and metrics server
//!
//! An `axum`-based server exposing the human-readable status page at `/`
//! and the Prometheus exposition endpoint at `/metrics`. The server listens
//! for the process-wide shutdown signal and terminates cleanly.

use axum::{response::Html, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, trace};

use crate::status::{render_page, sort_snapshot};
use crate::table::ExpirationTable;

/// Serves the status page and, when metrics are enabled, `/metrics`.
pub struct StatusServer {
    listener: TcpListener,
    table: Arc<ExpirationTable>,
    prom_handle: Option<PrometheusHandle>,
    shutdown_rx: watch::Receiver<()>,
}

impl StatusServer {
    /// Creates a new `StatusServer` but does not spawn it.
    ///
    /// # Arguments
    ///
    /// * `listener` - A `TcpListener` that has already been bound.
    /// * `table` - The shared expiration table backing the status page.
    /// * `prom_handle` - Render handle for `/metrics`, absent when disabled.
    /// * `shutdown_rx` - A watch channel receiver for graceful shutdown.
    pub fn new(
        listener: TcpListener,
        table: Arc<ExpirationTable>,
        prom_handle: Option<PrometheusHandle>,
        shutdown_rx: watch::Receiver<()>,
    ) -> Self {
        Self {
            listener,
            table,
            prom_handle,
            shutdown_rx,
        }
    }

    /// Returns a future that runs the server until shutdown is signaled.
    pub fn run(mut self) -> impl Future<Output = ()> {
        let table = self.table;
        let mut app = Router::new().route(
            "/",
            get(move || {
                let table = table.clone();
                // The snapshot is taken under the lock; sorting and
                // rendering happen on the copy.
                async move { Html(render_page(&sort_snapshot(table.snapshot()))) }
            }),
        );
        if let Some(handle) = self.prom_handle {
            app = app.route("/metrics", get(move || async move { handle.render() }));
        }

        async move {
            tokio::select! {
                biased;
                _ = self.shutdown_rx.changed() => {
                    trace!("Status server received shutdown signal.");
                }
                result = axum::serve(self.listener, app.into_make_service()) => {
                    if let Err(e) = result {
                        error!("Status server error: {}", e);
                    }
                }
            }
            trace!("Status server task finished.");
        }
    }
}
