//! Manages the lifecycle of all spawned tasks in the application.

use futures::future::join_all;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// A centralized manager for all spawned tasks.
///
/// Spawns tasks under a name (monitors get one per domain), keeps their
/// `JoinHandle`s, and joins them all on shutdown so the process never exits
/// with work in flight.
#[derive(Clone, Debug)]
pub struct TaskManager {
    handles: Arc<Mutex<Vec<(String, JoinHandle<()>)>>>,
    shutdown_rx: watch::Receiver<()>,
}

impl TaskManager {
    pub fn new(shutdown_rx: watch::Receiver<()>) -> Self {
        Self {
            handles: Arc::new(Mutex::new(Vec::new())),
            shutdown_rx,
        }
    }

    /// Spawns a new task and adds its handle to the manager.
    pub fn spawn<F>(&self, name: impl Into<String>, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        debug!(task_name = %name, "Spawning task");
        let handle = tokio::spawn(future);
        self.handles.lock().unwrap().push((name, handle));
    }

    /// Returns a clone of the shutdown receiver.
    pub fn get_shutdown_rx(&self) -> watch::Receiver<()> {
        self.shutdown_rx.clone()
    }

    /// Waits for all managed tasks to complete.
    pub async fn shutdown(self) {
        let handles: Vec<_> = self.handles.lock().unwrap().drain(..).collect();
        info!(
            "TaskManager shutting down. Waiting for {} tasks to complete...",
            handles.len()
        );

        let (names, handles): (Vec<String>, Vec<JoinHandle<()>>) =
            handles.into_iter().unzip();
        let results = join_all(handles).await;

        let mut panicked = 0;
        for (name, result) in names.iter().zip(results) {
            match result {
                Ok(_) => debug!(task_name = %name, "Task shut down gracefully."),
                Err(e) => {
                    error!(task_name = %name, "Task panicked during shutdown: {:?}", e);
                    panicked += 1;
                }
            }
        }

        if panicked == 0 {
            info!("All tasks shut down gracefully.");
        } else {
            error!("{} tasks panicked during shutdown", panicked);
        }
    }
}
