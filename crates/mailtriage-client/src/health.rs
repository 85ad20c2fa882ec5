//! Periodic availability probe for the classification service.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use mailtriage_core::ClassificationBackend;

/// Last known availability of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    /// No probe has completed yet.
    Unknown,
    Online,
    Offline,
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiStatus::Unknown => write!(f, "unknown"),
            ApiStatus::Online => write!(f, "online"),
            ApiStatus::Offline => write!(f, "offline"),
        }
    }
}

/// Probes the backend once at start and then every `interval`.
pub struct HealthMonitor {
    backend: Arc<dyn ClassificationBackend>,
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(backend: Arc<dyn ClassificationBackend>, interval: Duration) -> Self {
        Self { backend, interval }
    }

    /// Single probe. Errors from the backend count as offline.
    pub async fn probe(&self) -> ApiStatus {
        match self.backend.health_check().await {
            Ok(true) => ApiStatus::Online,
            Ok(false) => ApiStatus::Offline,
            Err(e) => {
                debug!(error = %e, "Health check errored");
                ApiStatus::Offline
            }
        }
    }

    /// Start probing in the background.
    pub fn start(self) -> HealthMonitorHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (status_tx, status_rx) = watch::channel(ApiStatus::Unknown);

        tokio::spawn(async move {
            self.run(shutdown_rx, status_tx).await;
        });

        HealthMonitorHandle {
            shutdown_tx,
            status_rx,
        }
    }

    async fn run(self, mut shutdown_rx: mpsc::Receiver<()>, status_tx: watch::Sender<ApiStatus>) {
        info!(
            endpoint = self.backend.endpoint(),
            interval_secs = self.interval.as_secs(),
            "Health monitor started"
        );

        loop {
            let status = tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Health monitor shutting down");
                    break;
                }
                status = self.probe() => status,
            };
            let changed = status_tx.send_if_modified(|current| {
                if *current == status {
                    false
                } else {
                    *current = status;
                    true
                }
            });
            if changed {
                match status {
                    ApiStatus::Online => info!(endpoint = self.backend.endpoint(), "Classification service online"),
                    _ => warn!(endpoint = self.backend.endpoint(), "Classification service offline"),
                }
            }

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Health monitor shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

/// Handle to a running [`HealthMonitor`].
pub struct HealthMonitorHandle {
    shutdown_tx: mpsc::Sender<()>,
    status_rx: watch::Receiver<ApiStatus>,
}

impl HealthMonitorHandle {
    /// Current status.
    pub fn status(&self) -> ApiStatus {
        *self.status_rx.borrow()
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<ApiStatus> {
        self.status_rx.clone()
    }

    /// Stop the monitor.
    pub async fn shutdown(&self) -> Result<(), mpsc::error::SendError<()>> {
        self.shutdown_tx.send(()).await
    }
}
