//! Background removal of expired view sessions
//!
//! Dedup windows that have closed carry no information, but nothing else
//! deletes them. The sweeper bounds the session table by purging them on
//! a fixed interval.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info};

use crate::storage::Storage;

pub struct SessionSweeper {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SessionSweeper {
    /// Start sweeping every `interval_secs` seconds
    pub fn spawn(storage: Arc<dyn Storage>, interval_secs: u64) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_secs(interval_secs.max(1)));
            // The first tick fires immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        sweep_once(&storage).await;
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!("Shutdown signal received, final session sweep...");
                            sweep_once(&storage).await;
                            break;
                        }
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Stop the task after one last sweep
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            error!("Session sweeper task failed: {}", e);
        }
    }
}

/// Purge expired sessions once; failures are logged, never propagated
pub async fn sweep_once(storage: &Arc<dyn Storage>) -> u64 {
    match storage.purge_expired_sessions(Utc::now()).await {
        Ok(0) => 0,
        Ok(purged) => {
            debug!(purged, "Purged expired view sessions");
            purged
        }
        Err(e) => {
            error!("Failed to purge expired view sessions: {}", e);
            0
        }
    }
}
