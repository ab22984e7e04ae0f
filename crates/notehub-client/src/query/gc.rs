//! Background collection of unused cache entries.
//!
//! ```rust,ignore
//! let mut janitor = CacheJanitor::new(client.clone());
//! let handle = janitor.start();
//! // ...
//! janitor.shutdown();
//! handle.await?;
//! ```

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use super::cache::QueryClient;

/// Periodically runs `QueryClient::gc`.
pub struct CacheJanitor {
    client: QueryClient,

    /// How often the cache is swept.
    interval: Duration,

    shutdown_tx: Option<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl CacheJanitor {
    /// Creates a janitor that sweeps every minute.
    pub fn new(client: QueryClient) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            client,
            interval: Duration::from_secs(60),
            shutdown_tx: Some(shutdown_tx),
            shutdown_rx,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Spawns the sweep loop.
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        let client = self.client.clone();
        let period = self.interval;
        let mut shutdown_rx = self.shutdown_rx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let collected = client.gc();
                        if collected > 0 {
                            info!(collected, remaining = client.len(), "collected unused cache entries");
                        } else {
                            debug!(entries = client.len(), "cache sweep found nothing to collect");
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("cache janitor shutting down");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Signals the sweep loop to stop.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{QueryConfig, QueryKey};

    #[tokio::test(start_paused = true)]
    async fn janitor_collects_and_stops() {
        let client = QueryClient::with_config(QueryConfig {
            stale_time: Duration::from_secs(1),
            gc_time: Duration::from_secs(5),
        });
        client.set_query_data(&QueryKey::new("note").with("a"), 1u32);

        let mut janitor = CacheJanitor::new(client.clone()).with_interval(Duration::from_secs(2));
        let handle = janitor.start();

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(client.len(), 1);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(client.is_empty());
        assert_eq!(client.stats().entries_collected, 1);

        janitor.shutdown();
        handle.await.unwrap();
    }
}
