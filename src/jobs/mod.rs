//! Scheduled Jobs
//!
//! Background maintenance jobs run on a fixed schedule. Reworked from the
//! teacher's `JobScheduler` (`tokio::select!` over several `interval`s,
//! `run_all_once` for manual triggering) down to the single maintenance
//! task this domain needs: the cache's periodic purge sweep (spec §4.8,
//! `original_source/cache.go`'s 10-minute `go-cache` purge interval).

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::cache::{WalletCache, PURGE_INTERVAL};
use crate::ports::event_store::EventStorePort;

#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    pub cache_purge_interval: Duration,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            cache_purge_interval: PURGE_INTERVAL,
        }
    }
}

pub struct JobScheduler<S: EventStorePort> {
    cache: Arc<WalletCache<S>>,
    config: JobSchedulerConfig,
}

impl<S: EventStorePort + 'static> JobScheduler<S> {
    pub fn new(cache: Arc<WalletCache<S>>) -> Self {
        Self {
            cache,
            config: JobSchedulerConfig::default(),
        }
    }

    pub fn with_config(cache: Arc<WalletCache<S>>, config: JobSchedulerConfig) -> Self {
        Self { cache, config }
    }

    /// Start the job scheduler in the background. Returns a handle the
    /// caller can await during graceful shutdown.
    pub fn start(self, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run(shutdown).await;
        })
    }

    async fn run(&self, shutdown: CancellationToken) {
        tracing::info!("job scheduler started");
        let mut purge_interval = interval(self.config.cache_purge_interval);

        loop {
            tokio::select! {
                _ = purge_interval.tick() => {
                    let purged = self.cache.purge_expired();
                    if purged > 0 {
                        tracing::info!(purged, "purged expired cache entries");
                    }
                }
                _ = shutdown.cancelled() => {
                    tracing::info!("job scheduler shutting down");
                    return;
                }
            }
        }
    }

    /// Run the purge sweep once, for manual triggering or tests.
    pub fn run_once(&self) -> usize {
        self.cache.purge_expired()
    }
}
