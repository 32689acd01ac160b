//! Read-Through Cache (C8).
//!
//! Grounded in `original_source/cache.go`'s `WithCache[Item]`: a `Read`/`Set`
//! cache wrapping a fallback loader, default 5-minute expiration, 10-minute
//! purge sweep (`patrickmn/go-cache`'s constructor arguments). `dashmap`
//! stands in for `go-cache`'s internal sharded map; since `dashmap` has no
//! built-in expiry, each entry additionally carries its insertion time and
//! expiry is checked both on read and by the periodic sweep (reusing the
//! teacher's `JobScheduler` idiom from `src/jobs/mod.rs`, see
//! `crate::jobs`).
//!
//! Per the Open Question decision recorded in `DESIGN.md`, a fallback error
//! is propagated to the caller rather than silently swallowed into a
//! zero-value aggregate — the original's `if err != nil { return *new(Item),
//! nil }` was a latent bug, not a semantic this service reproduces.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use thiserror::Error;

use crate::aggregate::{Aggregate, WalletAggregate};
use crate::domain::WalletId;
use crate::ports::event_store::{EventStorePort, LoadError};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
pub const PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("fallback load failed: {0}")]
    Fallback(#[from] LoadError),
}

struct Entry {
    aggregate: WalletAggregate,
    inserted_at: Instant,
}

/// Read-through cache over the event store. Never populated by the
/// projection subscriber (C7) — only a read miss triggers a fallback load,
/// per spec §4.8.
pub struct WalletCache<S: EventStorePort> {
    entries: DashMap<WalletId, Entry>,
    event_store: Arc<S>,
    ttl: Duration,
}

impl<S: EventStorePort> WalletCache<S> {
    pub fn new(event_store: Arc<S>) -> Self {
        Self::with_ttl(event_store, DEFAULT_TTL)
    }

    pub fn with_ttl(event_store: Arc<S>, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            event_store,
            ttl,
        }
    }

    pub async fn get(&self, id: WalletId) -> Result<WalletAggregate, CacheError> {
        if let Some(entry) = self.entries.get(&id) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Ok(entry.aggregate.clone());
            }
        }

        let aggregate = self.load(id).await?;
        self.entries.insert(
            id,
            Entry {
                aggregate: aggregate.clone(),
                inserted_at: Instant::now(),
            },
        );
        Ok(aggregate)
    }

    async fn load(&self, id: WalletId) -> Result<WalletAggregate, CacheError> {
        let events = self.event_store.load(id, 0).await?;
        let mut aggregate = WalletAggregate::default();
        for stored in events {
            aggregate = aggregate.replay(stored.payload);
        }
        Ok(aggregate)
    }

    /// Removes every entry older than `ttl`. Runs on the 10-minute sweep
    /// (`crate::jobs::JobScheduler`), independent of reads, so memory is
    /// bounded even for wallets nobody reads again.
    pub fn purge_expired(&self) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventMetadata, StoredEvent, WalletEvent};
    use crate::ports::event_store::{AppendError, EventAppeared, NewEvent, SubscribeError};
    use async_trait::async_trait;
    use futures::stream::BoxStream;
    use std::sync::Mutex;

    struct FakeEventStore {
        events: Mutex<Vec<StoredEvent>>,
        fail: bool,
    }

    #[async_trait]
    impl EventStorePort for FakeEventStore {
        async fn append(&self, _events: Vec<NewEvent>) -> Result<(), AppendError> {
            Ok(())
        }

        async fn load(
            &self,
            aggregate_id: WalletId,
            _from_version: i64,
        ) -> Result<Vec<StoredEvent>, LoadError> {
            if self.fail {
                return Err(LoadError::Transport(anyhow::anyhow!("store unavailable")));
            }
            Ok(self
                .events
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.aggregate_id == aggregate_id)
                .cloned()
                .collect())
        }

        fn subscribe_all(&self) -> BoxStream<'static, Result<EventAppeared, SubscribeError>> {
            Box::pin(futures::stream::empty())
        }
    }

    fn stored(id: WalletId, version: i64, payload: WalletEvent) -> StoredEvent {
        StoredEvent {
            aggregate_type: "Wallet".into(),
            aggregate_id: id,
            version,
            global_sequence: version,
            event_type: payload.event_type().to_string(),
            payload,
            metadata: EventMetadata::default(),
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn miss_falls_back_to_replay_and_populates() {
        let id = WalletId::new();
        let store = Arc::new(FakeEventStore {
            events: Mutex::new(vec![stored(
                id,
                1,
                WalletEvent::WalletInitialized {
                    id,
                    name: "alice".into(),
                    balance: crate::domain::Balance::ZERO,
                },
            )]),
            fail: false,
        });
        let cache = WalletCache::new(store);

        assert!(cache.is_empty());
        let agg = cache.get(id).await.unwrap();
        assert_eq!(agg.version(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn fallback_error_propagates_instead_of_zero_value() {
        let id = WalletId::new();
        let store = Arc::new(FakeEventStore {
            events: Mutex::new(vec![]),
            fail: true,
        });
        let cache = WalletCache::new(store);

        let result = cache.get(id).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn expired_entry_is_reloaded_not_reused() {
        let id = WalletId::new();
        let store = Arc::new(FakeEventStore {
            events: Mutex::new(vec![stored(
                id,
                1,
                WalletEvent::WalletInitialized {
                    id,
                    name: "alice".into(),
                    balance: crate::domain::Balance::ZERO,
                },
            )]),
            fail: false,
        });
        let cache = WalletCache::with_ttl(store, Duration::from_millis(1));
        cache.get(id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        // Not a correctness assertion about content (still version 1), just
        // that the stale-path code runs without panicking and refreshes
        // `inserted_at`.
        let agg = cache.get(id).await.unwrap();
        assert_eq!(agg.version(), 1);
    }

    #[test]
    fn purge_expired_removes_stale_entries() {
        let store = Arc::new(FakeEventStore {
            events: Mutex::new(vec![]),
            fail: false,
        });
        let cache: WalletCache<FakeEventStore> = WalletCache::with_ttl(store, Duration::from_millis(1));
        cache.entries.insert(
            WalletId::new(),
            Entry {
                aggregate: WalletAggregate::default(),
                inserted_at: Instant::now() - Duration::from_secs(1),
            },
        );
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());
    }
}
