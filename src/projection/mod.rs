//! Projection Subscriber (C7).
//!
//! Grounded in `original_source/event.go`'s `Subscription` function: parse
//! the stream id to recover the aggregate id, check the read model's
//! freshness against the incoming event's revision, and either apply
//! incrementally or rebuild from scratch. Not adapted from the teacher's
//! `projection/service.rs`, which runs synchronous in-request
//! double-entry updates rather than a standalone tailing consumer — this
//! module is new, built in the teacher's idiom (sqlx transactions,
//! `tracing::instrument`, `tokio::select!`-driven restart loop).

use std::sync::Arc;

use futures::StreamExt;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::aggregate::WalletAggregate;
use crate::domain::WalletId;
use crate::ports::event_store::{EventAppeared, EventStorePort, SubscribeError};
use crate::ports::read_store::ReadStorePort;

/// The subscriber's lifecycle, per spec §4.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    Running,
    Dropped,
    Restarting,
    Cancelled,
}

pub struct ProjectionSubscriber<E: EventStorePort, R: ReadStorePort> {
    event_store: Arc<E>,
    read_store: Arc<R>,
    pool: PgPool,
}

impl<E: EventStorePort, R: ReadStorePort> ProjectionSubscriber<E, R> {
    pub fn new(event_store: Arc<E>, read_store: Arc<R>, pool: PgPool) -> Self {
        Self {
            event_store,
            read_store,
            pool,
        }
    }

    /// Parses `Wallet_<uuid>` into its aggregate id. Splits on the first
    /// `_` only (`splitn(2, '_')`) rather than a full split — the Go
    /// original's `strings.Split(streamId, "_")[1]` breaks the moment any
    /// id contains an underscore itself; see `DESIGN.md` Open Question #2.
    fn parse_stream_id(stream_id: &str) -> Option<WalletId> {
        let mut parts = stream_id.splitn(2, '_');
        let _aggregate_type = parts.next()?;
        let id = parts.next()?;
        WalletId::parse(id).ok()
    }

    /// Drives the subscription until cancelled, transparently restarting on
    /// drop per the `Running -> Dropped -> Restarting -> Running` state
    /// machine.
    pub async fn run(&self, shutdown: CancellationToken) -> SubscriberState {
        loop {
            match self.run_once(shutdown.clone()).await {
                SubscriberState::Cancelled => return SubscriberState::Cancelled,
                SubscriberState::Dropped => {
                    tracing::warn!("projection subscription dropped, restarting");
                }
                _ => {}
            }
        }
    }

    #[tracing::instrument(skip(self, shutdown))]
    async fn run_once(&self, shutdown: CancellationToken) -> SubscriberState {
        let mut stream = self.event_store.subscribe_all();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return SubscriberState::Cancelled,
                next = stream.next() => {
                    match next {
                        Some(Ok(appeared)) => {
                            if let Err(err) = self.handle_event(appeared).await {
                                tracing::error!(error = %err, "projection upsert failed, restarting subscription");
                                return SubscriberState::Dropped;
                            }
                        }
                        Some(Err(SubscribeError::Dropped)) => return SubscriberState::Dropped,
                        Some(Err(SubscribeError::Transport(err))) => {
                            tracing::error!(error = %err, "event store transport error, restarting subscription");
                            return SubscriberState::Dropped;
                        }
                        None => return SubscriberState::Dropped,
                    }
                }
            }
        }
    }

    /// Applies one appeared event to the read model, choosing between the
    /// incremental and rebuild paths per the freshness rule (spec §4.7):
    /// incremental only when the read model's `version - 1` equals the
    /// event's own stream `revision`; otherwise a full rebuild via replay.
    async fn handle_event(&self, appeared: EventAppeared) -> anyhow::Result<()> {
        let aggregate_id = match Self::parse_stream_id(&appeared.stream_id) {
            Some(id) => id,
            None => {
                tracing::warn!(stream_id = %appeared.stream_id, "could not parse stream id, skipping");
                return Ok(());
            }
        };
        let revision = appeared.event.version;

        let mut tx = self.pool.begin().await?;
        let current = self.read_store.get_wallet(&mut tx, aggregate_id).await.ok();

        // Freshness rule is the literal spec/`event.go` formula, not the
        // naive "next contiguous revision" check: `W.version - 1 == revision`.
        let is_fresh = matches!(&current, Some((_, version)) if *version - 1 == revision);

        let (wallet, version) = if is_fresh {
            let (current_wallet, current_version) = current.expect("checked above");
            let next_wallet = WalletAggregate::apply_event(Some(current_wallet), &appeared.event.payload)
                .ok_or_else(|| anyhow::anyhow!("apply_event unexpectedly dropped wallet state"))?;
            (next_wallet, current_version + 1)
        } else {
            tracing::debug!(wallet_id = %aggregate_id, "stale or missing read model, rebuilding from event log");
            self.rebuild(aggregate_id).await?
        };

        self.read_store.store_wallet(&mut tx, &wallet, version).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn rebuild(&self, aggregate_id: WalletId) -> anyhow::Result<(crate::domain::Wallet, i64)> {
        use crate::aggregate::Aggregate;

        let events = self.event_store.load(aggregate_id, 0).await?;
        let mut aggregate = WalletAggregate::default();
        for stored in events {
            aggregate = aggregate.replay(stored.payload);
        }
        let wallet = aggregate
            .wallet()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no events found for wallet {aggregate_id}"))?;
        Ok((wallet, aggregate.version()))
    }
}
