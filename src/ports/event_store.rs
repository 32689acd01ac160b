//! Event Store Port (C1).
//!
//! Grounded in `lactam6-financeATP/src/event_store/{repository,error}.rs`
//! for the conflict/retry shape, and in the get-eventually `Streamer`/
//! `Appender`/`Store` async_trait pattern (`other_examples/...event-store.rs.rs`)
//! for the port-trait split between append and replay.

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::domain::{StoredEvent, WalletEvent, WalletId};

#[derive(Debug, Error)]
pub enum AppendError {
    #[error("version conflict on wallet {aggregate_id}: expected {expected}, found {found}")]
    VersionConflict {
        aggregate_id: WalletId,
        expected: i64,
        found: i64,
    },
    #[error("event store transport error: {0}")]
    Transport(#[source] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("event store transport error: {0}")]
    Transport(#[source] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error("subscription dropped")]
    Dropped,
    #[error("event store transport error: {0}")]
    Transport(#[source] anyhow::Error),
}

/// One message delivered by `subscribe_all`'s global feed.
#[derive(Debug, Clone)]
pub struct EventAppeared {
    /// The stream identifier as carried on the wire, e.g. `Wallet_<uuid>`.
    pub stream_id: String,
    pub event: StoredEvent,
}

/// A single event queued for append, prior to being assigned its durable
/// version and global sequence.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub aggregate_id: WalletId,
    /// The version this event expects to occupy; used for the optimistic
    /// concurrency check (`expected == current stream version`).
    pub expected_version: i64,
    pub payload: WalletEvent,
    pub metadata: crate::domain::EventMetadata,
}

#[async_trait]
pub trait EventStorePort: Send + Sync {
    /// Atomically appends `events` to their respective streams. All events
    /// in the batch must belong to the same aggregate stream and be
    /// contiguous with `expected_version`; fails the whole batch with
    /// `VersionConflict` if the stream has moved since the caller loaded it.
    async fn append(&self, events: Vec<NewEvent>) -> Result<(), AppendError>;

    /// Loads events for `aggregate_id` with `version > from_version`, in
    /// ascending version order.
    async fn load(
        &self,
        aggregate_id: WalletId,
        from_version: i64,
    ) -> Result<Vec<StoredEvent>, LoadError>;

    /// A long-lived stream over every event ever and hereafter appended, in
    /// global-commit order, excluding system events. Terminates with
    /// `SubscribeError::Dropped` if the underlying subscription is lost;
    /// callers are expected to resubscribe.
    fn subscribe_all(&self) -> BoxStream<'static, Result<EventAppeared, SubscribeError>>;
}
