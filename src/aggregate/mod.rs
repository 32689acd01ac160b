//! Aggregate module
//!
//! Aggregate Root pattern implementation for Event Sourcing.
//!
//! Extended from the teacher's `Aggregate` trait (which only had `apply`)
//! with the `replay`/`sync`/`events` triad spec §4.4 requires: `apply` is
//! for command-time state changes and buffers the event as uncommitted;
//! `replay` is for rehydration from the log and never buffers; `sync` marks
//! a buffered event as durably persisted. This mirrors
//! `original_source/database/esdb/esdb.go`'s `Sync`/`Reply` pair.

pub mod wallet;

pub use wallet::WalletAggregate;

use uuid::Uuid;

/// Aggregate trait that all aggregates must implement
pub trait Aggregate: Sized + Default {
    /// The type of events this aggregate handles
    type Event;

    /// Get the aggregate type name (for storage)
    fn aggregate_type() -> &'static str;

    /// Get the aggregate ID
    fn id(&self) -> Uuid;

    /// Get the current version (number of events applied)
    fn version(&self) -> i64;

    /// Apply an event to update the aggregate state at command time,
    /// buffering it as uncommitted.
    fn apply(self, event: Self::Event) -> Self;

    /// Apply an event while rehydrating from the log. Updates `version` and
    /// state exactly like `apply`, but never touches the uncommitted
    /// buffer: a replayed aggregate's `uncommitted` is always empty.
    fn replay(self, event: Self::Event) -> Self;

    /// Mark the oldest buffered event as durably persisted, removing it
    /// from the uncommitted buffer. Called once per event after a
    /// successful append.
    fn sync(&mut self);

    /// The events produced since the last append, oldest first.
    fn events(&self) -> &[Self::Event];

    /// Check if a snapshot should be created
    fn should_snapshot(&self) -> bool {
        const SNAPSHOT_INTERVAL: i64 = 100;
        self.version() > 0 && self.version() % SNAPSHOT_INTERVAL == 0
    }
}
