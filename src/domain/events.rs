//! Wallet domain events and the generic stored-event envelope.
//!
//! Mirrors the teacher's `domain/events.rs` tagged-enum pattern
//! (`#[serde(tag = "type")]`), collapsed to the single `WalletEvent` enum
//! this domain needs. There is no open, string-keyed event-constructor
//! registry the way `original_source/wallet.go`'s `init()` builds one —
//! because `WalletEvent` is a closed sum type, `serde`'s internally-tagged
//! `Deserialize` impl already is the registry (see `SPEC_FULL.md` §9).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::amount::{Amount, Balance};
use super::ids::WalletId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WalletEvent {
    WalletInitialized {
        id: WalletId,
        name: String,
        balance: Balance,
    },
    Deposit {
        wallet_id: WalletId,
        amount: Amount,
    },
    Withdraw {
        wallet_id: WalletId,
        amount: Amount,
    },
}

impl WalletEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            WalletEvent::WalletInitialized { .. } => "WalletInitialized",
            WalletEvent::Deposit { .. } => "Deposit",
            WalletEvent::Withdraw { .. } => "Withdraw",
        }
    }

    pub fn wallet_id(&self) -> WalletId {
        match self {
            WalletEvent::WalletInitialized { id, .. } => *id,
            WalletEvent::Deposit { wallet_id, .. } => *wallet_id,
            WalletEvent::Withdraw { wallet_id, .. } => *wallet_id,
        }
    }
}

/// Generic envelope persisted by the event store, one row per appended
/// event. Mirrors the teacher's `StoredEvent` wrapper, renamed `aggregate`
/// terms to this domain's single aggregate kind (`"Wallet"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub aggregate_type: String,
    pub aggregate_id: WalletId,
    /// Position of this event within its own stream, starting at 1.
    pub version: i64,
    /// Position of this event in the store-wide commit order, used by the
    /// projection subscriber's `subscribe_all` tail.
    pub global_sequence: i64,
    pub event_type: String,
    pub payload: WalletEvent,
    pub metadata: EventMetadata,
    pub created_at: DateTime<Utc>,
}

/// Tracing-only context carried alongside a domain event. Trimmed from the
/// teacher's `OperationContext` (which also carried `api_key_id`/
/// `client_ip` for its auth middleware — dropped here, auth is a Non-goal).
/// Participates in no invariant; never read by the apply table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventMetadata {
    pub correlation_id: Option<String>,
}

impl EventMetadata {
    pub fn with_correlation_id(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: Some(correlation_id.into()),
        }
    }

    pub fn ensure_correlation_id(&mut self) -> &str {
        if self.correlation_id.is_none() {
            self.correlation_id = Some(uuid::Uuid::new_v4().to_string());
        }
        self.correlation_id.as_deref().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_correlation_id_generates_once_then_keeps_it() {
        let mut metadata = EventMetadata::default();
        assert!(metadata.correlation_id.is_none());

        let first = metadata.ensure_correlation_id().to_string();
        assert!(!first.is_empty());

        let second = metadata.ensure_correlation_id().to_string();
        assert_eq!(first, second);
    }

    #[test]
    fn with_correlation_id_sets_the_given_value() {
        let metadata = EventMetadata::with_correlation_id("req-123");
        assert_eq!(metadata.correlation_id.as_deref(), Some("req-123"));
    }
}
