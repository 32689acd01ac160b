//! Business-rule error taxonomy.
//!
//! Trimmed from the teacher's `domain/error.rs`: dropped every
//! auth/idempotency/user-management variant (Non-goals) and added the
//! wallet-ledger-specific ones (`UnsupportedEvent`, `VersionConflict` framed
//! in terms of a wallet stream rather than an account).

use thiserror::Error;

use super::amount::{AmountError, BalanceError};

#[derive(Debug, Error, Clone)]
pub enum DomainError {
    #[error("wallet name must not be empty")]
    InvalidName,

    #[error(transparent)]
    InvalidAmount(#[from] AmountError),

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },

    #[error("invalid wallet id: {0}")]
    InvalidWalletId(String),

    #[error("wallet not found: {0}")]
    WalletNotFound(String),

    #[error("invalid transaction type: {0}")]
    InvalidTransactionType(String),

    #[error("unsupported event type: {0}")]
    UnsupportedEvent(String),

    #[error("version conflict on wallet {aggregate_id}: expected {expected}, found {found}")]
    VersionConflict {
        aggregate_id: String,
        expected: i64,
        found: i64,
    },

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<BalanceError> for DomainError {
    fn from(err: BalanceError) -> Self {
        match err {
            BalanceError::Negative(_) => DomainError::InsufficientBalance {
                required: 0,
                available: 0,
            },
            BalanceError::InsufficientBalance {
                required,
                available,
            } => DomainError::InsufficientBalance {
                required,
                available,
            },
        }
    }
}

impl DomainError {
    /// True for errors a worker should never retry: the input itself is
    /// wrong and retrying it would fail identically every time. `Transport`
    /// joins `VersionConflict` as retriable — a dropped connection is a
    /// property of the attempt, not the request.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DomainError::VersionConflict { .. } | DomainError::Transport(_))
    }
}
