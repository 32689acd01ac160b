//! Domain module
//!
//! Core wallet-ledger types: validated value newtypes, the event alphabet,
//! the business-rule error taxonomy, and the plain `Wallet` projection
//! shape shared by the aggregate and the read model.

pub mod amount;
pub mod error;
pub mod events;
pub mod ids;
pub mod wallet;

pub use amount::{Amount, AmountError, Balance, BalanceError};
pub use error::DomainError;
pub use events::{EventMetadata, StoredEvent, WalletEvent};
pub use ids::{InvalidWalletId, TaskId, WalletId};
pub use wallet::Wallet;
