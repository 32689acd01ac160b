//! Command (C5) and query (C9) services — the only callers of the command
//! aggregates and the only writers of uncommitted events into the event
//! store.

pub mod command;
pub mod query;

pub use command::{CreateWalletRequest, CreateWalletService, PostTransactionRequest, PostTransactionService};
pub use query::{GetTaskService, GetWalletError, GetWalletService};
