//! Read Store Port (C3).
//!
//! Grounded in `original_source/database/sql/wallet.go` (`StoreWallet`/
//! `GetWallet`, upsert-on-conflict semantics) and the teacher's
//! `sqlx::Transaction`-scoped repository methods.

use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use thiserror::Error;

use crate::domain::{Wallet, WalletId};

#[derive(Debug, Error)]
pub enum ReadStoreError {
    #[error("wallet not found: {0}")]
    NotFound(WalletId),
    #[error("read store transport error: {0}")]
    Transport(#[source] anyhow::Error),
}

#[async_trait]
pub trait ReadStorePort: Send + Sync {
    /// Upserts a row keyed by `wallet.id`. Last writer wins on `id`; the
    /// caller supplies the transaction so the projection subscriber can
    /// compose this with its own commit boundary.
    async fn store_wallet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        wallet: &Wallet,
        version: i64,
    ) -> Result<(), ReadStoreError>;

    async fn get_wallet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: WalletId,
    ) -> Result<(Wallet, i64), ReadStoreError>;
}
