//! Postgres-backed `ReadStorePort`.
//!
//! Grounded in `original_source/database/sql/wallet.go`'s `storeWallet`
//! (`INSERT ... ON CONFLICT (id) DO UPDATE`) and `getWallet`.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::domain::{Balance, Wallet, WalletId};
use crate::ports::read_store::{ReadStoreError, ReadStorePort};

#[derive(Debug, Clone)]
pub struct PostgresReadStore {
    pool: PgPool,
}

impl PostgresReadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_wallet(row: &sqlx::postgres::PgRow) -> Result<(Wallet, i64), ReadStoreError> {
        let id: uuid::Uuid = row
            .try_get("id")
            .map_err(|e| ReadStoreError::Transport(e.into()))?;
        let name: String = row
            .try_get("name")
            .map_err(|e| ReadStoreError::Transport(e.into()))?;
        let balance_raw: i64 = row
            .try_get("balance")
            .map_err(|e| ReadStoreError::Transport(e.into()))?;
        let version: i64 = row
            .try_get("version")
            .map_err(|e| ReadStoreError::Transport(e.into()))?;
        let balance =
            Balance::new(balance_raw).map_err(|e| ReadStoreError::Transport(anyhow::anyhow!(e)))?;
        Ok((Wallet::new(WalletId::from(id), name, balance), version))
    }
}

#[async_trait]
impl ReadStorePort for PostgresReadStore {
    async fn store_wallet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        wallet: &Wallet,
        version: i64,
    ) -> Result<(), ReadStoreError> {
        sqlx::query(
            r#"
            INSERT INTO wallets (id, name, balance, version)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET name = excluded.name, balance = excluded.balance, version = excluded.version
            "#,
        )
        .bind(wallet.id.as_uuid())
        .bind(&wallet.name)
        .bind(wallet.balance.get())
        .bind(version)
        .execute(&mut **tx)
        .await
        .map_err(|e| ReadStoreError::Transport(e.into()))?;

        Ok(())
    }

    async fn get_wallet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: WalletId,
    ) -> Result<(Wallet, i64), ReadStoreError> {
        let row = sqlx::query("SELECT id, name, balance, version FROM wallets WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| ReadStoreError::Transport(e.into()))?
            .ok_or(ReadStoreError::NotFound(id))?;

        Self::row_to_wallet(&row)
    }
}

impl PostgresReadStore {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
