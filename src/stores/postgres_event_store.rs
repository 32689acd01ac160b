//! Postgres-backed `EventStorePort`.
//!
//! Grounded in `lactam6-financeATP/src/event_store/repository.rs`
//! (`try_append_atomic`'s transaction shape, `get_current_version`'s
//! `MAX(version)` check, `load_aggregate`'s ordered replay query). The
//! snapshot/idempotency-key machinery that file also has is dropped:
//! snapshot compaction is an explicit Non-goal, and this domain has no
//! idempotency-key concept in its write path (the task pipeline's at-least-
//! once retries are handled by the optimistic-concurrency check alone).
//!
//! `subscribe_all` (no teacher counterpart — `projection/service.rs` runs
//! synchronous in-request updates, not a tailing consumer) polls a
//! monotonic `global_sequence` column, following `original_source/event.go`'s
//! framing of the global subscription as "stable under replay" rather than
//! push-delivered.

use std::time::Duration;

use async_stream::try_stream;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::domain::{EventMetadata, StoredEvent, WalletEvent, WalletId};
use crate::ports::event_store::{
    AppendError, EventAppeared, EventStorePort, LoadError, NewEvent, SubscribeError,
};

#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_version(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        aggregate_id: WalletId,
    ) -> Result<i64, AppendError> {
        let version: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(version) FROM events WHERE aggregate_type = 'Wallet' AND aggregate_id = $1",
        )
        .bind(aggregate_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppendError::Transport(e.into()))?
        .flatten();

        Ok(version.unwrap_or(0))
    }

    fn row_to_stored_event(row: &sqlx::postgres::PgRow) -> Result<StoredEvent, anyhow::Error> {
        let aggregate_id: uuid::Uuid = row.try_get("aggregate_id")?;
        let payload: serde_json::Value = row.try_get("event_data")?;
        let metadata: serde_json::Value = row.try_get("metadata")?;
        Ok(StoredEvent {
            aggregate_type: row.try_get("aggregate_type")?,
            aggregate_id: WalletId::from(aggregate_id),
            version: row.try_get("version")?,
            global_sequence: row.try_get("global_sequence")?,
            event_type: row.try_get("event_type")?,
            payload: serde_json::from_value::<WalletEvent>(payload)?,
            metadata: serde_json::from_value::<EventMetadata>(metadata).unwrap_or_default(),
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }
}

#[async_trait::async_trait]
impl EventStorePort for PostgresEventStore {
    async fn append(&self, events: Vec<NewEvent>) -> Result<(), AppendError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppendError::Transport(e.into()))?;

        for event in &events {
            let current = self.current_version(&mut tx, event.aggregate_id).await?;
            if current != event.expected_version {
                return Err(AppendError::VersionConflict {
                    aggregate_id: event.aggregate_id,
                    expected: event.expected_version,
                    found: current,
                });
            }

            let event_data = serde_json::to_value(&event.payload)
                .map_err(|e| AppendError::Transport(e.into()))?;
            let metadata = serde_json::to_value(&event.metadata)
                .map_err(|e| AppendError::Transport(e.into()))?;
            let new_version = event.expected_version + 1;

            sqlx::query(
                r#"
                INSERT INTO events (
                    aggregate_type, aggregate_id, version, event_type, event_data, metadata
                )
                VALUES ('Wallet', $1, $2, $3, $4, $5)
                "#,
            )
            .bind(event.aggregate_id.as_uuid())
            .bind(new_version)
            .bind(event.payload.event_type())
            .bind(event_data)
            .bind(metadata)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppendError::Transport(e.into()))?;
        }

        tx.commit().await.map_err(|e| AppendError::Transport(e.into()))?;
        Ok(())
    }

    async fn load(
        &self,
        aggregate_id: WalletId,
        from_version: i64,
    ) -> Result<Vec<StoredEvent>, LoadError> {
        let rows = sqlx::query(
            r#"
            SELECT aggregate_type, aggregate_id, version, global_sequence,
                   event_type, event_data, metadata, created_at
            FROM events
            WHERE aggregate_type = 'Wallet' AND aggregate_id = $1 AND version > $2
            ORDER BY version ASC
            "#,
        )
        .bind(aggregate_id.as_uuid())
        .bind(from_version)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LoadError::Transport(e.into()))?;

        rows.iter()
            .map(Self::row_to_stored_event)
            .collect::<Result<Vec<_>, _>>()
            .map_err(LoadError::Transport)
    }

    fn subscribe_all(&self) -> BoxStream<'static, Result<EventAppeared, SubscribeError>> {
        let pool = self.pool.clone();
        Box::pin(try_stream! {
            let mut cursor: i64 = 0;
            loop {
                let rows = sqlx::query(
                    r#"
                    SELECT aggregate_type, aggregate_id, version, global_sequence,
                           event_type, event_data, metadata, created_at
                    FROM events
                    WHERE global_sequence > $1
                    ORDER BY global_sequence ASC
                    LIMIT 100
                    "#,
                )
                .bind(cursor)
                .fetch_all(&pool)
                .await
                .map_err(|e| SubscribeError::Transport(e.into()))?;

                if rows.is_empty() {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    continue;
                }

                for row in &rows {
                    let stored = Self::row_to_stored_event(row)
                        .map_err(SubscribeError::Transport)?;
                    cursor = stored.global_sequence;
                    let stream_id = format!("{}_{}", stored.aggregate_type, stored.aggregate_id);
                    yield EventAppeared { stream_id, event: stored };
                }
            }
        })
    }
}
