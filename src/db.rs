//! Database module
//!
//! Connection verification and startup schema checks against the Postgres
//! instance backing C1 (events) and C3 (wallets). Adapted from the
//! teacher's `db.rs`, trimmed of the system-account/seed checks specific to
//! its auth domain.

use sqlx::PgPool;

pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Checks that the tables the event store and read store depend on exist.
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let required_tables = ["events", "wallets"];

    for table in required_tables {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    Ok(true)
}
