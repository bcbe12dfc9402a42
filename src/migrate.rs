//! Record table bootstrap.
//!
//! The app that writes health records owns the real schema; this creates
//! the subset the corpus builder reads so `hctx init` and the tests have
//! something to query.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the record tables and their indexes. Idempotent.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS symptom_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL,
            symptom TEXT NOT NULL,
            severity INTEGER,
            location TEXT,
            notes TEXT,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS activity_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL,
            activity TEXT NOT NULL,
            duration_minutes INTEGER,
            intensity TEXT,
            notes TEXT,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    for (table, index) in [
        ("messages", "idx_messages_session"),
        ("symptom_logs", "idx_symptom_logs_session"),
        ("activity_logs", "idx_activity_logs_session"),
    ] {
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {} ON {}(session_id, created_at)",
            index, table
        ))
        .execute(pool)
        .await?;
    }

    Ok(())
}
