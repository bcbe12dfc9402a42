//! Read-only access to persisted health records.
//!
//! The [`RecordStore`] trait is everything the corpus builder needs from
//! the database: three queries, each either scoped to one session or capped
//! to the most recent records across all sessions. [`SqliteRecordStore`]
//! implements it over the app's SQLite file; tests swap in their own
//! implementations to simulate outages.
//!
//! # Ordering
//!
//! | Scope | Order | Limit |
//! |-------|-------|-------|
//! | `Some(session)` | `created_at` ascending | none |
//! | `None` | `created_at` descending (newest first) | `cap` |

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::models::{ActivityLog, MessageRecord, Role, SymptomLog};

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn messages(&self, session: Option<&str>, cap: usize) -> Result<Vec<MessageRecord>>;

    async fn symptom_logs(&self, session: Option<&str>, cap: usize) -> Result<Vec<SymptomLog>>;

    async fn activity_logs(&self, session: Option<&str>, cap: usize)
        -> Result<Vec<ActivityLog>>;
}

/// [`RecordStore`] backed by an `sqlx` SQLite pool.
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// `true` if the database answers a trivial query.
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    async fn fetch(
        &self,
        columns: &str,
        table: &str,
        session: Option<&str>,
        cap: usize,
    ) -> Result<Vec<sqlx::sqlite::SqliteRow>> {
        let rows = match session {
            Some(session_id) => {
                let sql = format!(
                    "SELECT {} FROM {} WHERE session_id = ? ORDER BY created_at ASC, id ASC",
                    columns, table
                );
                sqlx::query(&sql)
                    .bind(session_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM {} ORDER BY created_at DESC, id DESC LIMIT ?",
                    columns, table
                );
                sqlx::query(&sql)
                    .bind(cap as i64)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows)
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn messages(&self, session: Option<&str>, cap: usize) -> Result<Vec<MessageRecord>> {
        let rows = self
            .fetch("session_id, role, content, created_at", "messages", session, cap)
            .await?;

        let records = rows
            .iter()
            .map(|row| {
                let role: String = row.try_get("role")?;
                Ok(MessageRecord {
                    session_id: row.try_get("session_id")?,
                    role: Role::from_db(&role),
                    content: row.try_get("content")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(records)
    }

    async fn symptom_logs(&self, session: Option<&str>, cap: usize) -> Result<Vec<SymptomLog>> {
        let rows = self
            .fetch(
                "session_id, symptom, severity, location, notes, created_at",
                "symptom_logs",
                session,
                cap,
            )
            .await?;

        let logs = rows
            .iter()
            .map(|row| {
                Ok(SymptomLog {
                    session_id: row.try_get("session_id")?,
                    symptom: row.try_get("symptom")?,
                    severity: row.try_get("severity")?,
                    location: row.try_get("location")?,
                    notes: row.try_get("notes")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(logs)
    }

    async fn activity_logs(
        &self,
        session: Option<&str>,
        cap: usize,
    ) -> Result<Vec<ActivityLog>> {
        let rows = self
            .fetch(
                "session_id, activity, duration_minutes, intensity, notes, created_at",
                "activity_logs",
                session,
                cap,
            )
            .await?;

        let logs = rows
            .iter()
            .map(|row| {
                Ok(ActivityLog {
                    session_id: row.try_get("session_id")?,
                    activity: row.try_get("activity")?,
                    duration_minutes: row.try_get("duration_minutes")?,
                    intensity: row.try_get("intensity")?,
                    notes: row.try_get("notes")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(logs)
    }
}
