//! PostgreSQL implementation of the entry bookkeeping ports.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::UserId;
use crate::ports::{EntryRequestTracker, PreauthorizedEntries, TrackerError};

/// PostgreSQL-backed pending-entry and pre-authorization tracker.
pub struct PgEntryTracker {
    pool: PgPool,
}

impl PgEntryTracker {
    /// Creates a tracker over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntryRequestTracker for PgEntryTracker {
    async fn record_request(&self, user: UserId) -> Result<(), TrackerError> {
        sqlx::query("INSERT INTO entry_requests (user_id) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(user.as_i64())
            .execute(&self.pool)
            .await
            .map_err(TrackerError::backend)?;
        Ok(())
    }

    async fn is_pending(&self, user: UserId) -> Result<bool, TrackerError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM entry_requests WHERE user_id = $1)")
                .bind(user.as_i64())
                .fetch_one(&self.pool)
                .await
                .map_err(TrackerError::backend)?;
        Ok(exists.0)
    }

    async fn clear(&self, user: UserId) -> Result<(), TrackerError> {
        sqlx::query("DELETE FROM entry_requests WHERE user_id = $1")
            .bind(user.as_i64())
            .execute(&self.pool)
            .await
            .map_err(TrackerError::backend)?;
        Ok(())
    }
}

#[async_trait]
impl PreauthorizedEntries for PgEntryTracker {
    async fn add(&self, user: UserId) -> Result<(), TrackerError> {
        sqlx::query(
            "INSERT INTO preauthorized_entries (user_id) VALUES ($1) ON CONFLICT DO NOTHING",
        )
        .bind(user.as_i64())
        .execute(&self.pool)
        .await
        .map_err(TrackerError::backend)?;
        Ok(())
    }

    async fn take(&self, user: UserId) -> Result<bool, TrackerError> {
        let result = sqlx::query("DELETE FROM preauthorized_entries WHERE user_id = $1")
            .bind(user.as_i64())
            .execute(&self.pool)
            .await
            .map_err(TrackerError::backend)?;
        Ok(result.rows_affected() == 1)
    }
}
