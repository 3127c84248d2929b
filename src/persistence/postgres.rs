//! PostgreSQL implementation of the persistence layer.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::{DexSnapshot, StoredEvent};
use crate::config::DexConfig;
use crate::error::DexError;

type SnapshotRow = (i64, serde_json::Value, serde_json::Value, DateTime<Utc>);
type EventRow = (i64, String, String, serde_json::Value, DateTime<Utc>);

fn db_error(e: impl std::fmt::Display) -> DexError {
    DexError::PersistenceError(e.to_string())
}

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized by `config` and applies pending
    /// migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`DexError::PersistenceError`] if the database is
    /// unreachable or a migration fails.
    pub async fn connect(config: &DexConfig) -> Result<Self, DexError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(db_error)?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(db_error)?;
        Ok(Self::new(pool))
    }

    /// Appends an event to the event log.
    ///
    /// # Errors
    ///
    /// Returns a [`DexError::PersistenceError`] on database failure.
    pub async fn save_event(
        &self,
        event_type: &str,
        caller: &str,
        payload: &serde_json::Value,
    ) -> Result<i64, DexError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (event_type, caller, payload) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(event_type)
        .bind(caller)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row)
    }

    /// Saves a pool + ledger snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`DexError::PersistenceError`] on database failure.
    pub async fn save_snapshot(
        &self,
        pool_json: &serde_json::Value,
        ledger_json: &serde_json::Value,
    ) -> Result<i64, DexError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO dex_snapshots (pool_json, ledger_json) VALUES ($1, $2) RETURNING id",
        )
        .bind(pool_json)
        .bind(ledger_json)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row)
    }

    /// Loads the newest snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`DexError::PersistenceError`] on database failure.
    pub async fn load_latest_snapshot(&self) -> Result<Option<DexSnapshot>, DexError> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            "SELECT id, pool_json, ledger_json, snapshot_at FROM dex_snapshots \
             ORDER BY snapshot_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(|(id, pool_json, ledger_json, snapshot_at)| DexSnapshot {
            id,
            pool_json,
            ledger_json,
            snapshot_at,
        }))
    }

    /// Loads events after the given timestamp, optionally filtered by caller.
    ///
    /// # Errors
    ///
    /// Returns a [`DexError::PersistenceError`] on database failure.
    pub async fn load_events_after(
        &self,
        after: DateTime<Utc>,
        caller: Option<&str>,
    ) -> Result<Vec<StoredEvent>, DexError> {
        let rows = if let Some(caller) = caller {
            sqlx::query_as::<_, EventRow>(
                "SELECT id, event_type, caller, payload, created_at FROM events \
                 WHERE created_at > $1 AND caller = $2 ORDER BY id ASC",
            )
            .bind(after)
            .bind(caller)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, EventRow>(
                "SELECT id, event_type, caller, payload, created_at FROM events \
                 WHERE created_at > $1 ORDER BY id ASC",
            )
            .bind(after)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(
                |(id, event_type, caller, payload, created_at)| StoredEvent {
                    id,
                    event_type,
                    caller,
                    payload,
                    created_at,
                },
            )
            .collect())
    }

    /// Deletes snapshots older than the given number of days, always
    /// keeping the newest one.
    ///
    /// # Errors
    ///
    /// Returns a [`DexError::PersistenceError`] on database failure.
    pub async fn delete_old_snapshots(&self, before_days: u64) -> Result<u64, DexError> {
        let Some(cutoff) = i64::try_from(before_days)
            .ok()
            .and_then(chrono::Duration::try_days)
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            return Ok(0);
        };

        let result = sqlx::query(
            "DELETE FROM dex_snapshots WHERE snapshot_at < $1 \
             AND id <> (SELECT id FROM dex_snapshots ORDER BY snapshot_at DESC, id DESC LIMIT 1)",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected())
    }
}
