//! Background tasks bridging the running DEX and PostgreSQL.
//!
//! - [`spawn_event_log`] appends every event from the bus.
//! - [`spawn_snapshotter`] stores pool + ledger snapshots on an interval
//!   and prunes old ones.
//! - [`restore_latest`] loads the newest snapshot at startup.
//!
//! Database failures are logged and never stop trading.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::postgres::PostgresPersistence;
use crate::app_state::SharedDex;
use crate::domain::{DexEvent, PoolEntry};
use crate::error::DexError;
use crate::ledger::LedgerSnapshot;

/// Spawns a task appending every received event to the `events` table.
pub fn spawn_event_log(
    persistence: PostgresPersistence,
    mut event_rx: broadcast::Receiver<DexEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    let payload = match serde_json::to_value(&event) {
                        Ok(v) => v,
                        Err(e) => {
                            tracing::error!(error = %e, "failed to serialize event");
                            continue;
                        }
                    };
                    let caller = event.caller().to_string();
                    if let Err(e) = persistence
                        .save_event(event.event_type_str(), &caller, &payload)
                        .await
                    {
                        tracing::error!(
                            error = %e,
                            event_type = event.event_type_str(),
                            "failed to persist event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "event log fell behind; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("event log task stopped");
    })
}

/// Serializes the pool entry and ledger, captured together, and stores
/// them.
///
/// # Errors
///
/// Returns a [`DexError`] if serialization or the insert fails.
pub async fn take_snapshot(
    persistence: &PostgresPersistence,
    dex: &SharedDex,
) -> Result<i64, DexError> {
    let (entry, ledger) = dex.snapshot_state().await?;
    let pool_json =
        serde_json::to_value(&entry).map_err(|e| DexError::Internal(e.to_string()))?;
    let ledger_json =
        serde_json::to_value(&ledger).map_err(|e| DexError::Internal(e.to_string()))?;
    persistence.save_snapshot(&pool_json, &ledger_json).await
}

/// Spawns a task that snapshots every `interval` and prunes snapshots
/// older than `cleanup_after_days` (0 disables pruning).
pub fn spawn_snapshotter(
    persistence: PostgresPersistence,
    dex: SharedDex,
    interval: Duration,
    cleanup_after_days: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match take_snapshot(&persistence, &dex).await {
                Ok(id) => tracing::debug!(snapshot_id = id, "snapshot stored"),
                Err(e) => tracing::error!(error = %e, "snapshot failed"),
            }
            if cleanup_after_days > 0 {
                match persistence.delete_old_snapshots(cleanup_after_days).await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!(deleted = n, "old snapshots pruned"),
                    Err(e) => tracing::error!(error = %e, "snapshot cleanup failed"),
                }
            }
        }
    })
}

/// Restores pool and ledger from the newest snapshot.
///
/// Returns `Ok(false)` when there is nothing to restore.
///
/// # Errors
///
/// Returns a [`DexError`] if the snapshot cannot be loaded or decoded,
/// violates the pool invariants, or records reserves that differ from
/// the custody balances.
pub async fn restore_latest(
    persistence: &PostgresPersistence,
    dex: &SharedDex,
) -> Result<bool, DexError> {
    let Some(snapshot) = persistence.load_latest_snapshot().await? else {
        return Ok(false);
    };
    let entry: PoolEntry = serde_json::from_value(snapshot.pool_json)
        .map_err(|e| DexError::PersistenceError(format!("corrupt pool snapshot: {e}")))?;
    let ledger: LedgerSnapshot = serde_json::from_value(snapshot.ledger_json)
        .map_err(|e| DexError::PersistenceError(format!("corrupt ledger snapshot: {e}")))?;

    dex.restore_state(entry, ledger).await?;
    tracing::info!(
        snapshot_id = snapshot.id,
        snapshot_at = %snapshot.snapshot_at,
        "pool state restored from snapshot"
    );

    // operations committed after the last snapshot are lost
    let missed = persistence
        .load_events_after(snapshot.snapshot_at, None)
        .await?;
    if !missed.is_empty() {
        tracing::warn!(
            missed = missed.len(),
            first_missed_id = ?missed.first().map(|e| e.id),
            "events logged after the restored snapshot are not reflected in pool state"
        );
    }
    Ok(true)
}
