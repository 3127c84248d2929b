//! Database models for events and snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored event row from the `events` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Auto-increment row ID.
    pub id: i64,
    /// Event type discriminator (e.g. `"swap_base_for_token"`).
    pub event_type: String,
    /// `0x` address of the caller that triggered the event.
    pub caller: String,
    /// JSONB payload with the full serialized event.
    pub payload: serde_json::Value,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A snapshot row from the `dex_snapshots` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexSnapshot {
    /// Auto-increment row ID.
    pub id: i64,
    /// Serialized [`crate::domain::PoolEntry`].
    pub pool_json: serde_json::Value,
    /// Serialized [`crate::ledger::LedgerSnapshot`].
    pub ledger_json: serde_json::Value,
    /// Snapshot timestamp.
    pub snapshot_at: DateTime<Utc>,
}
