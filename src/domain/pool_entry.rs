//! Pool entry combining the engine state with server-side metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::amount::as_string;
use super::{Address, FeeRate, PoolState};

/// Aggregate wrapping the live [`PoolState`] with operational metadata.
///
/// The `state` field holds reserves, share supply and the share ledger;
/// the remaining fields are bookkeeping the engine itself does not need.
/// The whole entry is serialized into persistence snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEntry {
    /// Address the pool holds assets under (immutable after creation).
    pub pool_address: Address,

    /// Address of the paired token contract (immutable after creation).
    pub token_address: Address,

    /// Engine state. Updated on swap / liquidity operations.
    pub state: PoolState,

    /// Creation timestamp (immutable after creation).
    pub created_at: DateTime<Utc>,

    /// Timestamp of last committed state mutation.
    pub last_modified_at: DateTime<Utc>,

    /// Number of swaps executed on this pool.
    pub swap_count: u64,

    /// Cumulative base units swapped in.
    #[serde(with = "as_string")]
    pub base_volume: u128,

    /// Cumulative token units swapped in.
    #[serde(with = "as_string")]
    pub token_volume: u128,
}

impl PoolEntry {
    /// Creates a new, uninitialized `PoolEntry`.
    #[must_use]
    pub fn new(pool_address: Address, token_address: Address, fee: FeeRate) -> Self {
        let now = Utc::now();
        Self {
            pool_address,
            token_address,
            state: PoolState::new(fee),
            created_at: now,
            last_modified_at: now,
            swap_count: 0,
            base_volume: 0,
            token_volume: 0,
        }
    }

    /// Marks the entry as modified now.
    pub fn touch(&mut self) {
        self.last_modified_at = Utc::now();
    }
}

/// Read-only view of the pool returned by queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolInfo {
    /// Pool custody address.
    pub pool_address: Address,
    /// Paired token address.
    pub token_address: Address,
    /// Base reserve.
    #[serde(with = "as_string")]
    pub reserve_base: u128,
    /// Token reserve.
    #[serde(with = "as_string")]
    pub reserve_token: u128,
    /// Outstanding shares.
    #[serde(with = "as_string")]
    pub total_shares: u128,
    /// Swap fee rate.
    pub fee: FeeRate,
    /// Whether the pool has ever been initialized.
    pub initialized: bool,
    /// Number of accounts holding shares.
    pub provider_count: usize,
    /// Number of swaps executed.
    pub swap_count: u64,
    /// Cumulative base units swapped in.
    #[serde(with = "as_string")]
    pub base_volume: u128,
    /// Cumulative token units swapped in.
    #[serde(with = "as_string")]
    pub token_volume: u128,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last state mutation.
    pub last_modified_at: DateTime<Utc>,
}

impl From<&PoolEntry> for PoolInfo {
    fn from(entry: &PoolEntry) -> Self {
        Self {
            pool_address: entry.pool_address,
            token_address: entry.token_address,
            reserve_base: entry.state.reserve_base(),
            reserve_token: entry.state.reserve_token(),
            total_shares: entry.state.total_shares(),
            fee: entry.state.fee(),
            initialized: entry.state.is_initialized(),
            provider_count: entry.state.share_ledger().holder_count(),
            swap_count: entry.swap_count,
            base_volume: entry.base_volume,
            token_volume: entry.token_volume,
            created_at: entry.created_at,
            last_modified_at: entry.last_modified_at,
        }
    }
}
