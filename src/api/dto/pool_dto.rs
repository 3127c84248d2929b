//! Pool query and lifecycle DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::PoolInfo;

/// Response body for `GET /pool`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PoolInfoResponse {
    /// Pool custody address.
    pub pool_address: String,
    /// Paired token address.
    pub token_address: String,
    /// Base reserve (string-encoded u128).
    pub reserve_base: String,
    /// Token reserve (string-encoded u128).
    pub reserve_token: String,
    /// Outstanding shares (string-encoded u128).
    pub total_shares: String,
    /// Fee numerator; the trader keeps `numerator / denominator` of the input.
    pub fee_numerator: u64,
    /// Fee denominator.
    pub fee_denominator: u64,
    /// Fee charged, in basis points.
    pub fee_bps: u64,
    /// Whether the pool has been initialized.
    pub initialized: bool,
    /// Accounts holding shares.
    pub provider_count: usize,
    /// Swaps executed.
    pub swap_count: u64,
    /// Cumulative base units swapped in (string-encoded u128).
    pub base_volume: String,
    /// Cumulative token units swapped in (string-encoded u128).
    pub token_volume: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last state mutation.
    pub last_modified_at: DateTime<Utc>,
}

impl From<PoolInfo> for PoolInfoResponse {
    fn from(info: PoolInfo) -> Self {
        Self {
            pool_address: info.pool_address.to_string(),
            token_address: info.token_address.to_string(),
            reserve_base: info.reserve_base.to_string(),
            reserve_token: info.reserve_token.to_string(),
            total_shares: info.total_shares.to_string(),
            fee_numerator: info.fee.numerator(),
            fee_denominator: info.fee.denominator(),
            fee_bps: info.fee.fee_bps(),
            initialized: info.initialized,
            provider_count: info.provider_count,
            swap_count: info.swap_count,
            base_volume: info.base_volume.to_string(),
            token_volume: info.token_volume.to_string(),
            created_at: info.created_at,
            last_modified_at: info.last_modified_at,
        }
    }
}

/// Response body for `GET /pool/shares/{address}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SharesResponse {
    /// Queried account.
    pub address: String,
    /// Shares held (string-encoded u128).
    pub shares: String,
    /// Outstanding shares (string-encoded u128).
    pub total_shares: String,
}

/// Request body for `POST /pool/initialize`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InitializeRequest {
    /// Calling account.
    pub caller: String,
    /// Token units pulled from the caller (string-encoded u128).
    pub token_amount: String,
    /// Base units attached to the call (string-encoded u128).
    pub base_amount: String,
}

/// Response body for `POST /pool/initialize`.
#[derive(Debug, Serialize, ToSchema)]
pub struct InitializeResponse {
    /// Calling account.
    pub caller: String,
    /// Shares minted to the caller (string-encoded u128).
    pub shares_minted: String,
    /// Base units deposited (string-encoded u128).
    pub base_in: String,
    /// Token units deposited (string-encoded u128).
    pub token_in: String,
    /// Execution timestamp.
    pub executed_at: DateTime<Utc>,
}
