//! Swap and quote DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;


/// Request body for `POST /swap/base-for-token` and
/// `POST /swap/token-for-base`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SwapRequest {
    /// Calling account.
    pub caller: String,
    /// Exact input amount (string-encoded u128).
    pub amount_in: String,
}

/// Response body for the swap endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct SwapResponse {
    /// Unique swap identifier.
    pub swap_id: String,
    /// Calling account.
    pub caller: String,
    /// `base_for_token` or `token_for_base`.
    pub direction: String,
    /// Input amount (string-encoded).
    pub amount_in: String,
    /// Output amount (string-encoded).
    pub amount_out: String,
    /// Base reserve after the swap (string-encoded).
    pub reserve_base_after: String,
    /// Token reserve after the swap (string-encoded).
    pub reserve_token_after: String,
    /// Execution timestamp.
    pub executed_at: DateTime<Utc>,
}

/// Request body for `POST /quote/swap`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SwapQuoteRequest {
    /// `base_for_token` or `token_for_base`.
    pub direction: String,
    /// Exact input amount (string-encoded u128).
    pub amount_in: String,
}

/// Response body for `POST /quote/swap`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SwapQuoteResponse {
    /// Quoted direction.
    pub direction: String,
    /// Input amount (string-encoded).
    pub amount_in: String,
    /// Quoted output amount (string-encoded).
    pub amount_out: String,
    /// Base reserve if the swap executed now (string-encoded).
    pub reserve_base_after: String,
    /// Token reserve if the swap executed now (string-encoded).
    pub reserve_token_after: String,
    /// Quote timestamp.
    pub quoted_at: DateTime<Utc>,
}
