//! Liquidity operation DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /pool/deposit`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositRequest {
    /// Calling account.
    pub caller: String,
    /// Base units attached to the call (string-encoded u128). The token
    /// side is derived from the current ratio.
    pub base_amount: String,
}

/// Response body for `POST /pool/deposit`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DepositResponse {
    /// Calling account.
    pub caller: String,
    /// Base units deposited (string-encoded).
    pub base_in: String,
    /// Token units pulled, rounded up (string-encoded).
    pub token_in: String,
    /// Shares minted, rounded down (string-encoded).
    pub shares_minted: String,
    /// Execution timestamp.
    pub executed_at: DateTime<Utc>,
}

/// Request body for `POST /pool/withdraw`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WithdrawRequest {
    /// Calling account.
    pub caller: String,
    /// Shares to redeem (string-encoded u128).
    pub shares: String,
}

/// Response body for `POST /pool/withdraw`.
#[derive(Debug, Serialize, ToSchema)]
pub struct WithdrawResponse {
    /// Calling account.
    pub caller: String,
    /// Shares burned (string-encoded).
    pub shares_redeemed: String,
    /// Base units paid out (string-encoded).
    pub base_out: String,
    /// Token units paid out (string-encoded).
    pub token_out: String,
    /// Execution timestamp.
    pub executed_at: DateTime<Utc>,
}

/// Request body for `POST /quote/deposit`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositQuoteRequest {
    /// Base units the caller would attach (string-encoded u128).
    pub base_amount: String,
}

/// Response body for `POST /quote/deposit`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DepositQuoteResponse {
    /// Base units (string-encoded).
    pub base_in: String,
    /// Token units that would be pulled (string-encoded).
    pub token_in: String,
    /// Shares that would be minted (string-encoded).
    pub shares_minted: String,
    /// Quote timestamp.
    pub quoted_at: DateTime<Utc>,
}
