//! Account (ledger) DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response body for `GET /accounts/{address}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    /// Queried account.
    pub address: String,
    /// Token balance (string-encoded u128).
    pub token_balance: String,
    /// Base balance (string-encoded u128).
    pub base_balance: String,
    /// Token allowance granted to the pool (string-encoded u128).
    pub pool_allowance: String,
    /// Pool shares held (string-encoded u128).
    pub shares: String,
}

/// Request body for `POST /accounts/approve`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveRequest {
    /// Token owner.
    pub owner: String,
    /// New allowance for the pool (string-encoded u128). Replaces any
    /// previous allowance.
    pub amount: String,
}

/// Response body for `POST /accounts/approve`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApproveResponse {
    /// Token owner.
    pub owner: String,
    /// Spender, always the pool address.
    pub spender: String,
    /// Allowance now in effect (string-encoded).
    pub allowance: String,
}

/// Request body for `POST /accounts/transfer`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferRequest {
    /// Sender.
    pub from: String,
    /// Recipient.
    pub to: String,
    /// `base` or `token`.
    pub asset: String,
    /// Units to move (string-encoded u128).
    pub amount: String,
}

/// Response body for `POST /accounts/transfer`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransferResponse {
    /// Sender.
    pub from: String,
    /// Recipient.
    pub to: String,
    /// Asset moved.
    pub asset: String,
    /// Units moved (string-encoded).
    pub amount: String,
    /// Sender balance afterwards (string-encoded).
    pub from_balance: String,
    /// Recipient balance afterwards (string-encoded).
    pub to_balance: String,
}
