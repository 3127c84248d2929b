//! Account handlers backed by the in-memory ledger.
//!
//! Callers are self-declared: there is no signature scheme, so these
//! endpoints are meant for local and test deployments.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    AccountResponse, ApproveRequest, ApproveResponse, TransferRequest, TransferResponse,
    parse_address,
};
use crate::app_state::AppState;
use crate::domain::amount::parse_amount;
use crate::error::{DexError, ErrorResponse};
use crate::ledger::Asset;

/// `GET /accounts/{address}` — Balances, pool allowance and shares.
///
/// # Errors
///
/// Returns [`DexError::InvalidRequest`] on a malformed address.
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{address}",
    tag = "Accounts",
    summary = "Get account",
    params(
        ("address" = String, Path, description = "0x-prefixed account address"),
    ),
    responses(
        (status = 200, description = "Account balances", body = AccountResponse),
        (status = 400, description = "Malformed address", body = ErrorResponse),
    )
)]
pub async fn get_account(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, DexError> {
    let owner = parse_address(&address, "address")?;
    let ledger = &state.ledger;
    let token_balance = ledger.balance_of(Asset::Token, owner).await;
    let base_balance = ledger.balance_of(Asset::Base, owner).await;
    let pool_allowance = ledger.allowance(owner, ledger.pool_address()).await;
    let shares = state.dex.shares_of(owner).await?;

    Ok(Json(AccountResponse {
        address: owner.to_string(),
        token_balance: token_balance.to_string(),
        base_balance: base_balance.to_string(),
        pool_allowance: pool_allowance.to_string(),
        shares: shares.to_string(),
    }))
}

/// `POST /accounts/approve` — Set the token allowance granted to the pool.
///
/// # Errors
///
/// Returns [`DexError::InvalidRequest`] on malformed input.
#[utoipa::path(
    post,
    path = "/api/v1/accounts/approve",
    tag = "Accounts",
    summary = "Approve the pool",
    description = "Replaces the token allowance `owner` grants the pool address.",
    request_body = ApproveRequest,
    responses(
        (status = 200, description = "Allowance set", body = ApproveResponse),
        (status = 400, description = "Malformed input", body = ErrorResponse),
    )
)]
pub async fn approve(
    State(state): State<AppState>,
    Json(req): Json<ApproveRequest>,
) -> Result<impl IntoResponse, DexError> {
    let owner = parse_address(&req.owner, "owner")?;
    let amount = parse_amount(&req.amount, "amount")?;
    let spender = state.ledger.pool_address();

    state.ledger.approve(owner, spender, amount).await;

    Ok(Json(ApproveResponse {
        owner: owner.to_string(),
        spender: spender.to_string(),
        allowance: amount.to_string(),
    }))
}

/// `POST /accounts/transfer` — Move base or token between accounts.
///
/// # Errors
///
/// Returns [`DexError::InvalidRequest`] on malformed input or a transfer
/// into or out of pool custody, and [`DexError::TransferFailed`] on an
/// insufficient balance.
#[utoipa::path(
    post,
    path = "/api/v1/accounts/transfer",
    tag = "Accounts",
    summary = "Transfer assets",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer executed", body = TransferResponse),
        (status = 400, description = "Malformed input", body = ErrorResponse),
        (status = 422, description = "Insufficient balance", body = ErrorResponse),
    )
)]
pub async fn transfer(
    State(state): State<AppState>,
    Json(req): Json<TransferRequest>,
) -> Result<impl IntoResponse, DexError> {
    let from = parse_address(&req.from, "from")?;
    let to = parse_address(&req.to, "to")?;
    let asset = parse_asset(&req.asset)?;
    let amount = parse_amount(&req.amount, "amount")?;
    let custody = state.ledger.pool_address();
    if from == custody || to == custody {
        return Err(DexError::InvalidRequest(
            "pool custody only moves through pool operations".to_string(),
        ));
    }

    state.ledger.transfer(asset, from, to, amount).await?;

    let from_balance = state.ledger.balance_of(asset, from).await;
    let to_balance = state.ledger.balance_of(asset, to).await;
    Ok(Json(TransferResponse {
        from: from.to_string(),
        to: to.to_string(),
        asset: asset.as_str().to_string(),
        amount: amount.to_string(),
        from_balance: from_balance.to_string(),
        to_balance: to_balance.to_string(),
    }))
}

/// Account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts/{address}", get(get_account))
        .route("/accounts/approve", post(approve))
        .route("/accounts/transfer", post(transfer))
}

fn parse_asset(raw: &str) -> Result<Asset, DexError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "base" | "eth" => Ok(Asset::Base),
        "token" | "0kage" => Ok(Asset::Token),
        _ => Err(DexError::InvalidRequest(format!(
            "invalid asset {raw:?}: expected base or token"
        ))),
    }
}
