//! Pool handlers: state queries, initialization and liquidity.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    DepositQuoteRequest, DepositQuoteResponse, DepositRequest, DepositResponse,
    InitializeRequest, InitializeResponse, PoolInfoResponse, SharesResponse, WithdrawRequest,
    WithdrawResponse, parse_address,
};
use crate::app_state::AppState;
use crate::domain::amount::parse_amount;
use crate::error::{DexError, ErrorResponse};

/// `GET /pool` — Current pool state.
///
/// # Errors
///
/// Returns [`DexError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/pool",
    tag = "Pool",
    summary = "Get pool state",
    description = "Returns reserves, total shares, fee rate, the initialized flag and operational metadata.",
    responses(
        (status = 200, description = "Pool state", body = PoolInfoResponse),
    )
)]
pub async fn get_pool(State(state): State<AppState>) -> Result<impl IntoResponse, DexError> {
    let info = state.dex.pool_info().await?;
    Ok(Json(PoolInfoResponse::from(info)))
}

/// `GET /pool/shares/{address}` — Shares held by an account.
///
/// # Errors
///
/// Returns [`DexError::InvalidRequest`] on a malformed address.
#[utoipa::path(
    get,
    path = "/api/v1/pool/shares/{address}",
    tag = "Pool",
    summary = "Get account shares",
    params(
        ("address" = String, Path, description = "0x-prefixed account address"),
    ),
    responses(
        (status = 200, description = "Share balance", body = SharesResponse),
        (status = 400, description = "Malformed address", body = ErrorResponse),
    )
)]
pub async fn get_shares(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, DexError> {
    let owner = parse_address(&address, "address")?;
    let shares = state.dex.shares_of(owner).await?;
    let total_shares = state.dex.total_shares().await?;
    Ok(Json(SharesResponse {
        address: owner.to_string(),
        shares: shares.to_string(),
        total_shares: total_shares.to_string(),
    }))
}

/// `POST /pool/initialize` — Seed the pool with its first liquidity.
///
/// # Errors
///
/// Returns [`DexError`] on invalid input, a second initialization, or a
/// failed transfer.
#[utoipa::path(
    post,
    path = "/api/v1/pool/initialize",
    tag = "Pool",
    summary = "Initialize the pool",
    description = "Pulls `token_amount` (requires allowance) and `base_amount` from the caller and mints floor(sqrt(token * base)) shares. Allowed once.",
    request_body = InitializeRequest,
    responses(
        (status = 201, description = "Pool initialized", body = InitializeResponse),
        (status = 400, description = "Invalid or zero amount", body = ErrorResponse),
        (status = 409, description = "Already initialized", body = ErrorResponse),
        (status = 422, description = "Transfer failed", body = ErrorResponse),
    )
)]
pub async fn initialize(
    State(state): State<AppState>,
    Json(req): Json<InitializeRequest>,
) -> Result<impl IntoResponse, DexError> {
    let caller = parse_address(&req.caller, "caller")?;
    let token_amount = parse_amount(&req.token_amount, "token_amount")?;
    let base_amount = parse_amount(&req.base_amount, "base_amount")?;

    let plan = state
        .dex
        .initialize(caller, token_amount, base_amount)
        .await?;

    let response = InitializeResponse {
        caller: caller.to_string(),
        shares_minted: plan.shares_minted.to_string(),
        base_in: plan.base_in.to_string(),
        token_in: plan.token_in.to_string(),
        executed_at: Utc::now(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /pool/deposit` — Add liquidity at the current ratio.
///
/// # Errors
///
/// Returns [`DexError`] on invalid input, an uninitialized pool, or a
/// failed transfer.
#[utoipa::path(
    post,
    path = "/api/v1/pool/deposit",
    tag = "Liquidity",
    summary = "Add liquidity",
    description = "Attaches `base_amount` and pulls the proportional token amount (rounded up) from the caller; mints shares rounded down.",
    request_body = DepositRequest,
    responses(
        (status = 200, description = "Liquidity added", body = DepositResponse),
        (status = 400, description = "Invalid or zero amount", body = ErrorResponse),
        (status = 409, description = "Pool not initialized", body = ErrorResponse),
        (status = 422, description = "Transfer failed", body = ErrorResponse),
    )
)]
pub async fn deposit(
    State(state): State<AppState>,
    Json(req): Json<DepositRequest>,
) -> Result<impl IntoResponse, DexError> {
    let caller = parse_address(&req.caller, "caller")?;
    let base_amount = parse_amount(&req.base_amount, "base_amount")?;

    let plan = state.dex.deposit(caller, base_amount).await?;

    Ok(Json(DepositResponse {
        caller: caller.to_string(),
        base_in: plan.base_in.to_string(),
        token_in: plan.token_in.to_string(),
        shares_minted: plan.shares_minted.to_string(),
        executed_at: Utc::now(),
    }))
}

/// `POST /pool/withdraw` — Redeem shares.
///
/// # Errors
///
/// Returns [`DexError`] on invalid input, insufficient shares, or a
/// failed transfer.
#[utoipa::path(
    post,
    path = "/api/v1/pool/withdraw",
    tag = "Liquidity",
    summary = "Remove liquidity",
    description = "Burns `shares` and pays out the proportional slice of both reserves, rounded down.",
    request_body = WithdrawRequest,
    responses(
        (status = 200, description = "Liquidity removed", body = WithdrawResponse),
        (status = 400, description = "Invalid or zero amount", body = ErrorResponse),
        (status = 409, description = "Pool not initialized", body = ErrorResponse),
        (status = 422, description = "Insufficient shares or transfer failed", body = ErrorResponse),
    )
)]
pub async fn withdraw(
    State(state): State<AppState>,
    Json(req): Json<WithdrawRequest>,
) -> Result<impl IntoResponse, DexError> {
    let caller = parse_address(&req.caller, "caller")?;
    let shares = parse_amount(&req.shares, "shares")?;

    let plan = state.dex.withdraw(caller, shares).await?;

    Ok(Json(WithdrawResponse {
        caller: caller.to_string(),
        shares_redeemed: plan.shares_redeemed.to_string(),
        base_out: plan.base_out.to_string(),
        token_out: plan.token_out.to_string(),
        executed_at: Utc::now(),
    }))
}

/// `POST /quote/deposit` — Price a deposit without executing it.
///
/// # Errors
///
/// Returns [`DexError`] on invalid input or an uninitialized pool.
#[utoipa::path(
    post,
    path = "/api/v1/quote/deposit",
    tag = "Liquidity",
    summary = "Quote a deposit",
    description = "Returns the token requirement and shares a deposit of `base_amount` would produce. The pool is not modified.",
    request_body = DepositQuoteRequest,
    responses(
        (status = 200, description = "Quote computed", body = DepositQuoteResponse),
        (status = 400, description = "Invalid or zero amount", body = ErrorResponse),
        (status = 409, description = "Pool not initialized", body = ErrorResponse),
    )
)]
pub async fn quote_deposit(
    State(state): State<AppState>,
    Json(req): Json<DepositQuoteRequest>,
) -> Result<impl IntoResponse, DexError> {
    let base_amount = parse_amount(&req.base_amount, "base_amount")?;
    let plan = state.dex.quote_deposit(base_amount).await?;
    Ok(Json(DepositQuoteResponse {
        base_in: plan.base_in.to_string(),
        token_in: plan.token_in.to_string(),
        shares_minted: plan.shares_minted.to_string(),
        quoted_at: Utc::now(),
    }))
}

/// Pool and liquidity routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pool", get(get_pool))
        .route("/pool/shares/{address}", get(get_shares))
        .route("/pool/initialize", post(initialize))
        .route("/pool/deposit", post(deposit))
        .route("/pool/withdraw", post(withdraw))
        .route("/quote/deposit", post(quote_deposit))
}
