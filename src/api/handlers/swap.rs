//! Swap and quote endpoint handlers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    SwapQuoteRequest, SwapQuoteResponse, SwapRequest, SwapResponse, parse_address,
};
use crate::app_state::AppState;
use crate::domain::SwapDirection;
use crate::domain::amount::parse_amount;
use crate::error::{DexError, ErrorResponse};

/// `POST /swap/base-for-token` — Sell base for token.
///
/// # Errors
///
/// Returns [`DexError`] on invalid input, an empty pool, or a failed
/// transfer.
#[utoipa::path(
    post,
    path = "/api/v1/swap/base-for-token",
    tag = "Swaps",
    summary = "Swap base for token",
    description = "Attaches `amount_in` base units and pays out the constant-product token amount net of fee.",
    request_body = SwapRequest,
    responses(
        (status = 200, description = "Swap executed", body = SwapResponse),
        (status = 400, description = "Invalid or zero amount", body = ErrorResponse),
        (status = 409, description = "Pool not initialized", body = ErrorResponse),
        (status = 422, description = "Transfer failed", body = ErrorResponse),
    )
)]
pub async fn swap_base_for_token(
    State(state): State<AppState>,
    Json(req): Json<SwapRequest>,
) -> Result<impl IntoResponse, DexError> {
    execute(&state, SwapDirection::BaseForToken, &req).await
}

/// `POST /swap/token-for-base` — Sell token for base.
///
/// # Errors
///
/// Returns [`DexError`] on invalid input, an empty pool, or a failed
/// transfer (including missing allowance).
#[utoipa::path(
    post,
    path = "/api/v1/swap/token-for-base",
    tag = "Swaps",
    summary = "Swap token for base",
    description = "Pulls `amount_in` token units (requires allowance) and pays out the constant-product base amount net of fee.",
    request_body = SwapRequest,
    responses(
        (status = 200, description = "Swap executed", body = SwapResponse),
        (status = 400, description = "Invalid or zero amount", body = ErrorResponse),
        (status = 409, description = "Pool not initialized", body = ErrorResponse),
        (status = 422, description = "Transfer failed", body = ErrorResponse),
    )
)]
pub async fn swap_token_for_base(
    State(state): State<AppState>,
    Json(req): Json<SwapRequest>,
) -> Result<impl IntoResponse, DexError> {
    execute(&state, SwapDirection::TokenForBase, &req).await
}

/// `POST /quote/swap` — Get swap quote (read-only).
///
/// # Errors
///
/// Returns [`DexError`] on invalid input or an empty pool.
#[utoipa::path(
    post,
    path = "/api/v1/quote/swap",
    tag = "Swaps",
    summary = "Get swap quote",
    description = "Returns the output a swap would produce right now. The pool state is not modified.",
    request_body = SwapQuoteRequest,
    responses(
        (status = 200, description = "Quote computed", body = SwapQuoteResponse),
        (status = 400, description = "Invalid direction or amount", body = ErrorResponse),
        (status = 409, description = "Pool not initialized", body = ErrorResponse),
    )
)]
pub async fn quote_swap(
    State(state): State<AppState>,
    Json(req): Json<SwapQuoteRequest>,
) -> Result<impl IntoResponse, DexError> {
    let direction = parse_direction(&req.direction)?;
    let amount_in = parse_amount(&req.amount_in, "amount_in")?;

    let plan = state.dex.quote_swap(direction, amount_in).await?;

    Ok(Json(SwapQuoteResponse {
        direction: direction.as_str().to_string(),
        amount_in: plan.amount_in.to_string(),
        amount_out: plan.amount_out.to_string(),
        reserve_base_after: plan.reserve_base_after.to_string(),
        reserve_token_after: plan.reserve_token_after.to_string(),
        quoted_at: Utc::now(),
    }))
}

/// Swap routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/swap/base-for-token", post(swap_base_for_token))
        .route("/swap/token-for-base", post(swap_token_for_base))
        .route("/quote/swap", post(quote_swap))
}

async fn execute(
    state: &AppState,
    direction: SwapDirection,
    req: &SwapRequest,
) -> Result<Json<SwapResponse>, DexError> {
    let caller = parse_address(&req.caller, "caller")?;
    let amount_in = parse_amount(&req.amount_in, "amount_in")?;

    let plan = state.dex.swap(caller, direction, amount_in).await?;

    Ok(Json(SwapResponse {
        swap_id: uuid::Uuid::new_v4().to_string(),
        caller: caller.to_string(),
        direction: direction.as_str().to_string(),
        amount_in: plan.amount_in.to_string(),
        amount_out: plan.amount_out.to_string(),
        reserve_base_after: plan.reserve_base_after.to_string(),
        reserve_token_after: plan.reserve_token_after.to_string(),
        executed_at: Utc::now(),
    }))
}

/// Parses `base_for_token` / `token_for_base` (dashes accepted).
fn parse_direction(raw: &str) -> Result<SwapDirection, DexError> {
    match raw.trim().replace('-', "_").as_str() {
        "base_for_token" => Ok(SwapDirection::BaseForToken),
        "token_for_base" => Ok(SwapDirection::TokenForBase),
        _ => Err(DexError::InvalidRequest(format!(
            "invalid direction {raw:?}: expected base_for_token or token_for_base"
        ))),
    }
}
