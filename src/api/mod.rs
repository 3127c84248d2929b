//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All pool endpoints are mounted under `/api/v1`; `/health` sits at the
//! root. With the `swagger-ui` feature the OpenAPI document is served at
//! `/api-docs/openapi.json` and browsable at `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document covering every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "zerokage-dex",
        description = "Constant-product ETH/0KAGE liquidity pool"
    ),
    paths(
        handlers::system::health_handler,
        handlers::pool::get_pool,
        handlers::pool::get_shares,
        handlers::pool::initialize,
        handlers::pool::deposit,
        handlers::pool::withdraw,
        handlers::pool::quote_deposit,
        handlers::swap::swap_base_for_token,
        handlers::swap::swap_token_for_base,
        handlers::swap::quote_swap,
        handlers::account::get_account,
        handlers::account::approve,
        handlers::account::transfer,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
        handlers::system::HealthResponse,
        dto::PoolInfoResponse,
        dto::SharesResponse,
        dto::InitializeRequest,
        dto::InitializeResponse,
        dto::DepositRequest,
        dto::DepositResponse,
        dto::WithdrawRequest,
        dto::WithdrawResponse,
        dto::DepositQuoteRequest,
        dto::DepositQuoteResponse,
        dto::SwapRequest,
        dto::SwapResponse,
        dto::SwapQuoteRequest,
        dto::SwapQuoteResponse,
        dto::AccountResponse,
        dto::ApproveRequest,
        dto::ApproveResponse,
        dto::TransferRequest,
        dto::TransferResponse,
    )),
    tags(
        (name = "Pool", description = "Pool state and initialization"),
        (name = "Liquidity", description = "Deposits and withdrawals"),
        (name = "Swaps", description = "Swaps and quotes"),
        (name = "Accounts", description = "Ledger balances and allowances"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
