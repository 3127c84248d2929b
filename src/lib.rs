//! # zerokage-dex
//!
//! Single-pair constant-product liquidity pool trading a native base asset
//! (ETH) against an ERC20-style token (0KAGE), served over REST and
//! WebSocket.
//!
//! The pool keeps internal reserves, issues proportional shares to
//! liquidity providers and prices swaps with `x · y = k` net of a fixed
//! fee. All asset movements go through the [`ledger::AssetTransfer`]
//! capability; the bundled [`ledger::InMemoryLedger`] is an ERC20-style
//! book with allowances.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── DexService (service/)   lock, reentrancy guard, commit/rollback
//!     ├── EventBus (domain/)
//!     │
//!     ├── PoolState (domain/)     reserves, shares, pricing math
//!     ├── AssetTransfer (ledger/)
//!     │
//!     └── PostgreSQL Persistence  (optional)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod persistence;
pub mod service;
pub mod ws;

use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Builds the full application: REST routes, `/ws`, and the HTTP layers.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws::handler::ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}
