//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::ledger::InMemoryLedger;
use crate::service::DexService;

/// The service as wired by the server binary.
pub type SharedDex = Arc<DexService<InMemoryLedger>>;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// DEX service for all pool operations.
    pub dex: SharedDex,
    /// Asset ledger for account endpoints.
    pub ledger: Arc<InMemoryLedger>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Builds the state from a service, sharing its ledger and event bus.
    #[must_use]
    pub fn new(dex: SharedDex) -> Self {
        let ledger = Arc::clone(dex.ledger());
        let event_bus = dex.event_bus().clone();
        Self {
            dex,
            ledger,
            event_bus,
        }
    }
}
