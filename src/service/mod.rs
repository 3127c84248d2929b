//! Service layer: business logic orchestration.
//!
//! [`DexService`] serializes every pool operation behind one lock,
//! settles the asset movements through the ledger and emits events on
//! the [`crate::domain::EventBus`] once an operation has committed.

pub mod dex_service;
pub mod settlement;

pub use dex_service::DexService;
