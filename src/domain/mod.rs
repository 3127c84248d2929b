//! Domain layer: pool engine, identities, and event system.
//!
//! This module contains the constant-product engine ([`PoolState`]) with
//! its integer math, account addresses, the fee rate, the share ledger,
//! the pool entry with operational metadata, and the event bus that
//! broadcasts committed state changes.

pub mod address;
pub mod amount;
pub mod dex_event;
pub mod event_bus;
pub mod fee;
pub mod math;
pub mod pool_entry;
pub mod pool_state;
pub mod share_ledger;

pub use address::Address;
pub use dex_event::DexEvent;
pub use event_bus::EventBus;
pub use fee::FeeRate;
pub use pool_entry::{PoolEntry, PoolInfo};
pub use pool_state::{PoolState, SwapDirection};
pub use share_ledger::ShareLedger;
