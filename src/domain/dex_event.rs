//! Domain events reflecting pool state transitions.
//!
//! Every committed operation publishes a [`DexEvent`] through the
//! [`super::EventBus`], followed by a [`DexEvent::ReservesSynced`] carrying
//! the post-state. Events are broadcast to WebSocket subscribers and
//! optionally appended to the PostgreSQL event log. A failed call emits
//! nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Address;
use super::amount::as_string;

/// Domain event emitted after every committed state transition.
///
/// The four trade/liquidity variants keep the field order of the
/// on-chain events indexers already consume:
/// `SwapBaseForToken(caller, baseIn, tokenOut)`,
/// `SwapTokenForBase(caller, tokenIn, baseOut)`,
/// `LiquidityAdded(caller, sharesMinted, baseIn, tokenIn)` and
/// `LiquidityRemoved(caller, sharesRedeemed, baseOut, tokenOut)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum DexEvent {
    /// First liquidity deposit; the pool becomes active.
    PoolInitialized {
        /// Initial liquidity provider.
        caller: Address,
        /// Shares minted to the caller.
        #[serde(with = "as_string")]
        shares_minted: u128,
        /// Base units deposited.
        #[serde(with = "as_string")]
        base_in: u128,
        /// Token units deposited.
        #[serde(with = "as_string")]
        token_in: u128,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Base asset sold for token.
    SwapBaseForToken {
        /// Trader.
        caller: Address,
        /// Base units paid in.
        #[serde(with = "as_string")]
        base_in: u128,
        /// Token units paid out.
        #[serde(with = "as_string")]
        token_out: u128,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Token sold for base asset.
    SwapTokenForBase {
        /// Trader.
        caller: Address,
        /// Token units paid in.
        #[serde(with = "as_string")]
        token_in: u128,
        /// Base units paid out.
        #[serde(with = "as_string")]
        base_out: u128,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Proportional liquidity deposit.
    LiquidityAdded {
        /// Liquidity provider.
        caller: Address,
        /// Shares minted to the caller.
        #[serde(with = "as_string")]
        shares_minted: u128,
        /// Base units deposited.
        #[serde(with = "as_string")]
        base_in: u128,
        /// Token units deposited.
        #[serde(with = "as_string")]
        token_in: u128,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Proportional liquidity withdrawal.
    LiquidityRemoved {
        /// Liquidity provider.
        caller: Address,
        /// Shares burned.
        #[serde(with = "as_string")]
        shares_redeemed: u128,
        /// Base units paid out.
        #[serde(with = "as_string")]
        base_out: u128,
        /// Token units paid out.
        #[serde(with = "as_string")]
        token_out: u128,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Post-state of the pool after any of the events above.
    ReservesSynced {
        /// Caller of the operation that produced this state.
        caller: Address,
        /// Base reserve.
        #[serde(with = "as_string")]
        reserve_base: u128,
        /// Token reserve.
        #[serde(with = "as_string")]
        reserve_token: u128,
        /// Share supply.
        #[serde(with = "as_string")]
        total_shares: u128,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl DexEvent {
    /// Returns the caller that triggered this event.
    #[must_use]
    pub const fn caller(&self) -> Address {
        match self {
            Self::PoolInitialized { caller, .. }
            | Self::SwapBaseForToken { caller, .. }
            | Self::SwapTokenForBase { caller, .. }
            | Self::LiquidityAdded { caller, .. }
            | Self::LiquidityRemoved { caller, .. }
            | Self::ReservesSynced { caller, .. } => *caller,
        }
    }

    /// Returns the event timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::PoolInitialized { timestamp, .. }
            | Self::SwapBaseForToken { timestamp, .. }
            | Self::SwapTokenForBase { timestamp, .. }
            | Self::LiquidityAdded { timestamp, .. }
            | Self::LiquidityRemoved { timestamp, .. }
            | Self::ReservesSynced { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::PoolInitialized { .. } => "pool_initialized",
            Self::SwapBaseForToken { .. } => "swap_base_for_token",
            Self::SwapTokenForBase { .. } => "swap_token_for_base",
            Self::LiquidityAdded { .. } => "liquidity_added",
            Self::LiquidityRemoved { .. } => "liquidity_removed",
            Self::ReservesSynced { .. } => "reserves_synced",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn caller() -> Address {
        Address::from_bytes([7u8; 20])
    }

    #[test]
    fn swap_event_type() {
        let event = DexEvent::SwapBaseForToken {
            caller: caller(),
            base_in: 1,
            token_out: 9,
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_type_str(), "swap_base_for_token");
        assert_eq!(event.caller(), caller());
    }

    #[test]
    fn liquidity_added_serializes_with_string_amounts() {
        let event = DexEvent::LiquidityAdded {
            caller: caller(),
            shares_minted: 3_162_277_660_168_379_331,
            base_in: 1_000_000_000_000_000_000,
            token_in: 10_000_000_000_000_000_000,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event);
        assert!(json.is_ok());
        let json_str = json.unwrap_or_default();
        assert!(json_str.contains("\"event_type\":\"liquidity_added\""));
        assert!(json_str.contains("\"token_in\":\"10000000000000000000\""));
    }

    #[test]
    fn events_round_trip_through_json() {
        let event = DexEvent::LiquidityRemoved {
            caller: caller(),
            shares_redeemed: 31,
            base_out: 10,
            token_out: 100,
            timestamp: Utc::now(),
        };
        let Ok(value) = serde_json::to_value(&event) else {
            panic!("serialization failed");
        };
        let Ok(back) = serde_json::from_value::<DexEvent>(value) else {
            panic!("deserialization failed");
        };
        assert_eq!(back, event);
    }
}
