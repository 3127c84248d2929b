//! Per-connection subscription manager.
//!
//! Tracks which callers a WebSocket client follows and provides
//! server-side event filtering on [`DexEvent::caller`].
//!
//! [`DexEvent::caller`]: crate::domain::DexEvent::caller

use std::collections::HashSet;

use crate::domain::Address;

/// Manages the set of followed addresses for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Followed callers. If `subscribe_all` is true, this set is ignored.
    addresses: HashSet<Address>,
    /// Whether the client follows every caller (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds addresses to the subscription set; `wildcard` follows everyone.
    pub fn subscribe(&mut self, addresses: &[Address], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.addresses.extend(addresses.iter().copied());
    }

    /// Removes addresses from the subscription set; `wildcard` clears the
    /// follow-everyone flag.
    pub fn unsubscribe(&mut self, addresses: &[Address], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for address in addresses {
            self.addresses.remove(address);
        }
    }

    /// Returns `true` if events from `caller` pass the filter.
    #[must_use]
    pub fn matches(&self, caller: Address) -> bool {
        self.subscribe_all || self.addresses.contains(&caller)
    }

    /// Returns the number of explicitly followed addresses.
    #[must_use]
    pub fn count(&self) -> usize {
        self.addresses.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
