//! Fan-out of committed pool events.
//!
//! Each committed operation publishes its own [`DexEvent`] and then a
//! [`DexEvent::ReservesSynced`] for the same caller. Subscribers (the
//! WebSocket connections and the event-log recorder) see that pair in
//! publish order; filtering by caller happens on the subscriber side.

use tokio::sync::broadcast;

use super::DexEvent;

/// Broadcast bus for [`DexEvent`]s.
///
/// Capacity is the number of events a slow receiver may fall behind by
/// (10 000 by default) before it starts missing the oldest ones.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DexEvent>,
}

impl EventBus {
    /// Creates a bus holding up to `capacity` undelivered events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes `event` and returns how many receivers got it; zero when
    /// nobody is listening.
    pub fn publish(&self, event: DexEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Receiver for events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DexEvent> {
        self.sender.subscribe()
    }

    /// Number of live receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::Address;
    use crate::ws::subscription::SubscriptionManager;

    fn swap_pair(caller: Address, reserve_base: u128) -> [DexEvent; 2] {
        let timestamp = Utc::now();
        [
            DexEvent::SwapBaseForToken {
                caller,
                base_in: 1,
                token_out: 9,
                timestamp,
            },
            DexEvent::ReservesSynced {
                caller,
                reserve_base,
                reserve_token: 91,
                total_shares: 31,
                timestamp,
            },
        ]
    }

    #[test]
    fn publish_without_receivers_is_dropped() {
        let bus = EventBus::new(16);
        let [swap, _] = swap_pair(Address::ZERO, 11);
        assert_eq!(bus.publish(swap), 0);
        assert_eq!(bus.receiver_count(), 0);
    }

    #[tokio::test]
    async fn reserves_synced_follows_its_operation_for_every_subscriber() {
        let bus = EventBus::new(16);
        let mut ws = bus.subscribe();
        let mut recorder = bus.subscribe();

        let alice = Address::from_bytes([0xa1; 20]);
        let bob = Address::from_bytes([0xb0; 20]);
        for event in swap_pair(alice, 11).into_iter().chain(swap_pair(bob, 12)) {
            assert_eq!(bus.publish(event), 2);
        }

        for rx in [&mut ws, &mut recorder] {
            let mut seen = Vec::new();
            for _ in 0..4 {
                let Ok(event) = rx.recv().await else {
                    panic!("expected four events");
                };
                seen.push((event.event_type_str(), event.caller()));
            }
            assert_eq!(
                seen,
                [
                    ("swap_base_for_token", alice),
                    ("reserves_synced", alice),
                    ("swap_base_for_token", bob),
                    ("reserves_synced", bob),
                ]
            );
        }
    }

    #[tokio::test]
    async fn caller_filter_keeps_both_events_of_a_matching_operation() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let alice = Address::from_bytes([0xa1; 20]);
        let bob = Address::from_bytes([0xb0; 20]);
        let mut filter = SubscriptionManager::new();
        filter.subscribe(&[bob], false);

        for event in swap_pair(alice, 11).into_iter().chain(swap_pair(bob, 12)) {
            bus.publish(event);
        }

        let mut delivered = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if filter.matches(event.caller()) {
                delivered.push(event);
            }
        }
        assert_eq!(delivered.len(), 2);
        assert!(delivered.iter().all(|e| e.caller() == bob));
        let Some(DexEvent::ReservesSynced { reserve_base, .. }) = delivered.last() else {
            panic!("expected reserves_synced last, got {delivered:?}");
        };
        assert_eq!(*reserve_base, 12);
    }

    #[tokio::test]
    async fn lagging_receiver_reports_dropped_events() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        let alice = Address::from_bytes([0xa1; 20]);
        for base in 0..3u128 {
            for event in swap_pair(alice, base) {
                bus.publish(event);
            }
        }

        let Err(broadcast::error::RecvError::Lagged(missed)) = rx.recv().await else {
            panic!("expected lag");
        };
        assert_eq!(missed, 4);
        let Ok(DexEvent::SwapBaseForToken { .. }) = rx.recv().await else {
            panic!("expected the newest pair after the lag");
        };
    }
}
