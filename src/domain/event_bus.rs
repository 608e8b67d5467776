//! Broadcast channel for domain events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Every committed
//! ledger mutation publishes a [`PoolEvent`] through the bus, and all
//! WebSocket connections subscribe to receive filtered events.

use tokio::sync::broadcast;

use super::PoolEvent;

/// Broadcast bus for [`PoolEvent`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity
/// (default 10 000). Lagging receivers lose the oldest events. Publishing
/// never blocks, so it is safe to call right after the write lock drops.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PoolEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes one event. Returns the number of receivers it reached,
    /// zero when nobody is subscribed.
    pub fn publish(&self, event: PoolEvent) -> usize {
        let event_type = event.event_type_str();
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::trace!(event_type, delivered, "event published");
        delivered
    }

    /// Publishes the events of one committed operation in order.
    ///
    /// Returns the number of events that reached at least one receiver.
    pub fn publish_all<I>(&self, events: I) -> usize
    where
        I: IntoIterator<Item = PoolEvent>,
    {
        events
            .into_iter()
            .map(|event| self.publish(event))
            .filter(|&delivered| delivered > 0)
            .count()
    }

    /// Creates a receiver for all events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::HolderId;
    use chrono::Utc;

    fn make_event(holder: &str) -> PoolEvent {
        let Ok(holder) = HolderId::new(holder) else {
            panic!("valid holder");
        };
        PoolEvent::EscrowUpdated {
            holder,
            asset_a: crate::domain::Amount::new(10),
            asset_b: crate::domain::Amount::ZERO,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(100);
        let count = bus.publish(make_event("0xaaa"));
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn subscriber_receives_event() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();

        bus.publish(make_event("0xaaa"));

        let event = rx.recv().await;
        let Ok(event) = event else {
            panic!("expected to receive event");
        };
        assert_eq!(event.holder().map(HolderId::as_str), Some("0xaaa"));
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(100);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let count = bus.publish(make_event("0xbbb"));
        assert_eq!(count, 2);

        let Ok(e1) = rx1.recv().await else {
            panic!("rx1 failed");
        };
        let Ok(e2) = rx2.recv().await else {
            panic!("rx2 failed");
        };
        assert_eq!(e1.event_type_str(), e2.event_type_str());
    }

    #[tokio::test]
    async fn publish_all_keeps_commit_order() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish_all([make_event("0x1"), make_event("0x2")]), 0);

        let mut rx = bus.subscribe();
        let delivered = bus.publish_all(["0x1", "0x2", "0x3"].map(make_event));
        assert_eq!(delivered, 3);
        for expected in ["0x1", "0x2", "0x3"] {
            let Ok(event) = rx.recv().await else {
                panic!("missing event");
            };
            assert_eq!(event.holder().map(HolderId::as_str), Some(expected));
        }
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let bus = EventBus::new(100);
        assert_eq!(bus.receiver_count(), 0);

        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);

        drop(rx1);
        assert_eq!(bus.receiver_count(), 1);
    }
}
