//! Per-connection subscription manager.
//!
//! Tracks which topics and holders a WebSocket client follows and
//! provides server-side event filtering.

use std::collections::HashSet;

use crate::domain::{EventTopic, HolderId, PoolEvent};

/// Manages the subscriptions of a single WebSocket connection.
///
/// An event is forwarded when its topic is subscribed and, if a holder
/// filter is set, the event concerns one of those holders. Events without
/// a holder (price updates) ignore the holder filter.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed topics. If `subscribe_all` is true, this set is ignored.
    topics: HashSet<EventTopic>,
    /// Whether the client subscribes to every topic (wildcard `"*"`).
    subscribe_all: bool,
    /// Holder filter; empty means every holder.
    holders: HashSet<HolderId>,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds topics and holders to the filter.
    pub fn subscribe(&mut self, topics: &[EventTopic], wildcard: bool, holders: &[HolderId]) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.topics.extend(topics.iter().copied());
        self.holders.extend(holders.iter().cloned());
    }

    /// Removes topics and holders from the filter. The wildcard is
    /// cleared when `wildcard` is set.
    pub fn unsubscribe(&mut self, topics: &[EventTopic], wildcard: bool, holders: &[HolderId]) {
        if wildcard {
            self.subscribe_all = false;
        }
        for topic in topics {
            self.topics.remove(topic);
        }
        for holder in holders {
            self.holders.remove(holder);
        }
    }

    /// Returns `true` if the event passes the subscription filter.
    #[must_use]
    pub fn matches(&self, event: &PoolEvent) -> bool {
        let topic_ok = self.subscribe_all || self.topics.contains(&event.topic());
        let holder_ok = self.holders.is_empty()
            || event.holder().is_none_or(|holder| self.holders.contains(holder));
        topic_ok && holder_ok
    }

    /// Returns the explicitly subscribed topics.
    #[must_use]
    pub fn topics(&self) -> Vec<EventTopic> {
        self.topics.iter().copied().collect()
    }

    /// Returns the number of holders in the filter.
    #[must_use]
    pub fn holder_count(&self) -> usize {
        self.holders.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::{Amount, PriceChangeReason};

    fn holder(raw: &str) -> HolderId {
        let Ok(id) = HolderId::new(raw) else {
            panic!("valid holder");
        };
        id
    }

    fn escrow_event(raw: &str) -> PoolEvent {
        PoolEvent::EscrowUpdated {
            holder: holder(raw),
            asset_a: Amount::new(1),
            asset_b: Amount::ZERO,
            timestamp: Utc::now(),
        }
    }

    fn price_event() -> PoolEvent {
        PoolEvent::PriceUpdated {
            old_price: "1".to_string(),
            new_price: "2".to_string(),
            price_change_bps: 10_000,
            reason: PriceChangeReason::SwapExecuted,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(&escrow_event("0xa")));
        assert!(!mgr.matches(&price_event()));
    }

    #[test]
    fn subscribe_specific_topic() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[EventTopic::Escrow], false, &[]);
        assert!(mgr.matches(&escrow_event("0xa")));
        assert!(!mgr.matches(&price_event()));
    }

    #[test]
    fn wildcard_matches_everything() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[], true, &[]);
        assert!(mgr.matches(&escrow_event("0xa")));
        assert!(mgr.matches(&price_event()));
    }

    #[test]
    fn holder_filter_skips_other_holders_but_not_price() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[], true, &[holder("0xa")]);
        assert!(mgr.matches(&escrow_event("0xa")));
        assert!(!mgr.matches(&escrow_event("0xb")));
        assert!(mgr.matches(&price_event()));
        assert_eq!(mgr.holder_count(), 1);
    }

    #[test]
    fn unsubscribe_removes_topic() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[EventTopic::Escrow, EventTopic::Price], false, &[]);
        mgr.unsubscribe(&[EventTopic::Escrow], false, &[]);
        assert!(!mgr.matches(&escrow_event("0xa")));
        assert_eq!(mgr.topics(), vec![EventTopic::Price]);
    }
}
