//! Domain events reflecting committed ledger mutations.
//!
//! Every committed operation emits one or more [`PoolEvent`]s through the
//! [`super::EventBus`]. Events are broadcast to WebSocket subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Amount, Asset, HolderId, SwapRecord};

/// Reason why a price update occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceChangeReason {
    /// Price changed due to a swap execution.
    SwapExecuted,
    /// Price changed due to liquidity being added.
    LiquidityAdded,
    /// Price changed due to liquidity being removed.
    LiquidityRemoved,
}

/// Subscription topic an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTopic {
    /// Swap executions.
    Swaps,
    /// Deposits and withdrawals.
    Liquidity,
    /// Spot price movements.
    Price,
    /// Escrow balance changes.
    Escrow,
}

impl EventTopic {
    /// Parses a topic name as used on the wire.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "swaps" => Some(Self::Swaps),
            "liquidity" => Some(Self::Liquidity),
            "price" => Some(Self::Price),
            "escrow" => Some(Self::Escrow),
            _ => None,
        }
    }
}

/// Domain event emitted after every committed mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PoolEvent {
    /// Emitted after a deposit mints shares.
    LiquidityAdded {
        /// Depositor.
        holder: HolderId,
        /// Asset A credited.
        amount_a: Amount,
        /// Asset B credited.
        amount_b: Amount,
        /// Shares minted.
        shares_minted: Amount,
        /// Share supply after the deposit.
        total_shares: Amount,
        /// Reserve of asset A after the deposit.
        reserve_a: Amount,
        /// Reserve of asset B after the deposit.
        reserve_b: Amount,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a withdrawal burns shares.
    LiquidityRemoved {
        /// Withdrawing holder.
        holder: HolderId,
        /// Shares burned.
        shares_burned: Amount,
        /// Asset A paid out.
        amount_a: Amount,
        /// Asset B paid out.
        amount_b: Amount,
        /// Share supply after the withdrawal.
        total_shares: Amount,
        /// Reserve of asset A after the withdrawal.
        reserve_a: Amount,
        /// Reserve of asset B after the withdrawal.
        reserve_b: Amount,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a successful swap. Mirrors the [`SwapRecord`].
    SwapExecuted {
        /// Logical timestamp of the swap.
        sequence: u64,
        /// Trader.
        holder: HolderId,
        /// Asset sold.
        asset_in: Asset,
        /// Amount sold.
        amount_in: Amount,
        /// Asset bought.
        asset_out: Asset,
        /// Amount bought.
        amount_out: Amount,
        /// Fee retained.
        fee: Amount,
        /// Reserve of asset A after the swap.
        reserve_a: Amount,
        /// Reserve of asset B after the swap.
        reserve_b: Amount,
        /// Execution timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after any operation that moves the spot price `B per A`.
    PriceUpdated {
        /// Spot price before the operation.
        old_price: String,
        /// Spot price after the operation.
        new_price: String,
        /// Price change in basis points.
        price_change_bps: i32,
        /// Why the price changed.
        reason: PriceChangeReason,
        /// Timestamp of the price update.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a holder's escrow balances change.
    EscrowUpdated {
        /// Holder whose escrow changed.
        holder: HolderId,
        /// Escrowed asset A after the change.
        asset_a: Amount,
        /// Escrowed asset B after the change.
        asset_b: Amount,
        /// Timestamp of the change.
        timestamp: DateTime<Utc>,
    },
}

impl PoolEvent {
    /// Builds a `SwapExecuted` event from a committed record.
    #[must_use]
    pub fn swap_executed(record: &SwapRecord) -> Self {
        Self::SwapExecuted {
            sequence: record.sequence,
            holder: record.holder.clone(),
            asset_in: record.asset_in,
            amount_in: record.amount_in,
            asset_out: record.asset_out,
            amount_out: record.amount_out,
            fee: record.fee,
            reserve_a: record.reserve_a,
            reserve_b: record.reserve_b,
            timestamp: record.executed_at,
        }
    }

    /// Returns the topic this event is published under.
    #[must_use]
    pub const fn topic(&self) -> EventTopic {
        match self {
            Self::LiquidityAdded { .. } | Self::LiquidityRemoved { .. } => EventTopic::Liquidity,
            Self::SwapExecuted { .. } => EventTopic::Swaps,
            Self::PriceUpdated { .. } => EventTopic::Price,
            Self::EscrowUpdated { .. } => EventTopic::Escrow,
        }
    }

    /// Returns the holder the event concerns, if any.
    #[must_use]
    pub const fn holder(&self) -> Option<&HolderId> {
        match self {
            Self::LiquidityAdded { holder, .. }
            | Self::LiquidityRemoved { holder, .. }
            | Self::SwapExecuted { holder, .. }
            | Self::EscrowUpdated { holder, .. } => Some(holder),
            Self::PriceUpdated { .. } => None,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::LiquidityAdded { .. } => "liquidity_added",
            Self::LiquidityRemoved { .. } => "liquidity_removed",
            Self::SwapExecuted { .. } => "swap_executed",
            Self::PriceUpdated { .. } => "price_updated",
            Self::EscrowUpdated { .. } => "escrow_updated",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn holder() -> HolderId {
        let Ok(id) = HolderId::new("0xaaa") else {
            panic!("valid holder");
        };
        id
    }

    fn record() -> SwapRecord {
        SwapRecord {
            sequence: 7,
            holder: holder(),
            asset_in: Asset::A,
            amount_in: Amount::new(1_000),
            asset_out: Asset::B,
            amount_out: Amount::new(990),
            fee: Amount::ZERO,
            reserve_a: Amount::new(101_000),
            reserve_b: Amount::new(99_010),
            executed_at: Utc::now(),
        }
    }

    #[test]
    fn swap_event_mirrors_record() {
        let event = PoolEvent::swap_executed(&record());
        assert_eq!(event.event_type_str(), "swap_executed");
        assert_eq!(event.topic(), EventTopic::Swaps);
        assert_eq!(event.holder(), Some(&holder()));
    }

    #[test]
    fn swap_event_serializes_amounts_as_strings() {
        let json = serde_json::to_string(&PoolEvent::swap_executed(&record())).unwrap_or_default();
        assert!(json.contains("\"event_type\":\"swap_executed\""));
        assert!(json.contains("\"amount_out\":\"990\""));
        assert!(json.contains("\"asset_in\":\"A\""));
    }

    #[test]
    fn price_event_has_no_holder() {
        let event = PoolEvent::PriceUpdated {
            old_price: "1".to_string(),
            new_price: "0.99".to_string(),
            price_change_bps: -100,
            reason: PriceChangeReason::SwapExecuted,
            timestamp: Utc::now(),
        };
        assert!(event.holder().is_none());
        assert_eq!(event.topic(), EventTopic::Price);
    }

    #[test]
    fn topic_parse() {
        assert_eq!(EventTopic::parse("swaps"), Some(EventTopic::Swaps));
        assert_eq!(EventTopic::parse("pools"), None);
    }
}
