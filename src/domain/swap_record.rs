//! Append-only swap log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Amount, Asset, HolderId};

/// Immutable record emitted for every executed swap.
///
/// `sequence` is the ledger's logical timestamp: it starts at 1 and grows
/// by one per swap. `executed_at` is wall-clock time for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRecord {
    /// Logical timestamp, strictly increasing.
    pub sequence: u64,
    /// Holder that initiated the trade.
    pub holder: HolderId,
    /// Asset sold into the pool.
    pub asset_in: Asset,
    /// Amount sold, fee included.
    pub amount_in: Amount,
    /// Asset bought from the pool.
    pub asset_out: Asset,
    /// Amount paid out by the pool.
    pub amount_out: Amount,
    /// Portion of `amount_in` retained as fee.
    pub fee: Amount,
    /// Reserve of asset A after the swap.
    pub reserve_a: Amount,
    /// Reserve of asset B after the swap.
    pub reserve_b: Amount,
    /// Wall-clock execution time.
    pub executed_at: DateTime<Utc>,
}
