//! Pool state, share, and swap log DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::CursorMeta;
use crate::domain::{AssetPair, PoolSummary, SwapRecord};

/// Response body for `GET /pool`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PoolResponse {
    /// External identity of asset A.
    pub asset_a: String,
    /// External identity of asset B.
    pub asset_b: String,
    /// Reserve of asset A (string-encoded).
    pub reserve_a: String,
    /// Reserve of asset B (string-encoded).
    pub reserve_b: String,
    /// Outstanding share supply (string-encoded).
    pub total_shares: String,
    /// `reserve_a × reserve_b` (string-encoded, up to 256 bits).
    pub invariant_k: String,
    /// `"empty"` or `"funded"`.
    pub state: String,
    /// Spot price of A in units of B, display only.
    pub spot_price: String,
    /// Swap fee in basis points.
    pub fee_bps: u32,
    /// Holders with a non-zero share balance.
    pub holder_count: usize,
    /// Swaps executed.
    pub swap_count: usize,
    /// Cumulative asset A sold into the pool (string-encoded).
    pub volume_a: String,
    /// Cumulative asset B sold into the pool (string-encoded).
    pub volume_b: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub last_modified_at: DateTime<Utc>,
}

impl From<PoolSummary> for PoolResponse {
    fn from(s: PoolSummary) -> Self {
        Self {
            asset_a: s.asset_a,
            asset_b: s.asset_b,
            reserve_a: s.reserve_a.to_string(),
            reserve_b: s.reserve_b.to_string(),
            total_shares: s.total_shares.to_string(),
            invariant_k: s.invariant_k,
            state: s.state.as_str().to_string(),
            spot_price: format!("{}", s.spot_price),
            fee_bps: s.fee_bps,
            holder_count: s.holder_count,
            swap_count: s.swap_count,
            volume_a: s.volume_a.to_string(),
            volume_b: s.volume_b.to_string(),
            created_at: s.created_at,
            last_modified_at: s.last_modified_at,
        }
    }
}

/// Response body for `GET /pool/shares/{holder}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SharesResponse {
    /// Holder identifier.
    pub holder: String,
    /// Holder's share balance (string-encoded).
    pub shares: String,
    /// Outstanding share supply (string-encoded).
    pub total_shares: String,
}

/// A single swap log entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct SwapRecordDto {
    /// Logical timestamp.
    pub sequence: u64,
    /// Trader.
    pub holder: String,
    /// External identity of the asset sold.
    pub asset_in: String,
    /// Amount sold (string-encoded).
    pub amount_in: String,
    /// External identity of the asset bought.
    pub asset_out: String,
    /// Amount bought (string-encoded).
    pub amount_out: String,
    /// Fee retained (string-encoded).
    pub fee: String,
    /// Reserve of asset A after the swap (string-encoded).
    pub reserve_a: String,
    /// Reserve of asset B after the swap (string-encoded).
    pub reserve_b: String,
    /// Execution timestamp.
    pub executed_at: DateTime<Utc>,
}

impl SwapRecordDto {
    /// Builds the DTO, resolving asset sides to external identities.
    #[must_use]
    pub fn from_record(record: &SwapRecord, assets: &AssetPair) -> Self {
        Self {
            sequence: record.sequence,
            holder: record.holder.to_string(),
            asset_in: assets.identity(record.asset_in).to_string(),
            amount_in: record.amount_in.to_string(),
            asset_out: assets.identity(record.asset_out).to_string(),
            amount_out: record.amount_out.to_string(),
            fee: record.fee.to_string(),
            reserve_a: record.reserve_a.to_string(),
            reserve_b: record.reserve_b.to_string(),
            executed_at: record.executed_at,
        }
    }
}

/// Response body for `GET /pool/swaps`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SwapLogResponse {
    /// Records, oldest first.
    pub data: Vec<SwapRecordDto>,
    /// Cursor metadata.
    pub cursor: CursorMeta,
}
