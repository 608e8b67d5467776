//! Swap and quote DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /pool/swap`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SwapRequest {
    /// Trader whose escrow funds the swap.
    pub holder: String,
    /// Asset sold: `"A"`, `"B"`, or an external identity.
    pub asset_in: String,
    /// Exact input amount (string-encoded u128), fee included.
    pub amount_in: String,
    /// Minimum output for slippage protection (string-encoded u128).
    #[serde(default)]
    pub min_amount_out: Option<String>,
}

/// Response body for `POST /pool/swap`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SwapResponse {
    /// Logical timestamp of the swap.
    pub sequence: u64,
    /// External identity of the asset sold.
    pub asset_in: String,
    /// External identity of the asset bought.
    pub asset_out: String,
    /// Input amount (string-encoded).
    pub amount_in: String,
    /// Output amount paid into the holder's escrow (string-encoded).
    pub amount_out: String,
    /// Fee retained by the pool (string-encoded).
    pub fee: String,
    /// Reserve of asset A after the swap (string-encoded).
    pub reserve_a: String,
    /// Reserve of asset B after the swap (string-encoded).
    pub reserve_b: String,
    /// Execution timestamp.
    pub executed_at: DateTime<Utc>,
}

/// Request body for `POST /pool/quote`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct QuoteRequest {
    /// Asset sold: `"A"`, `"B"`, or an external identity.
    pub asset_in: String,
    /// Exact input amount (string-encoded u128), fee included.
    pub amount_in: String,
}

/// Response body for `POST /pool/quote`.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuoteResponse {
    /// External identity of the asset sold.
    pub asset_in: String,
    /// External identity of the asset bought.
    pub asset_out: String,
    /// Input amount (string-encoded).
    pub amount_in: String,
    /// Quoted output amount (string-encoded).
    pub amount_out: String,
    /// Fee amount (string-encoded).
    pub fee: String,
    /// Reserve of asset A if the swap executed now (string-encoded).
    pub reserve_a_after: String,
    /// Reserve of asset B if the swap executed now (string-encoded).
    pub reserve_b_after: String,
    /// Quote timestamp.
    pub quoted_at: DateTime<Utc>,
}
