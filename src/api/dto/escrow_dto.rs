//! Escrow DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{EscrowBalance, HolderId};

/// Request body for `POST /escrow/{holder}/credit` and `/debit`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EscrowTransferRequest {
    /// Asset moved: `"A"`, `"B"`, or an external identity.
    pub asset: String,
    /// Amount moved (string-encoded u128).
    pub amount: String,
}

/// Escrow balances of one holder.
#[derive(Debug, Serialize, ToSchema)]
pub struct EscrowResponse {
    /// Holder identifier.
    pub holder: String,
    /// Escrowed asset A (string-encoded).
    pub asset_a: String,
    /// Escrowed asset B (string-encoded).
    pub asset_b: String,
}

impl EscrowResponse {
    /// Builds the response for `holder`.
    #[must_use]
    pub fn new(holder: &HolderId, balance: EscrowBalance) -> Self {
        Self {
            holder: holder.to_string(),
            asset_a: balance.asset_a.to_string(),
            asset_b: balance.asset_b.to_string(),
        }
    }
}
