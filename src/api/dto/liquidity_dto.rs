//! Deposit and withdrawal DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /pool/deposit`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositRequest {
    /// Depositor whose escrow funds the deposit.
    pub holder: String,
    /// Asset A to deposit (string-encoded u128).
    pub amount_a: String,
    /// Asset B offered (string-encoded u128). Any excess over the ratio
    /// requirement is returned to escrow.
    pub amount_b: String,
}

/// Response body for `POST /pool/deposit`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DepositResponse {
    /// Depositor.
    pub holder: String,
    /// Shares minted (string-encoded).
    pub shares_minted: String,
    /// Asset A credited to the reserve (string-encoded).
    pub amount_a: String,
    /// Asset B credited to the reserve (string-encoded).
    pub amount_b: String,
    /// Asset B returned to escrow (string-encoded).
    pub amount_b_unused: String,
}

/// Request body for `POST /pool/deposit/estimate`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositEstimateRequest {
    /// Side the amount is given in: `"A"`, `"B"`, or an external identity.
    pub asset: String,
    /// Amount of `asset` (string-encoded u128).
    pub amount: String,
}

/// Response body for `POST /pool/deposit/estimate`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DepositEstimateResponse {
    /// External identity of the given side.
    pub asset: String,
    /// Given amount (string-encoded).
    pub amount: String,
    /// External identity of the paired side.
    pub paired_asset: String,
    /// Amount of the paired side required at the current ratio (string-encoded).
    pub paired_amount: String,
}

/// Request body for `POST /pool/withdraw`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WithdrawRequest {
    /// Holder burning shares.
    pub holder: String,
    /// Shares to burn (string-encoded u128).
    pub shares: String,
}

/// Request body for `POST /pool/withdraw/estimate`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WithdrawEstimateRequest {
    /// Shares to burn (string-encoded u128).
    pub shares: String,
}

/// Response body for `POST /pool/withdraw` and its estimate.
#[derive(Debug, Serialize, ToSchema)]
pub struct WithdrawResponse {
    /// Shares burned (string-encoded).
    pub shares_burned: String,
    /// Asset A paid out (string-encoded).
    pub amount_a: String,
    /// Asset B paid out (string-encoded).
    pub amount_b: String,
}
