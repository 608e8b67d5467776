//! Shared DTO types and request parsing helpers.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Amount, Asset, AssetPair, HolderId};
use crate::error::GatewayError;

/// Cursor parameters for the swap log.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SwapLogParams {
    /// Return records with a sequence strictly greater than this. Defaults to 0.
    #[serde(default)]
    pub after: u64,
    /// Maximum records to return (1..=500). Defaults to 50.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// Cursor metadata included in swap log responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CursorMeta {
    /// Cursor that was applied.
    pub after: u64,
    /// Limit that was applied.
    pub limit: usize,
    /// Pass as `after` to fetch the next page; absent when the page was short.
    pub next_after: Option<u64>,
}

fn default_limit() -> usize {
    50
}

impl SwapLogParams {
    /// Clamps `limit` to the allowed range.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            after: self.after,
            limit: self.limit.clamp(1, 500),
        }
    }
}

/// Parses a string-encoded amount.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] naming `field` if `raw` is not
/// a non-negative integer that fits in `u128`.
pub fn parse_amount(field: &str, raw: &str) -> Result<Amount, GatewayError> {
    raw.parse::<Amount>()
        .map_err(|_| GatewayError::InvalidRequest(format!("invalid {field}: {raw}")))
}

/// Parses an optional string-encoded amount, defaulting to zero.
///
/// # Errors
///
/// Same as [`parse_amount`].
pub fn parse_optional_amount(field: &str, raw: Option<&str>) -> Result<Amount, GatewayError> {
    raw.map_or(Ok(Amount::ZERO), |raw| parse_amount(field, raw))
}

/// Parses a holder identifier.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] if `raw` is blank.
pub fn parse_holder(raw: &str) -> Result<HolderId, GatewayError> {
    HolderId::new(raw).map_err(GatewayError::InvalidRequest)
}

/// Resolves an asset name or external identity against the pool's pair.
///
/// # Errors
///
/// Returns [`GatewayError::UnknownAsset`] if `raw` names neither asset.
pub fn parse_asset(assets: &AssetPair, raw: &str) -> Result<Asset, GatewayError> {
    assets
        .resolve(raw)
        .ok_or_else(|| GatewayError::UnknownAsset(raw.to_string()))
}
