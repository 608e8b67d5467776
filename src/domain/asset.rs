//! The two asset identities managed by the pool.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One side of the pool's asset pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Asset {
    /// First asset; its deposited amount seeds the share supply.
    #[serde(rename = "A", alias = "a")]
    A,
    /// Second asset.
    #[serde(rename = "B", alias = "b")]
    B,
}

impl Asset {
    /// Returns the other asset of the pair.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}

/// External identities (addresses or handles) of the two pooled assets.
///
/// The ledger itself only distinguishes [`Asset::A`] from [`Asset::B`];
/// the pair maps those back to the token contracts the caller knows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPair {
    asset_a: String,
    asset_b: String,
}

impl Default for AssetPair {
    /// Identifies the assets by their side names, `"A"` and `"B"`.
    fn default() -> Self {
        Self {
            asset_a: "A".to_string(),
            asset_b: "B".to_string(),
        }
    }
}

impl AssetPair {
    /// Creates a pair from two distinct, non-empty identities.
    ///
    /// An identity may not be the opposite side's letter, since
    /// [`Self::resolve`] also accepts side letters.
    ///
    /// # Errors
    ///
    /// Returns a message if either identity is blank, both are equal, or
    /// one names the other side.
    pub fn new(asset_a: impl Into<String>, asset_b: impl Into<String>) -> Result<Self, String> {
        let asset_a = asset_a.into().trim().to_string();
        let asset_b = asset_b.into().trim().to_string();
        if asset_a.is_empty() || asset_b.is_empty() {
            return Err("asset identities must not be empty".to_string());
        }
        if asset_a.eq_ignore_ascii_case(&asset_b) {
            return Err(format!("asset identities must differ, both are {asset_a}"));
        }
        for (identity, side) in [(&asset_a, Asset::A), (&asset_b, Asset::B)] {
            let other = side.opposite();
            if identity.eq_ignore_ascii_case(&other.to_string()) {
                return Err(format!(
                    "asset {side} identity {identity} collides with side name {other}"
                ));
            }
        }
        Ok(Self { asset_a, asset_b })
    }

    /// Returns the external identity of `asset`.
    #[must_use]
    pub fn identity(&self, asset: Asset) -> &str {
        match asset {
            Asset::A => &self.asset_a,
            Asset::B => &self.asset_b,
        }
    }

    /// Resolves a caller-supplied string to an [`Asset`].
    ///
    /// Accepts the literal side names `"A"` / `"B"` or either external
    /// identity (case-insensitive).
    #[must_use]
    pub fn resolve(&self, raw: &str) -> Option<Asset> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("a") || raw.eq_ignore_ascii_case(&self.asset_a) {
            Some(Asset::A)
        } else if raw.eq_ignore_ascii_case("b") || raw.eq_ignore_ascii_case(&self.asset_b) {
            Some(Asset::B)
        } else {
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn pair() -> AssetPair {
        let Ok(pair) = AssetPair::new("DAPP", "USD") else {
            panic!("valid pair");
        };
        pair
    }

    #[test]
    fn opposite_flips() {
        assert_eq!(Asset::A.opposite(), Asset::B);
        assert_eq!(Asset::B.opposite(), Asset::A);
    }

    #[test]
    fn resolve_by_side_or_identity() {
        let pair = pair();
        assert_eq!(pair.resolve("A"), Some(Asset::A));
        assert_eq!(pair.resolve("usd"), Some(Asset::B));
        assert_eq!(pair.resolve("ETH"), None);
    }

    #[test]
    fn identical_identities_rejected() {
        assert!(AssetPair::new("DAPP", "dapp").is_err());
        assert!(AssetPair::new("", "USD").is_err());
    }

    #[test]
    fn crossed_side_letters_rejected() {
        assert!(AssetPair::new("B", "A").is_err());
        assert!(AssetPair::new("b", "USD").is_err());
        assert!(AssetPair::new("DAPP", "a").is_err());

        let Ok(pair) = AssetPair::new("A", "B") else {
            panic!("side letters on their own side are valid");
        };
        assert_eq!(pair.resolve("B"), Some(Asset::B));
    }

    #[test]
    fn serde_uses_side_letters() {
        let json = serde_json::to_string(&Asset::B).unwrap_or_default();
        assert_eq!(json, "\"B\"");
        let parsed: Result<Asset, _> = serde_json::from_str("\"a\"");
        assert_eq!(parsed.ok(), Some(Asset::A));
    }
}
