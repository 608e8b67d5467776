//! Pool entry combining the ledger with custody and server-side metadata.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use serde::Serialize;

use super::{
    Amount, Asset, AssetCustody, AssetPair, EscrowBalance, EscrowVault, HolderId, PoolLedger,
    PoolState,
};

/// Aggregate guarded by the service's single write lock.
///
/// `ledger` holds reserves and shares, `custody` holds the matching vault
/// and holder escrow; the remaining fields track operational metadata.
/// After every committed operation the vault balances equal the ledger
/// reserves.
#[derive(Debug)]
pub struct PoolEntry {
    /// The pool ledger.
    pub ledger: PoolLedger,

    /// Escrow and pool vault.
    pub custody: EscrowVault,

    /// External identities of assets A and B (immutable).
    pub assets: AssetPair,

    /// Creation timestamp (immutable).
    pub created_at: DateTime<Utc>,

    /// Timestamp of last state mutation.
    pub last_modified_at: DateTime<Utc>,

    /// Cumulative asset A sold into the pool.
    pub volume_a: Amount,

    /// Cumulative asset B sold into the pool.
    pub volume_b: Amount,
}

impl PoolEntry {
    /// Creates an entry around a ledger, seeding the vault with its reserves.
    #[must_use]
    pub fn new(ledger: PoolLedger, assets: AssetPair) -> Self {
        let (reserve_a, reserve_b) = ledger.reserves();
        let now = Utc::now();
        Self {
            ledger,
            custody: EscrowVault::with_reserves(reserve_a, reserve_b),
            assets,
            created_at: now,
            last_modified_at: now,
            volume_a: Amount::ZERO,
            volume_b: Amount::ZERO,
        }
    }

    /// Rebuilds an entry from a restored ledger and persisted escrows.
    #[must_use]
    pub fn restore(
        ledger: PoolLedger,
        escrows: BTreeMap<HolderId, EscrowBalance>,
        assets: AssetPair,
    ) -> Self {
        let (reserve_a, reserve_b) = ledger.reserves();
        let mut entry = Self::new(ledger, assets);
        entry.custody = EscrowVault::restore(reserve_a, reserve_b, escrows);
        entry
    }

    /// Returns `true` if the vault holds exactly the ledger reserves.
    #[must_use]
    pub fn in_sync(&self) -> bool {
        let (reserve_a, reserve_b) = self.ledger.reserves();
        self.custody.vault_balance(Asset::A) == reserve_a
            && self.custody.vault_balance(Asset::B) == reserve_b
    }

    /// Spot price of asset A in units of asset B, for display only.
    #[must_use]
    pub fn spot_price(&self) -> f64 {
        let (reserve_a, reserve_b) = self.ledger.reserves();
        if reserve_a.is_zero() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            reserve_b.get() as f64 / reserve_a.get() as f64
        }
    }

    /// Builds a read-only summary of the entry.
    #[must_use]
    pub fn summary(&self) -> PoolSummary {
        let (reserve_a, reserve_b) = self.ledger.reserves();
        PoolSummary {
            asset_a: self.assets.identity(Asset::A).to_string(),
            asset_b: self.assets.identity(Asset::B).to_string(),
            reserve_a,
            reserve_b,
            total_shares: self.ledger.total_shares(),
            invariant_k: self.ledger.invariant_k().to_string(),
            state: self.ledger.state(),
            spot_price: self.spot_price(),
            fee_bps: self.ledger.fee_policy().bps(),
            holder_count: self.ledger.holders().len(),
            swap_count: self.ledger.swap_count(),
            volume_a: self.volume_a,
            volume_b: self.volume_b,
            created_at: self.created_at,
            last_modified_at: self.last_modified_at,
        }
    }
}

/// Point-in-time view of the pool for listing endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PoolSummary {
    /// External identity of asset A.
    pub asset_a: String,
    /// External identity of asset B.
    pub asset_b: String,
    /// Reserve of asset A.
    pub reserve_a: Amount,
    /// Reserve of asset B.
    pub reserve_b: Amount,
    /// Outstanding share supply.
    pub total_shares: Amount,
    /// `reserve_a × reserve_b` as a decimal string.
    pub invariant_k: String,
    /// Macro-state.
    pub state: PoolState,
    /// Spot price of A in units of B.
    pub spot_price: f64,
    /// Swap fee in basis points.
    pub fee_bps: u32,
    /// Number of holders with a non-zero share balance.
    pub holder_count: usize,
    /// Number of swaps executed.
    pub swap_count: usize,
    /// Cumulative asset A sold into the pool.
    pub volume_a: Amount,
    /// Cumulative asset B sold into the pool.
    pub volume_b: Amount,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub last_modified_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn holder() -> HolderId {
        let Ok(id) = HolderId::new("0xlp") else {
            panic!("valid holder");
        };
        id
    }

    #[test]
    fn new_entry_seeds_vault_from_reserves() {
        let entry = PoolEntry::new(PoolLedger::default(), AssetPair::default());
        assert!(entry.in_sync());
        assert_eq!(entry.spot_price(), 0.0);
        assert_eq!(entry.summary().state, PoolState::Empty);
    }

    #[test]
    fn ledger_change_without_custody_is_out_of_sync() {
        let mut entry = PoolEntry::new(PoolLedger::default(), AssetPair::default());
        let _ = entry
            .ledger
            .deposit(&holder(), Amount::new(100), Amount::new(400));
        assert!(!entry.in_sync());
        assert!((entry.spot_price() - 4.0).abs() < f64::EPSILON);

        let summary = entry.summary();
        assert_eq!(summary.invariant_k, "40000");
        assert_eq!(summary.holder_count, 1);
    }

    #[test]
    fn restore_keeps_escrows_and_reserves() {
        let h = holder();
        let mut ledger = PoolLedger::default();
        let _ = ledger.deposit(&h, Amount::new(10), Amount::new(10));
        let mut escrows = BTreeMap::new();
        escrows.insert(
            h.clone(),
            EscrowBalance {
                asset_a: Amount::new(3),
                asset_b: Amount::ZERO,
            },
        );
        let entry = PoolEntry::restore(ledger, escrows, AssetPair::default());
        assert!(entry.in_sync());
        assert_eq!(entry.custody.escrow_of(&h).asset_a, Amount::new(3));
    }
}
