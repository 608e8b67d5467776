//! Database models for ledger snapshots and swap records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Amount, AssetPair, EscrowBalance, HolderId, LedgerError, LedgerSnapshot, PoolEntry, PoolLedger,
    SwapRecord,
};

/// Everything needed to rebuild a [`PoolEntry`], minus the swap log.
///
/// Stored as JSONB in `ledger_snapshots.state_json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Ledger reserves, shares, fee, and next sequence.
    pub ledger: LedgerSnapshot,
    /// Non-empty holder escrows.
    pub escrows: BTreeMap<HolderId, EscrowBalance>,
    /// Asset identities the pool was created with.
    pub assets: AssetPair,
    /// Cumulative asset A sold into the pool.
    #[serde(default)]
    pub volume_a: Amount,
    /// Cumulative asset B sold into the pool.
    #[serde(default)]
    pub volume_b: Amount,
    /// Pool creation timestamp.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last mutation.
    #[serde(default = "Utc::now")]
    pub last_modified_at: DateTime<Utc>,
}

impl PersistedState {
    /// Captures the persistable state of an entry.
    #[must_use]
    pub fn capture(entry: &PoolEntry) -> Self {
        Self {
            ledger: entry.ledger.snapshot(),
            escrows: entry.custody.escrows().clone(),
            assets: entry.assets.clone(),
            volume_a: entry.volume_a,
            volume_b: entry.volume_b,
            created_at: entry.created_at,
            last_modified_at: entry.last_modified_at,
        }
    }

    /// Rebuilds a [`PoolEntry`] from this state and the persisted swap log.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::CorruptSnapshot`] if the state violates a
    /// ledger invariant.
    pub fn restore(self, records: Vec<SwapRecord>) -> Result<PoolEntry, LedgerError> {
        let ledger = PoolLedger::from_snapshot(self.ledger, records)?;
        let mut entry = PoolEntry::restore(ledger, self.escrows, self.assets);
        entry.volume_a = self.volume_a;
        entry.volume_b = self.volume_b;
        entry.created_at = self.created_at;
        entry.last_modified_at = self.last_modified_at;
        Ok(entry)
    }
}

/// A stored row from the `ledger_snapshots` table.
#[derive(Debug, Clone)]
pub struct StoredSnapshot {
    /// Auto-increment row ID.
    pub id: i64,
    /// Decoded state.
    pub state: PersistedState,
    /// Snapshot timestamp.
    pub snapshot_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::domain::{Asset, AssetCustody};

    #[test]
    fn capture_and_restore_round_trip_through_json() {
        let Ok(holder) = HolderId::new("0xlp") else {
            panic!("valid holder");
        };
        let mut entry = PoolEntry::new(PoolLedger::default(), AssetPair::default());
        let _ = entry.custody.credit(&holder, Asset::A, Amount::new(500));
        let _ = entry.custody.credit(&holder, Asset::B, Amount::new(500));
        let _ = entry.custody.receive(&holder, Asset::A, Amount::new(300));
        let _ = entry.custody.receive(&holder, Asset::B, Amount::new(300));
        let _ = entry
            .ledger
            .deposit(&holder, Amount::new(300), Amount::new(300));
        assert!(entry.in_sync());

        let state = PersistedState::capture(&entry);
        let json = serde_json::to_value(&state).unwrap_or_default();
        let Ok(decoded) = serde_json::from_value::<PersistedState>(json) else {
            panic!("decode failed");
        };
        let Ok(restored) = decoded.restore(Vec::new()) else {
            panic!("restore failed");
        };
        assert_eq!(restored.ledger, entry.ledger);
        assert_eq!(restored.custody, entry.custody);
        assert!(restored.in_sync());
    }

    #[test]
    fn restore_keeps_volumes_and_timestamps() {
        let mut entry = PoolEntry::new(PoolLedger::default(), AssetPair::default());
        let Some(created) = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).single() else {
            panic!("valid timestamp");
        };
        entry.created_at = created;
        entry.volume_a = Amount::new(1_234);
        entry.volume_b = Amount::new(5_678);

        let json = serde_json::to_value(PersistedState::capture(&entry)).unwrap_or_default();
        let Ok(decoded) = serde_json::from_value::<PersistedState>(json) else {
            panic!("decode failed");
        };
        let Ok(restored) = decoded.restore(Vec::new()) else {
            panic!("restore failed");
        };
        let summary = restored.summary();
        assert_eq!(summary.created_at, created);
        assert_eq!(summary.last_modified_at, entry.last_modified_at);
        assert_eq!(summary.volume_a, Amount::new(1_234));
        assert_eq!(summary.volume_b, Amount::new(5_678));
    }
}
