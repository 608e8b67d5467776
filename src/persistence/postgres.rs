//! PostgreSQL implementation of the persistence layer.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::models::{PersistedState, StoredSnapshot};
use crate::domain::{Amount, Asset, HolderId, SwapRecord};
use crate::error::GatewayError;

type SwapRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    DateTime<Utc>,
);

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending migrations from `migrations/`.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), GatewayError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))
    }

    /// Writes one commit: every swap record not yet stored and the new
    /// snapshot, then prunes older snapshots. All in a single transaction.
    ///
    /// Records already present are skipped, so a batch carried over from a
    /// failed commit can be written again.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn save_commit(
        &self,
        state: &PersistedState,
        records: &[SwapRecord],
    ) -> Result<i64, GatewayError> {
        let state_json = serde_json::to_value(state)
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        for record in records {
            let sequence = i64::try_from(record.sequence)
                .map_err(|_| GatewayError::PersistenceError("sequence out of range".into()))?;
            sqlx::query(
                "INSERT INTO swap_records (sequence, holder, asset_in, amount_in, asset_out, \
                 amount_out, fee, reserve_a, reserve_b, executed_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
                 ON CONFLICT (sequence) DO NOTHING",
            )
            .bind(sequence)
            .bind(record.holder.as_str())
            .bind(record.asset_in.to_string())
            .bind(record.amount_in.to_string())
            .bind(record.asset_out.to_string())
            .bind(record.amount_out.to_string())
            .bind(record.fee.to_string())
            .bind(record.reserve_a.to_string())
            .bind(record.reserve_b.to_string())
            .bind(record.executed_at)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO ledger_snapshots (state_json) VALUES ($1) RETURNING id",
        )
        .bind(&state_json)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        sqlx::query("DELETE FROM ledger_snapshots WHERE id < $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(id)
    }

    /// Loads the most recent snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure or
    /// an undecodable row.
    pub async fn load_latest_snapshot(&self) -> Result<Option<StoredSnapshot>, GatewayError> {
        let row = sqlx::query_as::<_, (i64, serde_json::Value, DateTime<Utc>)>(
            "SELECT id, state_json, snapshot_at FROM ledger_snapshots ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(|(id, state_json, snapshot_at)| {
            let state = serde_json::from_value(state_json)
                .map_err(|e| GatewayError::PersistenceError(format!("snapshot {id}: {e}")))?;
            Ok(StoredSnapshot {
                id,
                state,
                snapshot_at,
            })
        })
        .transpose()
    }

    /// Loads the full swap log in sequence order.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure or
    /// an undecodable row.
    pub async fn load_swap_records(&self) -> Result<Vec<SwapRecord>, GatewayError> {
        let rows = sqlx::query_as::<_, SwapRow>(
            "SELECT sequence, holder, asset_in, amount_in, asset_out, amount_out, fee, \
             reserve_a, reserve_b, executed_at FROM swap_records ORDER BY sequence ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(decode_swap_row).collect()
    }
}

fn db_err(e: sqlx::Error) -> GatewayError {
    GatewayError::PersistenceError(e.to_string())
}

fn decode_swap_row(row: SwapRow) -> Result<SwapRecord, GatewayError> {
    let (
        sequence,
        holder,
        asset_in,
        amount_in,
        asset_out,
        amount_out,
        fee,
        reserve_a,
        reserve_b,
        executed_at,
    ) = row;
    let corrupt = |what: &str| GatewayError::PersistenceError(format!("swap {sequence}: {what}"));

    Ok(SwapRecord {
        sequence: u64::try_from(sequence).map_err(|_| corrupt("negative sequence"))?,
        holder: HolderId::new(holder).map_err(|e| corrupt(&e))?,
        asset_in: parse_asset(&asset_in).ok_or_else(|| corrupt("asset_in"))?,
        amount_in: parse_amount(&amount_in).ok_or_else(|| corrupt("amount_in"))?,
        asset_out: parse_asset(&asset_out).ok_or_else(|| corrupt("asset_out"))?,
        amount_out: parse_amount(&amount_out).ok_or_else(|| corrupt("amount_out"))?,
        fee: parse_amount(&fee).ok_or_else(|| corrupt("fee"))?,
        reserve_a: parse_amount(&reserve_a).ok_or_else(|| corrupt("reserve_a"))?,
        reserve_b: parse_amount(&reserve_b).ok_or_else(|| corrupt("reserve_b"))?,
        executed_at,
    })
}

fn parse_asset(raw: &str) -> Option<Asset> {
    match raw {
        "A" => Some(Asset::A),
        "B" => Some(Asset::B),
        _ => None,
    }
}

fn parse_amount(raw: &str) -> Option<Amount> {
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_text_columns() {
        let row: SwapRow = (
            3,
            "0xabc".to_string(),
            "A".to_string(),
            "1000000000000000000".to_string(),
            "B".to_string(),
            "999990000099999000".to_string(),
            "0".to_string(),
            "100001000000000000000000".to_string(),
            "99999000009999900001000".to_string(),
            Utc::now(),
        );
        let record = decode_swap_row(row);
        assert!(record.is_ok());
        let record = record.ok();
        assert_eq!(record.as_ref().map(|r| r.sequence), Some(3));
        assert_eq!(record.map(|r| r.asset_out), Some(Asset::B));
    }

    #[test]
    fn rejects_unknown_asset() {
        let row: SwapRow = (
            1,
            "0xabc".to_string(),
            "C".to_string(),
            "1".to_string(),
            "B".to_string(),
            "0".to_string(),
            "0".to_string(),
            "1".to_string(),
            "1".to_string(),
            Utc::now(),
        );
        assert!(decode_swap_row(row).is_err());
    }
}
