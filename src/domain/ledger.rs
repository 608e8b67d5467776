//! Two-asset constant-product pool ledger.
//!
//! [`PoolLedger`] owns the reserves of assets A and B, the share supply,
//! per-holder share balances, and the append-only swap log. Every
//! operation computes its complete result into locals first and only then
//! writes state, so an error never leaves a partial update behind.
//!
//! # Invariants
//!
//! After every completed operation:
//!
//! 1. `reserve_a > 0 && reserve_b > 0` whenever `total_shares > 0`, and both
//!    reserves are zero whenever `total_shares == 0`.
//! 2. The sum of all holder balances equals `total_shares`; zero balances
//!    are never stored.
//! 3. `reserve_a × reserve_b` never decreases across a swap.
//!
//! # Pricing
//!
//! ```text
//! net_in     = amount_in − fee
//! new_out    = ceil(reserve_in × reserve_out / (reserve_in + net_in))
//! amount_out = reserve_out − new_out
//! ```
//!
//! Rounding the new output reserve up keeps the trader from ever receiving
//! a fractional unit the curve does not pay for, and `new_out >= 1` means a
//! trade can never drain the opposite reserve.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::amount::{U256, div_ceil, mul_div_floor, narrow};
use super::{Amount, Asset, FeePolicy, HolderId, LedgerError, SwapRecord};

/// Macro-state of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolState {
    /// No shares outstanding and both reserves zero.
    Empty,
    /// Shares outstanding and both reserves positive.
    Funded,
}

impl PoolState {
    /// Returns the wire name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Funded => "funded",
        }
    }
}

/// Outcome of a successful deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DepositReceipt {
    /// Shares credited to the depositor.
    pub shares_minted: Amount,
    /// Asset A credited to the reserve.
    pub amount_a: Amount,
    /// Asset B credited to the reserve.
    pub amount_b: Amount,
    /// Supplied asset B in excess of the ratio requirement. Not credited.
    pub amount_b_unused: Amount,
}

/// Outcome of a withdrawal, or a preview of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WithdrawReceipt {
    /// Shares burned.
    pub shares_burned: Amount,
    /// Asset A paid out.
    pub amount_a: Amount,
    /// Asset B paid out.
    pub amount_b: Amount,
}

/// Read-only pricing of a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapQuote {
    /// Asset sold into the pool.
    pub asset_in: Asset,
    /// Amount sold, fee included.
    pub amount_in: Amount,
    /// Asset bought from the pool.
    pub asset_out: Asset,
    /// Amount the pool would pay.
    pub amount_out: Amount,
    /// Fee retained from `amount_in`.
    pub fee: Amount,
    /// Reserve of asset A after the trade.
    pub reserve_a_after: Amount,
    /// Reserve of asset B after the trade.
    pub reserve_b_after: Amount,
}

/// Exact, lossless persisted form of the ledger's mutable state.
///
/// The swap log is persisted row by row and passed alongside the snapshot
/// to [`PoolLedger::from_snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Reserve of asset A.
    pub reserve_a: Amount,
    /// Reserve of asset B.
    pub reserve_b: Amount,
    /// Outstanding share supply.
    pub total_shares: Amount,
    /// Non-zero share balances.
    pub shares: BTreeMap<HolderId, Amount>,
    /// Swap fee in basis points.
    pub fee_bps: u32,
    /// Sequence number the next swap record will carry.
    pub next_sequence: u64,
}

/// The pool ledger. See the module documentation for invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolLedger {
    reserve_a: Amount,
    reserve_b: Amount,
    total_shares: Amount,
    shares: BTreeMap<HolderId, Amount>,
    fee: FeePolicy,
    swap_log: Vec<SwapRecord>,
    next_sequence: u64,
}

impl Default for PoolLedger {
    fn default() -> Self {
        Self::new(FeePolicy::NONE)
    }
}

impl PoolLedger {
    /// Creates an empty pool with the given fee policy.
    #[must_use]
    pub fn new(fee: FeePolicy) -> Self {
        Self {
            reserve_a: Amount::ZERO,
            reserve_b: Amount::ZERO,
            total_shares: Amount::ZERO,
            shares: BTreeMap::new(),
            fee,
            swap_log: Vec::new(),
            next_sequence: 1,
        }
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Returns `(reserve_a, reserve_b)`.
    #[must_use]
    pub const fn reserves(&self) -> (Amount, Amount) {
        (self.reserve_a, self.reserve_b)
    }

    /// Returns the reserve of one asset.
    #[must_use]
    pub const fn reserve(&self, asset: Asset) -> Amount {
        match asset {
            Asset::A => self.reserve_a,
            Asset::B => self.reserve_b,
        }
    }

    /// Returns the outstanding share supply.
    #[must_use]
    pub const fn total_shares(&self) -> Amount {
        self.total_shares
    }

    /// Returns the shares held by `holder` (zero if absent).
    #[must_use]
    pub fn shares_of(&self, holder: &HolderId) -> Amount {
        self.shares.get(holder).copied().unwrap_or(Amount::ZERO)
    }

    /// Returns all non-zero share balances.
    #[must_use]
    pub const fn holders(&self) -> &BTreeMap<HolderId, Amount> {
        &self.shares
    }

    /// Returns the constant-product invariant `reserve_a × reserve_b`.
    #[must_use]
    pub fn invariant_k(&self) -> U256 {
        // u128 × u128 always fits in 256 bits.
        self.reserve_a.widen().saturating_mul(self.reserve_b.widen())
    }

    /// Returns the pool's macro-state.
    #[must_use]
    pub const fn state(&self) -> PoolState {
        if self.total_shares.is_zero() {
            PoolState::Empty
        } else {
            PoolState::Funded
        }
    }

    /// Returns the swap fee policy.
    #[must_use]
    pub const fn fee_policy(&self) -> FeePolicy {
        self.fee
    }

    /// Returns the number of swap records in the log.
    #[must_use]
    pub fn swap_count(&self) -> usize {
        self.swap_log.len()
    }

    /// Returns up to `limit` swap records with `sequence > after`, oldest first.
    #[must_use]
    pub fn swap_records(&self, after: u64, limit: usize) -> &[SwapRecord] {
        let start = self.swap_log.partition_point(|r| r.sequence <= after);
        let tail = self.swap_log.get(start..).unwrap_or_default();
        tail.get(..limit.min(tail.len())).unwrap_or_default()
    }

    // ── Estimates ───────────────────────────────────────────────────────

    /// Amount of asset B that must accompany `amount_a` at the current ratio.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] if `amount_a` is zero.
    /// - [`LedgerError::PoolEmpty`] if the pool has no reserves (any ratio
    ///   is accepted on the first deposit).
    /// - [`LedgerError::ArithmeticOverflow`] on overflow.
    pub fn required_deposit_b(&self, amount_a: Amount) -> Result<Amount, LedgerError> {
        self.paired_amount(amount_a, Asset::A)
    }

    /// Amount of asset A that must accompany `amount_b` at the current ratio.
    ///
    /// # Errors
    ///
    /// Same as [`Self::required_deposit_b`].
    pub fn required_deposit_a(&self, amount_b: Amount) -> Result<Amount, LedgerError> {
        self.paired_amount(amount_b, Asset::B)
    }

    fn paired_amount(&self, amount: Amount, side: Asset) -> Result<Amount, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount("deposit amount must be positive"));
        }
        if self.state() == PoolState::Empty {
            return Err(LedgerError::PoolEmpty);
        }
        mul_div_floor(
            amount,
            self.reserve(side.opposite()),
            self.reserve(side),
            "paired deposit amount",
        )
    }

    /// Prices a swap without mutating state.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] if `amount_in` is zero.
    /// - [`LedgerError::PoolEmpty`] if either reserve is zero.
    /// - [`LedgerError::ArithmeticOverflow`] if the input reserve would
    ///   overflow.
    pub fn quote(&self, asset_in: Asset, amount_in: Amount) -> Result<SwapQuote, LedgerError> {
        if amount_in.is_zero() {
            return Err(LedgerError::InvalidAmount("swap amount must be positive"));
        }
        let asset_out = asset_in.opposite();
        let reserve_in = self.reserve(asset_in);
        let reserve_out = self.reserve(asset_out);
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(LedgerError::PoolEmpty);
        }

        let (net_in, fee) = self.fee.split(amount_in)?;

        let k = reserve_in
            .widen()
            .checked_mul(reserve_out.widen())
            .ok_or(LedgerError::ArithmeticOverflow("invariant product"))?;
        let denominator = reserve_in
            .widen()
            .checked_add(net_in.widen())
            .ok_or(LedgerError::ArithmeticOverflow("swap denominator"))?;
        let new_reserve_out = narrow(div_ceil(k, denominator, "swap output")?, "swap output")?;
        let amount_out = reserve_out.checked_sub(new_reserve_out)?;
        let new_reserve_in = reserve_in.checked_add(amount_in)?;

        let (reserve_a_after, reserve_b_after) = match asset_in {
            Asset::A => (new_reserve_in, new_reserve_out),
            Asset::B => (new_reserve_out, new_reserve_in),
        };

        Ok(SwapQuote {
            asset_in,
            amount_in,
            asset_out,
            amount_out,
            fee,
            reserve_a_after,
            reserve_b_after,
        })
    }

    /// Previews a withdrawal of `shares` without mutating state.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] if `shares` is zero or exceeds the
    ///   total supply.
    /// - [`LedgerError::PoolEmpty`] if no shares are outstanding.
    pub fn quote_withdraw(&self, shares: Amount) -> Result<WithdrawReceipt, LedgerError> {
        if shares.is_zero() {
            return Err(LedgerError::InvalidAmount("shares to burn must be positive"));
        }
        if self.state() == PoolState::Empty {
            return Err(LedgerError::PoolEmpty);
        }
        if shares > self.total_shares {
            return Err(LedgerError::InvalidAmount("shares exceed total supply"));
        }
        self.proportional_amounts(shares)
    }

    fn proportional_amounts(&self, shares: Amount) -> Result<WithdrawReceipt, LedgerError> {
        let amount_a = mul_div_floor(self.reserve_a, shares, self.total_shares, "withdraw a")?;
        let amount_b = mul_div_floor(self.reserve_b, shares, self.total_shares, "withdraw b")?;
        Ok(WithdrawReceipt {
            shares_burned: shares,
            amount_a,
            amount_b,
        })
    }

    // ── Mutations ───────────────────────────────────────────────────────

    /// Computes the receipt [`Self::deposit`] would produce, without
    /// mutating state.
    ///
    /// # Errors
    ///
    /// Same as [`Self::deposit`].
    pub fn preview_deposit(
        &self,
        amount_a: Amount,
        amount_b: Amount,
    ) -> Result<DepositReceipt, LedgerError> {
        if amount_a.is_zero() || amount_b.is_zero() {
            return Err(LedgerError::InvalidAmount("deposit amounts must be positive"));
        }

        let (credited_b, shares_minted) = match self.state() {
            PoolState::Empty => (amount_b, amount_a),
            PoolState::Funded => {
                let required_b = self.required_deposit_b(amount_a)?;
                if amount_b < required_b {
                    return Err(LedgerError::InvalidAmount(
                        "asset B below the amount required by the current ratio",
                    ));
                }
                let minted = mul_div_floor(
                    amount_a,
                    self.total_shares,
                    self.reserve_a,
                    "shares minted",
                )?;
                if minted.is_zero() {
                    return Err(LedgerError::InvalidAmount("deposit too small to mint a share"));
                }
                (required_b, minted)
            }
        };

        Ok(DepositReceipt {
            shares_minted,
            amount_a,
            amount_b: credited_b,
            amount_b_unused: amount_b.checked_sub(credited_b)?,
        })
    }

    /// Credits a deposit and mints shares to `holder`.
    ///
    /// The first deposit accepts any ratio and mints `amount_a` shares.
    /// Later deposits credit exactly `required_deposit_b(amount_a)` of
    /// asset B and mint `amount_a × total_shares / reserve_a` shares,
    /// rounded down.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] if either amount is zero, `amount_b`
    ///   is below the ratio requirement, or the deposit is too small to
    ///   mint a share.
    /// - [`LedgerError::ArithmeticOverflow`] on overflow.
    pub fn deposit(
        &mut self,
        holder: &HolderId,
        amount_a: Amount,
        amount_b: Amount,
    ) -> Result<DepositReceipt, LedgerError> {
        let receipt = self.preview_deposit(amount_a, amount_b)?;

        let reserve_a = self.reserve_a.checked_add(receipt.amount_a)?;
        let reserve_b = self.reserve_b.checked_add(receipt.amount_b)?;
        let total_shares = self.total_shares.checked_add(receipt.shares_minted)?;
        let holder_shares = self.shares_of(holder).checked_add(receipt.shares_minted)?;

        self.reserve_a = reserve_a;
        self.reserve_b = reserve_b;
        self.total_shares = total_shares;
        self.shares.insert(holder.clone(), holder_shares);

        Ok(receipt)
    }

    /// Burns `shares` from `holder` and pays out the proportional reserves.
    ///
    /// Burning every outstanding share pays out both reserves exactly and
    /// returns the pool to [`PoolState::Empty`].
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] if `shares` is zero.
    /// - [`LedgerError::InsufficientShares`] if the holder owns fewer.
    pub fn withdraw(
        &mut self,
        holder: &HolderId,
        shares: Amount,
    ) -> Result<WithdrawReceipt, LedgerError> {
        let receipt = self.preview_withdraw(holder, shares)?;
        let held = self.shares_of(holder);
        let reserve_a = self.reserve_a.checked_sub(receipt.amount_a)?;
        let reserve_b = self.reserve_b.checked_sub(receipt.amount_b)?;
        let total_shares = self.total_shares.checked_sub(shares)?;
        let remaining = held.checked_sub(shares)?;

        self.reserve_a = reserve_a;
        self.reserve_b = reserve_b;
        self.total_shares = total_shares;
        if remaining.is_zero() {
            self.shares.remove(holder);
        } else {
            self.shares.insert(holder.clone(), remaining);
        }

        Ok(receipt)
    }

    /// Computes the payout of `holder` burning `shares`, checking their
    /// balance, without mutating state.
    ///
    /// # Errors
    ///
    /// Same as [`Self::withdraw`].
    pub fn preview_withdraw(
        &self,
        holder: &HolderId,
        shares: Amount,
    ) -> Result<WithdrawReceipt, LedgerError> {
        if shares.is_zero() {
            return Err(LedgerError::InvalidAmount("shares to burn must be positive"));
        }
        let held = self.shares_of(holder);
        if shares > held {
            return Err(LedgerError::InsufficientShares {
                requested: shares,
                held,
            });
        }
        self.proportional_amounts(shares)
    }

    /// Prices a swap and applies the `min_amount_out` floor, without
    /// mutating state.
    ///
    /// # Errors
    ///
    /// Same as [`Self::swap_with_min_out`].
    pub fn preview_swap(
        &self,
        asset_in: Asset,
        amount_in: Amount,
        min_amount_out: Amount,
    ) -> Result<SwapQuote, LedgerError> {
        let quote = self.quote(asset_in, amount_in)?;
        if quote.amount_out < min_amount_out {
            return Err(LedgerError::SlippageExceeded {
                amount_out: quote.amount_out,
                min_amount_out,
            });
        }
        Ok(quote)
    }

    /// Executes a swap with no output floor.
    ///
    /// # Errors
    ///
    /// See [`Self::swap_with_min_out`].
    pub fn swap(
        &mut self,
        holder: &HolderId,
        asset_in: Asset,
        amount_in: Amount,
    ) -> Result<SwapRecord, LedgerError> {
        self.swap_with_min_out(holder, asset_in, amount_in, Amount::ZERO)
    }

    /// Executes a swap, appends a [`SwapRecord`], and returns it.
    ///
    /// # Errors
    ///
    /// - Everything [`Self::quote`] returns.
    /// - [`LedgerError::SlippageExceeded`] if the output is below
    ///   `min_amount_out`.
    pub fn swap_with_min_out(
        &mut self,
        holder: &HolderId,
        asset_in: Asset,
        amount_in: Amount,
        min_amount_out: Amount,
    ) -> Result<SwapRecord, LedgerError> {
        let quote = self.preview_swap(asset_in, amount_in, min_amount_out)?;
        let next_sequence = self
            .next_sequence
            .checked_add(1)
            .ok_or(LedgerError::ArithmeticOverflow("swap sequence"))?;

        let record = SwapRecord {
            sequence: self.next_sequence,
            holder: holder.clone(),
            asset_in,
            amount_in,
            asset_out: quote.asset_out,
            amount_out: quote.amount_out,
            fee: quote.fee,
            reserve_a: quote.reserve_a_after,
            reserve_b: quote.reserve_b_after,
            executed_at: Utc::now(),
        };

        self.reserve_a = quote.reserve_a_after;
        self.reserve_b = quote.reserve_b_after;
        self.next_sequence = next_sequence;
        self.swap_log.push(record.clone());

        Ok(record)
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Captures the mutable state (swap log excluded).
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            reserve_a: self.reserve_a,
            reserve_b: self.reserve_b,
            total_shares: self.total_shares,
            shares: self.shares.clone(),
            fee_bps: self.fee.bps(),
            next_sequence: self.next_sequence,
        }
    }

    /// Rebuilds a ledger from a snapshot and its swap log.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::CorruptSnapshot`] if the snapshot violates a
    /// ledger invariant or the log is not exactly sequences
    /// `1..next_sequence`.
    pub fn from_snapshot(
        snapshot: LedgerSnapshot,
        mut records: Vec<SwapRecord>,
    ) -> Result<Self, LedgerError> {
        let fee = FeePolicy::new(snapshot.fee_bps)
            .map_err(|e| LedgerError::CorruptSnapshot(e.to_string()))?;
        records.sort_by_key(|r| r.sequence);
        if let Some((record, expected)) = records
            .iter()
            .zip(1u64..)
            .find(|(record, expected)| record.sequence != *expected)
        {
            return Err(LedgerError::CorruptSnapshot(format!(
                "swap log expected sequence {expected}, found {}",
                record.sequence
            )));
        }
        let logged = u64::try_from(records.len()).unwrap_or(u64::MAX);
        if logged.checked_add(1) != Some(snapshot.next_sequence) {
            return Err(LedgerError::CorruptSnapshot(format!(
                "swap log holds {logged} records, next sequence is {}",
                snapshot.next_sequence
            )));
        }

        let ledger = Self {
            reserve_a: snapshot.reserve_a,
            reserve_b: snapshot.reserve_b,
            total_shares: snapshot.total_shares,
            shares: snapshot.shares,
            fee,
            swap_log: records,
            next_sequence: snapshot.next_sequence,
        };
        ledger.verify_invariants()?;
        Ok(ledger)
    }

    /// Checks the state invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::CorruptSnapshot`] describing the first
    /// violated invariant.
    pub fn verify_invariants(&self) -> Result<(), LedgerError> {
        let funded = !self.total_shares.is_zero();
        let reserves_positive = !self.reserve_a.is_zero() && !self.reserve_b.is_zero();
        let reserves_zero = self.reserve_a.is_zero() && self.reserve_b.is_zero();
        if funded && !reserves_positive {
            return Err(LedgerError::CorruptSnapshot(
                "shares outstanding against a zero reserve".to_string(),
            ));
        }
        if !funded && !reserves_zero {
            return Err(LedgerError::CorruptSnapshot(
                "reserves held with no shares outstanding".to_string(),
            ));
        }
        if self.shares.values().any(|s| s.is_zero()) {
            return Err(LedgerError::CorruptSnapshot(
                "zero share balance stored".to_string(),
            ));
        }
        let mut sum = Amount::ZERO;
        for balance in self.shares.values() {
            sum = sum
                .checked_add(*balance)
                .map_err(|e| LedgerError::CorruptSnapshot(e.to_string()))?;
        }
        if sum != self.total_shares {
            return Err(LedgerError::CorruptSnapshot(format!(
                "share balances sum to {sum}, total supply is {}",
                self.total_shares
            )));
        }
        Ok(())
    }
}
