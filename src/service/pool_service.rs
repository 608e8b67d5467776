//! Pool service: orchestrates ledger operations, custody, and events.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{
    Amount, Asset, AssetCustody, DepositReceipt, EscrowBalance, EventBus, HolderId, LedgerError,
    PoolEntry, PoolEvent, PoolSummary, PriceChangeReason, SwapQuote, SwapRecord, WithdrawReceipt,
};
use crate::error::GatewayError;
use crate::persistence::{PersistedState, PersistenceHandle};

/// Direction of a custody transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
    /// Holder escrow into the pool vault.
    Receive,
    /// Pool vault into the holder escrow.
    Release,
}

impl Transfer {
    const fn reverse(self) -> Self {
        match self {
            Self::Receive => Self::Release,
            Self::Release => Self::Receive,
        }
    }

    fn apply<C: AssetCustody>(
        self,
        custody: &mut C,
        holder: &HolderId,
        asset: Asset,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        match self {
            Self::Receive => custody.receive(holder, asset, amount),
            Self::Release => custody.release(holder, asset, amount),
        }
    }
}

/// Orchestration layer for all pool operations.
///
/// Owns the single [`PoolEntry`] behind a tokio `RwLock`: the write lock is
/// the one serialization point for mutations, reads take the read lock and
/// observe only committed states. Every mutation follows the pattern:
/// acquire lock → move funds into custody → ledger operation (refund on
/// error) → release payout → update metadata → persist → emit events.
#[derive(Debug, Clone)]
pub struct PoolService {
    entry: Arc<RwLock<PoolEntry>>,
    event_bus: EventBus,
    persistence: Option<PersistenceHandle>,
}

impl PoolService {
    /// Creates a new `PoolService` around an entry.
    #[must_use]
    pub fn new(entry: PoolEntry, event_bus: EventBus) -> Self {
        Self {
            entry: Arc::new(RwLock::new(entry)),
            event_bus,
            persistence: None,
        }
    }

    /// Attaches a persistence writer; every committed mutation is queued
    /// on it.
    #[must_use]
    pub fn with_persistence(mut self, handle: PersistenceHandle) -> Self {
        self.persistence = Some(handle);
        self
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Returns a summary of the pool.
    pub async fn summary(&self) -> PoolSummary {
        self.entry.read().await.summary()
    }

    /// Returns the holder's share balance and the total supply.
    pub async fn shares_of(&self, holder: &HolderId) -> (Amount, Amount) {
        let entry = self.entry.read().await;
        (entry.ledger.shares_of(holder), entry.ledger.total_shares())
    }

    /// Returns up to `limit` swap records with `sequence > after`.
    pub async fn swap_records(&self, after: u64, limit: usize) -> Vec<SwapRecord> {
        self.entry
            .read()
            .await
            .ledger
            .swap_records(after, limit)
            .to_vec()
    }

    /// Returns the holder's escrow balances.
    pub async fn escrow_of(&self, holder: &HolderId) -> EscrowBalance {
        self.entry.read().await.custody.escrow_of(holder)
    }

    /// Prices a swap against the current reserves.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the amount is zero, the pool is empty,
    /// or the computation overflows.
    pub async fn quote(&self, asset_in: Asset, amount_in: Amount) -> Result<SwapQuote, GatewayError> {
        Ok(self.entry.read().await.ledger.quote(asset_in, amount_in)?)
    }

    /// Previews a withdrawal of `shares`.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the amount is zero, exceeds the supply,
    /// or the pool is empty.
    pub async fn quote_withdraw(&self, shares: Amount) -> Result<WithdrawReceipt, GatewayError> {
        Ok(self.entry.read().await.ledger.quote_withdraw(shares)?)
    }

    /// Amount of the opposite asset required alongside `amount` of `asset`.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the amount is zero or the pool is empty.
    pub async fn required_deposit(
        &self,
        asset: Asset,
        amount: Amount,
    ) -> Result<Amount, GatewayError> {
        let entry = self.entry.read().await;
        let paired = match asset {
            Asset::A => entry.ledger.required_deposit_b(amount)?,
            Asset::B => entry.ledger.required_deposit_a(amount)?,
        };
        Ok(paired)
    }

    // ── Mutations ───────────────────────────────────────────────────────

    /// Deposits liquidity from the holder's escrow and mints shares.
    ///
    /// Asset B beyond the ratio requirement is returned to escrow.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if escrow does not cover the amounts or
    /// the ledger rejects the deposit. Nothing changes on error.
    pub async fn deposit(
        &self,
        holder: &HolderId,
        amount_a: Amount,
        amount_b: Amount,
    ) -> Result<DepositReceipt, GatewayError> {
        let mut entry = self.entry.write().await;
        let price_before = entry.spot_price();

        let legs = [(Asset::A, amount_a), (Asset::B, amount_b)];
        transfer_all(&mut entry.custody, holder, Transfer::Receive, &legs)?;
        let receipt = match commit_deposit(&mut entry, holder, amount_a, amount_b) {
            Ok(receipt) => receipt,
            Err(err) => {
                compensate(&mut entry.custody, holder, Transfer::Receive, &legs);
                return Err(err.into());
            }
        };
        settle(
            &mut entry.custody,
            holder,
            Transfer::Release,
            &[(Asset::B, receipt.amount_b_unused)],
        )?;

        entry.last_modified_at = Utc::now();
        let price_after = entry.spot_price();
        self.persist(&entry, None);
        let (reserve_a, reserve_b) = entry.ledger.reserves();
        let total_shares = entry.ledger.total_shares();
        let escrow = entry.custody.escrow_of(holder);
        check_sync(&entry);
        drop(entry);

        tracing::info!(
            %holder,
            amount_a = %receipt.amount_a,
            amount_b = %receipt.amount_b,
            shares_minted = %receipt.shares_minted,
            "liquidity added"
        );

        let added = PoolEvent::LiquidityAdded {
            holder: holder.clone(),
            amount_a: receipt.amount_a,
            amount_b: receipt.amount_b,
            shares_minted: receipt.shares_minted,
            total_shares,
            reserve_a,
            reserve_b,
            timestamp: Utc::now(),
        };
        self.publish(
            added,
            holder,
            escrow,
            price_event(price_before, price_after, PriceChangeReason::LiquidityAdded),
        );

        Ok(receipt)
    }

    /// Burns the holder's shares and releases the proportional reserves
    /// into their escrow.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the holder owns fewer shares or the
    /// amount is zero. Nothing changes on error.
    pub async fn withdraw(
        &self,
        holder: &HolderId,
        shares: Amount,
    ) -> Result<WithdrawReceipt, GatewayError> {
        let mut entry = self.entry.write().await;
        let price_before = entry.spot_price();

        let receipt = commit_withdraw(&mut entry, holder, shares)?;
        settle(
            &mut entry.custody,
            holder,
            Transfer::Release,
            &[(Asset::A, receipt.amount_a), (Asset::B, receipt.amount_b)],
        )?;

        entry.last_modified_at = Utc::now();
        let price_after = entry.spot_price();
        self.persist(&entry, None);
        let (reserve_a, reserve_b) = entry.ledger.reserves();
        let total_shares = entry.ledger.total_shares();
        let escrow = entry.custody.escrow_of(holder);
        check_sync(&entry);
        drop(entry);

        tracing::info!(
            %holder,
            shares_burned = %receipt.shares_burned,
            amount_a = %receipt.amount_a,
            amount_b = %receipt.amount_b,
            "liquidity removed"
        );

        let removed = PoolEvent::LiquidityRemoved {
            holder: holder.clone(),
            shares_burned: receipt.shares_burned,
            amount_a: receipt.amount_a,
            amount_b: receipt.amount_b,
            total_shares,
            reserve_a,
            reserve_b,
            timestamp: Utc::now(),
        };
        self.publish(
            removed,
            holder,
            escrow,
            price_event(price_before, price_after, PriceChangeReason::LiquidityRemoved),
        );

        Ok(receipt)
    }

    /// Sells `amount_in` of `asset_in` from the holder's escrow and pays
    /// the output into their escrow.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if escrow does not cover the input, the
    /// pool is empty, or the output is below `min_amount_out`. Nothing
    /// changes on error.
    pub async fn swap(
        &self,
        holder: &HolderId,
        asset_in: Asset,
        amount_in: Amount,
        min_amount_out: Amount,
    ) -> Result<SwapRecord, GatewayError> {
        let mut entry = self.entry.write().await;
        let price_before = entry.spot_price();

        let legs = [(asset_in, amount_in)];
        transfer_all(&mut entry.custody, holder, Transfer::Receive, &legs)?;
        let record = match commit_swap(&mut entry, holder, asset_in, amount_in, min_amount_out) {
            Ok(record) => record,
            Err(err) => {
                compensate(&mut entry.custody, holder, Transfer::Receive, &legs);
                return Err(err.into());
            }
        };
        settle(
            &mut entry.custody,
            holder,
            Transfer::Release,
            &[(record.asset_out, record.amount_out)],
        )?;

        let volume = match asset_in {
            Asset::A => &mut entry.volume_a,
            Asset::B => &mut entry.volume_b,
        };
        *volume = volume.saturating_add(amount_in);
        entry.last_modified_at = Utc::now();
        let price_after = entry.spot_price();
        self.persist(&entry, Some(&record));
        let escrow = entry.custody.escrow_of(holder);
        check_sync(&entry);
        drop(entry);

        tracing::info!(
            %holder,
            sequence = record.sequence,
            asset_in = %record.asset_in,
            amount_in = %record.amount_in,
            amount_out = %record.amount_out,
            fee = %record.fee,
            "swap executed"
        );

        self.publish(
            PoolEvent::swap_executed(&record),
            holder,
            escrow,
            price_event(price_before, price_after, PriceChangeReason::SwapExecuted),
        );

        Ok(record)
    }

    /// Records an inbound transfer confirmed by the token collaborator.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the amount is zero or the balance
    /// would overflow.
    pub async fn credit_escrow(
        &self,
        holder: &HolderId,
        asset: Asset,
        amount: Amount,
    ) -> Result<EscrowBalance, GatewayError> {
        let mut entry = self.entry.write().await;
        let balance = entry.custody.credit(holder, asset, amount)?;
        entry.last_modified_at = Utc::now();
        self.persist(&entry, None);
        drop(entry);

        tracing::info!(%holder, %asset, %amount, "escrow credited");
        self.event_bus.publish(escrow_event(holder, balance));
        Ok(balance)
    }

    /// Records an outbound transfer claimed by the holder.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the amount is zero or exceeds the
    /// escrowed balance.
    pub async fn debit_escrow(
        &self,
        holder: &HolderId,
        asset: Asset,
        amount: Amount,
    ) -> Result<EscrowBalance, GatewayError> {
        let mut entry = self.entry.write().await;
        let balance = entry.custody.debit(holder, asset, amount)?;
        entry.last_modified_at = Utc::now();
        self.persist(&entry, None);
        drop(entry);

        tracing::info!(%holder, %asset, %amount, "escrow debited");
        self.event_bus.publish(escrow_event(holder, balance));
        Ok(balance)
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    /// Queues the committed state. Called with the write lock held so the
    /// writer sees commits in ledger order.
    fn persist(&self, entry: &PoolEntry, record: Option<&SwapRecord>) {
        if let Some(handle) = &self.persistence {
            handle.submit(PersistedState::capture(entry), record.cloned());
        }
    }

    /// Publishes a committed operation's events: the operation itself, the
    /// holder's new escrow, then the price move if any.
    fn publish(
        &self,
        event: PoolEvent,
        holder: &HolderId,
        escrow: EscrowBalance,
        price: Option<PoolEvent>,
    ) {
        self.event_bus
            .publish_all([event, escrow_event(holder, escrow)].into_iter().chain(price));
    }
}

fn escrow_event(holder: &HolderId, balance: EscrowBalance) -> PoolEvent {
    PoolEvent::EscrowUpdated {
        holder: holder.clone(),
        asset_a: balance.asset_a,
        asset_b: balance.asset_b,
        timestamp: Utc::now(),
    }
}

/// `None` when the price did not move.
fn price_event(before: f64, after: f64, reason: PriceChangeReason) -> Option<PoolEvent> {
    (before.to_bits() != after.to_bits()).then(|| PoolEvent::PriceUpdated {
        old_price: format!("{before}"),
        new_price: format!("{after}"),
        price_change_bps: compute_price_change_bps(before, after),
        reason,
        timestamp: Utc::now(),
    })
}

/// Commits a deposit once custody can return the unused asset B.
fn commit_deposit(
    entry: &mut PoolEntry,
    holder: &HolderId,
    amount_a: Amount,
    amount_b: Amount,
) -> Result<DepositReceipt, LedgerError> {
    let preview = entry.ledger.preview_deposit(amount_a, amount_b)?;
    ensure_releasable(
        &entry.custody,
        holder,
        &[(Asset::B, preview.amount_b_unused)],
    )?;
    entry.ledger.deposit(holder, amount_a, amount_b)
}

/// Commits a withdrawal once custody can pay both amounts out.
fn commit_withdraw(
    entry: &mut PoolEntry,
    holder: &HolderId,
    shares: Amount,
) -> Result<WithdrawReceipt, LedgerError> {
    let preview = entry.ledger.preview_withdraw(holder, shares)?;
    ensure_releasable(
        &entry.custody,
        holder,
        &[(Asset::A, preview.amount_a), (Asset::B, preview.amount_b)],
    )?;
    entry.ledger.withdraw(holder, shares)
}

/// Commits a swap once custody can pay the output out.
fn commit_swap(
    entry: &mut PoolEntry,
    holder: &HolderId,
    asset_in: Asset,
    amount_in: Amount,
    min_amount_out: Amount,
) -> Result<SwapRecord, LedgerError> {
    let quote = entry
        .ledger
        .preview_swap(asset_in, amount_in, min_amount_out)?;
    ensure_releasable(
        &entry.custody,
        holder,
        &[(quote.asset_out, quote.amount_out)],
    )?;
    entry
        .ledger
        .swap_with_min_out(holder, asset_in, amount_in, min_amount_out)
}

/// Payout legs are checked per asset; the two slots are independent.
fn ensure_releasable<C: AssetCustody>(
    custody: &C,
    holder: &HolderId,
    legs: &[(Asset, Amount)],
) -> Result<(), LedgerError> {
    legs.iter()
        .try_for_each(|&(asset, amount)| custody.can_release(holder, asset, amount))
}

/// Applies every leg or none of them.
fn transfer_all<C: AssetCustody>(
    custody: &mut C,
    holder: &HolderId,
    direction: Transfer,
    legs: &[(Asset, Amount)],
) -> Result<(), LedgerError> {
    for (done, &(asset, amount)) in legs.iter().enumerate() {
        if let Err(err) = direction.apply(custody, holder, asset, amount) {
            compensate(custody, holder, direction, legs.get(..done).unwrap_or_default());
            return Err(err);
        }
    }
    Ok(())
}

/// Reverses legs already applied in `direction`.
fn compensate<C: AssetCustody>(
    custody: &mut C,
    holder: &HolderId,
    direction: Transfer,
    legs: &[(Asset, Amount)],
) {
    for &(asset, amount) in legs.iter().rev() {
        if let Err(err) = direction.reverse().apply(custody, holder, asset, amount) {
            tracing::error!(%holder, %asset, %amount, error = %err, "custody compensation failed");
        }
    }
}

/// Pays out after a committed ledger operation. Payouts are checked with
/// [`ensure_releasable`] before the commit, so failure here means vault and
/// reserves have diverged.
fn settle<C: AssetCustody>(
    custody: &mut C,
    holder: &HolderId,
    direction: Transfer,
    legs: &[(Asset, Amount)],
) -> Result<(), GatewayError> {
    transfer_all(custody, holder, direction, legs).map_err(|err| {
        tracing::error!(%holder, error = %err, "payout failed after ledger commit");
        GatewayError::Internal(format!("custody payout failed: {err}"))
    })
}

fn check_sync(entry: &PoolEntry) {
    if !entry.in_sync() {
        let (reserve_a, reserve_b) = entry.ledger.reserves();
        tracing::error!(%reserve_a, %reserve_b, "vault balances diverged from ledger reserves");
    }
}

/// Computes the price change in basis points between two price values.
fn compute_price_change_bps(old: f64, new: f64) -> i32 {
    if old == 0.0 {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation)]
    let bps = ((new - old) / old * 10_000.0) as i32;
    bps
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{AssetPair, FeePolicy, PoolLedger, PoolState};

    const E18: u128 = 1_000_000_000_000_000_000;

    fn holder(raw: &str) -> HolderId {
        let Ok(id) = HolderId::new(raw) else {
            panic!("valid holder");
        };
        id
    }

    fn make_service() -> PoolService {
        let entry = PoolEntry::new(PoolLedger::new(FeePolicy::NONE), AssetPair::default());
        PoolService::new(entry, EventBus::new(256))
    }

    async fn fund(service: &PoolService, h: &HolderId, a: u128, b: u128) {
        if a > 0 {
            let _ = service.credit_escrow(h, Asset::A, Amount::new(a)).await;
        }
        if b > 0 {
            let _ = service.credit_escrow(h, Asset::B, Amount::new(b)).await;
        }
    }

    async fn seeded_service(lp: &HolderId) -> PoolService {
        let service = make_service();
        fund(&service, lp, 100_000 * E18, 100_000 * E18).await;
        let result = service
            .deposit(lp, Amount::new(100_000 * E18), Amount::new(100_000 * E18))
            .await;
        assert!(result.is_ok());
        service
    }

    #[tokio::test]
    async fn deposit_moves_escrow_into_reserves() {
        let lp = holder("0xlp");
        let service = seeded_service(&lp).await;

        let summary = service.summary().await;
        assert_eq!(summary.state, PoolState::Funded);
        assert_eq!(summary.reserve_a, Amount::new(100_000 * E18));
        assert_eq!(service.escrow_of(&lp).await, EscrowBalance::default());
        let (held, total) = service.shares_of(&lp).await;
        assert_eq!(held, total);
        assert_eq!(held, Amount::new(100_000 * E18));
    }

    #[tokio::test]
    async fn deposit_returns_unused_b_to_escrow() {
        let lp = holder("0xlp");
        let service = seeded_service(&lp).await;
        let other = holder("0xother");
        fund(&service, &other, 10 * E18, 15 * E18).await;

        let Ok(receipt) = service
            .deposit(&other, Amount::new(10 * E18), Amount::new(15 * E18))
            .await
        else {
            panic!("deposit failed");
        };
        assert_eq!(receipt.amount_b, Amount::new(10 * E18));
        assert_eq!(receipt.amount_b_unused, Amount::new(5 * E18));
        assert_eq!(service.escrow_of(&other).await.asset_b, Amount::new(5 * E18));
    }

    #[tokio::test]
    async fn failed_deposit_refunds_escrow() {
        let lp = holder("0xlp");
        let service = seeded_service(&lp).await;
        let other = holder("0xother");
        fund(&service, &other, 10 * E18, 5 * E18).await;
        let before = service.summary().await;

        let result = service
            .deposit(&other, Amount::new(10 * E18), Amount::new(5 * E18))
            .await;
        assert!(matches!(
            result,
            Err(GatewayError::Ledger(LedgerError::InvalidAmount(_)))
        ));

        let escrow = service.escrow_of(&other).await;
        assert_eq!(escrow.asset_a, Amount::new(10 * E18));
        assert_eq!(escrow.asset_b, Amount::new(5 * E18));
        let after = service.summary().await;
        assert_eq!(after.reserve_a, before.reserve_a);
        assert_eq!(after.reserve_b, before.reserve_b);
    }

    #[tokio::test]
    async fn deposit_without_escrow_is_rejected() {
        let service = make_service();
        let h = holder("0xbroke");
        fund(&service, &h, 5, 0).await;
        let result = service.deposit(&h, Amount::new(5), Amount::new(5)).await;
        assert!(matches!(
            result,
            Err(GatewayError::Ledger(LedgerError::InsufficientEscrow { .. }))
        ));
        assert_eq!(service.escrow_of(&h).await.asset_a, Amount::new(5));
    }

    #[tokio::test]
    async fn swap_settles_through_escrow() {
        let lp = holder("0xlp");
        let service = seeded_service(&lp).await;
        let trader = holder("0xtrader");
        fund(&service, &trader, E18, 0).await;

        let Ok(record) = service
            .swap(&trader, Asset::A, Amount::new(E18), Amount::ZERO)
            .await
        else {
            panic!("swap failed");
        };
        assert_eq!(record.sequence, 1);
        let escrow = service.escrow_of(&trader).await;
        assert_eq!(escrow.asset_a, Amount::ZERO);
        assert_eq!(escrow.asset_b, record.amount_out);

        let summary = service.summary().await;
        assert_eq!(summary.swap_count, 1);
        assert_eq!(summary.volume_a, Amount::new(E18));
        assert_eq!(service.swap_records(0, 10).await.len(), 1);
    }

    #[tokio::test]
    async fn slippage_failure_refunds_input() {
        let lp = holder("0xlp");
        let service = seeded_service(&lp).await;
        let trader = holder("0xtrader");
        fund(&service, &trader, E18, 0).await;

        let result = service
            .swap(&trader, Asset::A, Amount::new(E18), Amount::new(E18))
            .await;
        assert!(matches!(
            result,
            Err(GatewayError::Ledger(LedgerError::SlippageExceeded { .. }))
        ));
        assert_eq!(service.escrow_of(&trader).await.asset_a, Amount::new(E18));
        assert_eq!(service.summary().await.swap_count, 0);
    }

    #[tokio::test]
    async fn swap_into_full_escrow_leaves_pool_untouched() {
        let lp = holder("0xlp");
        let service = make_service();
        fund(&service, &lp, 1_000, 1_000).await;
        let _ = service
            .deposit(&lp, Amount::new(1_000), Amount::new(1_000))
            .await;
        let trader = holder("0xtrader");
        fund(&service, &trader, 100, u128::MAX).await;
        let before = service.summary().await;
        let mut rx = service.event_bus().subscribe();

        let result = service
            .swap(&trader, Asset::A, Amount::new(100), Amount::ZERO)
            .await;
        assert!(matches!(
            result,
            Err(GatewayError::Ledger(LedgerError::ArithmeticOverflow(_)))
        ));

        let after = service.summary().await;
        assert_eq!(after.reserve_a, before.reserve_a);
        assert_eq!(after.reserve_b, before.reserve_b);
        assert_eq!(after.swap_count, 0);
        assert!(service.swap_records(0, 10).await.is_empty());
        let escrow = service.escrow_of(&trader).await;
        assert_eq!(escrow.asset_a, Amount::new(100));
        assert_eq!(escrow.asset_b, Amount::new(u128::MAX));
        assert!(service.entry.read().await.in_sync());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn withdraw_into_full_escrow_keeps_shares() {
        let lp = holder("0xlp");
        let service = make_service();
        fund(&service, &lp, 1_000, 1_000).await;
        let _ = service
            .deposit(&lp, Amount::new(1_000), Amount::new(1_000))
            .await;
        fund(&service, &lp, 0, u128::MAX).await;

        let result = service.withdraw(&lp, Amount::new(500)).await;
        assert!(matches!(
            result,
            Err(GatewayError::Ledger(LedgerError::ArithmeticOverflow(_)))
        ));
        let (held, total) = service.shares_of(&lp).await;
        assert_eq!(held, Amount::new(1_000));
        assert_eq!(total, Amount::new(1_000));
        let entry = service.entry.read().await;
        assert!(entry.in_sync());
        assert_eq!(entry.custody.escrow_of(&lp).asset_a, Amount::ZERO);
    }

    #[tokio::test]
    async fn withdraw_everything_empties_pool() {
        let lp = holder("0xlp");
        let service = seeded_service(&lp).await;

        let Ok(receipt) = service
            .withdraw(&lp, Amount::new(100_000 * E18))
            .await
        else {
            panic!("withdraw failed");
        };
        assert_eq!(receipt.amount_a, Amount::new(100_000 * E18));
        let summary = service.summary().await;
        assert_eq!(summary.state, PoolState::Empty);
        assert_eq!(summary.reserve_b, Amount::ZERO);
        assert_eq!(service.escrow_of(&lp).await.asset_b, Amount::new(100_000 * E18));
    }

    #[tokio::test]
    async fn withdraw_more_than_held_is_rejected() {
        let lp = holder("0xlp");
        let service = seeded_service(&lp).await;
        let result = service.withdraw(&holder("0xnobody"), Amount::new(1)).await;
        assert!(matches!(
            result,
            Err(GatewayError::Ledger(LedgerError::InsufficientShares { .. }))
        ));
    }

    #[tokio::test]
    async fn swap_emits_events() {
        let lp = holder("0xlp");
        let service = seeded_service(&lp).await;
        let trader = holder("0xtrader");
        fund(&service, &trader, 0, E18).await;
        let mut rx = service.event_bus().subscribe();

        let _ = service
            .swap(&trader, Asset::B, Amount::new(E18), Amount::ZERO)
            .await;

        let Ok(first) = rx.try_recv() else {
            panic!("expected swap event");
        };
        assert_eq!(first.event_type_str(), "swap_executed");
        let Ok(second) = rx.try_recv() else {
            panic!("expected escrow event");
        };
        assert_eq!(second.event_type_str(), "escrow_updated");
        let Ok(third) = rx.try_recv() else {
            panic!("expected price event");
        };
        assert_eq!(third.event_type_str(), "price_updated");
    }

    #[tokio::test]
    async fn quote_does_not_mutate() {
        let lp = holder("0xlp");
        let service = seeded_service(&lp).await;
        let before = service.summary().await;
        let Ok(quote) = service.quote(Asset::A, Amount::new(E18)).await else {
            panic!("quote failed");
        };
        assert!(quote.amount_out < Amount::new(E18));
        let after = service.summary().await;
        assert_eq!(before.reserve_a, after.reserve_a);
        assert_eq!(after.swap_count, 0);
    }

    #[tokio::test]
    async fn required_deposit_follows_ratio() {
        let lp = holder("0xlp");
        let service = make_service();
        fund(&service, &lp, 100, 400).await;
        let _ = service.deposit(&lp, Amount::new(100), Amount::new(400)).await;
        let Ok(b) = service.required_deposit(Asset::A, Amount::new(10)).await else {
            panic!("estimate failed");
        };
        assert_eq!(b, Amount::new(40));
        let Ok(a) = service.required_deposit(Asset::B, Amount::new(40)).await else {
            panic!("estimate failed");
        };
        assert_eq!(a, Amount::new(10));
    }

    #[tokio::test]
    async fn commits_are_queued_for_persistence() {
        let (handle, mut rx) = PersistenceHandle::channel();
        let service = make_service().with_persistence(handle);
        let lp = holder("0xlp");
        fund(&service, &lp, 10, 10).await;
        let _ = service.deposit(&lp, Amount::new(10), Amount::new(10)).await;

        let mut commits = Vec::new();
        while let Ok(commit) = rx.try_recv() {
            commits.push(commit);
        }
        assert_eq!(commits.len(), 3);
        let Some(last) = commits.last() else {
            panic!("expected commit");
        };
        assert_eq!(last.state.ledger.total_shares, Amount::new(10));
    }

    #[test]
    fn test_compute_price_change_bps() {
        assert_eq!(compute_price_change_bps(0.0, 1.0), 0);
        assert_eq!(compute_price_change_bps(1.0, 1.0), 0);
        assert_eq!(compute_price_change_bps(1.0, 1.01), 100);
        assert_eq!(compute_price_change_bps(1.0, 0.99), -100);
    }
}
