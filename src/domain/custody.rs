//! Asset custody: the two-phase transfer contract around the ledger.
//!
//! The ledger never moves funds. A caller first transfers assets into
//! custody, then invokes a ledger operation, then custody releases the
//! ledger's payout. [`AssetCustody`] is the seam for that collaborator and
//! [`EscrowVault`] is the in-process implementation used by the service.
//!
//! ```text
//! holder escrow ──receive──▶ pool vault ──release──▶ holder escrow
//!      ▲                                                   │
//!   credit (inbound transfer confirmed)      debit (outbound claim)
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Amount, Asset, HolderId, LedgerError};

/// Custody collaborator consumed by the service layer.
pub trait AssetCustody {
    /// Moves `amount` of `asset` from the holder's escrow into the pool vault.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientEscrow`] if the holder's escrow
    /// does not cover `amount`.
    fn receive(&mut self, holder: &HolderId, asset: Asset, amount: Amount)
    -> Result<(), LedgerError>;

    /// Pays `amount` of `asset` out of the pool vault to the holder's escrow.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InsufficientEscrow`] if the vault does not hold
    ///   `amount`.
    /// - [`LedgerError::ArithmeticOverflow`] if the holder's escrow would
    ///   overflow.
    fn release(&mut self, holder: &HolderId, asset: Asset, amount: Amount)
    -> Result<(), LedgerError>;

    /// Checks that [`Self::release`] would succeed, moving nothing.
    ///
    /// # Errors
    ///
    /// Returns the error [`Self::release`] would return.
    fn can_release(&self, holder: &HolderId, asset: Asset, amount: Amount)
    -> Result<(), LedgerError>;

    /// Returns the pool vault's balance of `asset`.
    fn vault_balance(&self, asset: Asset) -> Amount;
}

/// Per-holder escrow balances for both assets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowBalance {
    /// Escrowed asset A.
    pub asset_a: Amount,
    /// Escrowed asset B.
    pub asset_b: Amount,
}

impl EscrowBalance {
    /// Returns the balance of one asset.
    #[must_use]
    pub const fn get(&self, asset: Asset) -> Amount {
        match asset {
            Asset::A => self.asset_a,
            Asset::B => self.asset_b,
        }
    }

    fn slot(&mut self, asset: Asset) -> &mut Amount {
        match asset {
            Asset::A => &mut self.asset_a,
            Asset::B => &mut self.asset_b,
        }
    }

    const fn is_empty(&self) -> bool {
        self.asset_a.is_zero() && self.asset_b.is_zero()
    }
}

/// In-memory escrow and pool vault.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EscrowVault {
    escrow: BTreeMap<HolderId, EscrowBalance>,
    vault: EscrowBalance,
}

impl EscrowVault {
    /// Creates an empty vault.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a vault whose pool side already holds the given reserves.
    ///
    /// Used when restoring a persisted ledger so vault and reserves agree.
    #[must_use]
    pub fn with_reserves(reserve_a: Amount, reserve_b: Amount) -> Self {
        Self {
            escrow: BTreeMap::new(),
            vault: EscrowBalance {
                asset_a: reserve_a,
                asset_b: reserve_b,
            },
        }
    }

    /// Restores a vault from persisted reserves and holder escrows.
    #[must_use]
    pub fn restore(
        reserve_a: Amount,
        reserve_b: Amount,
        escrows: BTreeMap<HolderId, EscrowBalance>,
    ) -> Self {
        let mut vault = Self::with_reserves(reserve_a, reserve_b);
        vault.escrow = escrows
            .into_iter()
            .filter(|(_, balance)| !balance.is_empty())
            .collect();
        vault
    }

    /// Returns every non-empty holder escrow.
    #[must_use]
    pub const fn escrows(&self) -> &BTreeMap<HolderId, EscrowBalance> {
        &self.escrow
    }

    /// Returns the holder's escrow balances.
    #[must_use]
    pub fn escrow_of(&self, holder: &HolderId) -> EscrowBalance {
        self.escrow.get(holder).copied().unwrap_or_default()
    }

    /// Records an inbound transfer confirmed by the token collaborator.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] if `amount` is zero.
    /// - [`LedgerError::ArithmeticOverflow`] if the balance overflows.
    pub fn credit(
        &mut self,
        holder: &HolderId,
        asset: Asset,
        amount: Amount,
    ) -> Result<EscrowBalance, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount("credit amount must be positive"));
        }
        let mut balance = self.escrow_of(holder);
        let slot = balance.slot(asset);
        *slot = slot.checked_add(amount)?;
        self.escrow.insert(holder.clone(), balance);
        Ok(balance)
    }

    /// Records an outbound transfer claimed by the holder.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] if `amount` is zero.
    /// - [`LedgerError::InsufficientEscrow`] if the escrow does not cover it.
    pub fn debit(
        &mut self,
        holder: &HolderId,
        asset: Asset,
        amount: Amount,
    ) -> Result<EscrowBalance, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount("debit amount must be positive"));
        }
        let mut balance = self.escrow_of(holder);
        let available = balance.get(asset);
        if available < amount {
            return Err(LedgerError::InsufficientEscrow {
                asset,
                requested: amount,
                available,
            });
        }
        *balance.slot(asset) = available.checked_sub(amount)?;
        self.store(holder, balance);
        Ok(balance)
    }

    fn store(&mut self, holder: &HolderId, balance: EscrowBalance) {
        if balance.is_empty() {
            self.escrow.remove(holder);
        } else {
            self.escrow.insert(holder.clone(), balance);
        }
    }
}

impl AssetCustody for EscrowVault {
    fn receive(
        &mut self,
        holder: &HolderId,
        asset: Asset,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        let mut balance = self.escrow_of(holder);
        let available = balance.get(asset);
        if available < amount {
            return Err(LedgerError::InsufficientEscrow {
                asset,
                requested: amount,
                available,
            });
        }
        let vault_after = self.vault.get(asset).checked_add(amount)?;
        *balance.slot(asset) = available.checked_sub(amount)?;
        *self.vault.slot(asset) = vault_after;
        self.store(holder, balance);
        Ok(())
    }

    fn release(
        &mut self,
        holder: &HolderId,
        asset: Asset,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        self.can_release(holder, asset, amount)?;
        let mut balance = self.escrow_of(holder);
        let slot = balance.slot(asset);
        *slot = slot.checked_add(amount)?;
        *self.vault.slot(asset) = self.vault.get(asset).checked_sub(amount)?;
        self.store(holder, balance);
        Ok(())
    }

    fn can_release(
        &self,
        holder: &HolderId,
        asset: Asset,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let held = self.vault.get(asset);
        if held < amount {
            return Err(LedgerError::InsufficientEscrow {
                asset,
                requested: amount,
                available: held,
            });
        }
        self.escrow_of(holder).get(asset).checked_add(amount).map(|_| ())
    }

    fn vault_balance(&self, asset: Asset) -> Amount {
        self.vault.get(asset)
    }
}
