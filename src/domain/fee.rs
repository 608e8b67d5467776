//! Optional swap fee deducted from the input amount.
//!
//! The baseline pool charges nothing. A non-zero fee is taken from
//! `amount_in` before the pricing formula runs:
//!
//! ```text
//! fee        = ceil(amount_in × fee_bps / 10_000)
//! net_input  = amount_in − fee
//! amount_out = price_curve(net_input)
//! ```
//!
//! The full `amount_in` is still credited to the input reserve, so the fee
//! accrues to share holders through a larger `K`.

use serde::{Deserialize, Serialize};

use super::amount::mul_div_ceil;
use super::{Amount, LedgerError};

/// Basis-point denominator (100 %).
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Swap fee configuration in basis points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePolicy {
    fee_bps: u32,
}

impl FeePolicy {
    /// The zero-fee baseline.
    pub const NONE: Self = Self { fee_bps: 0 };

    /// Creates a fee policy.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] if `fee_bps` exceeds 10 000.
    pub fn new(fee_bps: u32) -> Result<Self, LedgerError> {
        if fee_bps > BPS_DENOMINATOR {
            return Err(LedgerError::InvalidAmount("fee exceeds 10000 bps"));
        }
        Ok(Self { fee_bps })
    }

    /// Returns the fee in basis points.
    #[must_use]
    pub const fn bps(self) -> u32 {
        self.fee_bps
    }

    /// Splits `amount_in` into `(net_input, fee)`, rounding the fee up.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ArithmeticOverflow`] on overflow.
    pub fn split(self, amount_in: Amount) -> Result<(Amount, Amount), LedgerError> {
        if self.fee_bps == 0 {
            return Ok((amount_in, Amount::ZERO));
        }
        let fee = mul_div_ceil(
            amount_in,
            Amount::new(u128::from(self.fee_bps)),
            Amount::new(u128::from(BPS_DENOMINATOR)),
            "fee calculation",
        )?;
        Ok((amount_in.checked_sub(fee)?, fee))
    }
}
