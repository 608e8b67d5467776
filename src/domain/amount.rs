//! Fixed-point quantities and checked wide arithmetic.
//!
//! [`Amount`] is a smallest-unit `u128` quantity used for reserves, shares,
//! and trade sizes. Intermediate products are computed in [`U256`] so that
//! `reserve_a × reserve_b` for 18-decimal assets never wraps. Every division
//! names its rounding direction explicitly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::LedgerError;

#[allow(missing_docs, clippy::all, clippy::pedantic)]
mod wide {
    uint::construct_uint! {
        /// 256-bit unsigned integer for overflow-free intermediate products.
        pub struct U256(4);
    }
}

pub use wide::U256;

/// Unsigned fixed-point quantity expressed in smallest units.
///
/// Serialized as a decimal string so that JSON consumers never lose
/// precision on values above 2^53.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u128);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from raw smallest units.
    #[must_use]
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// Returns the raw `u128` value.
    #[must_use]
    pub const fn get(self) -> u128 {
        self.0
    }

    /// Returns `true` if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Widens into a [`U256`].
    #[must_use]
    pub fn widen(self) -> U256 {
        U256::from(self.0)
    }

    /// Checked addition.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ArithmeticOverflow`] if the sum exceeds `u128`.
    pub fn checked_add(self, rhs: Self) -> Result<Self, LedgerError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(LedgerError::ArithmeticOverflow("amount addition"))
    }

    /// Saturating addition, for metrics that must never fail an operation.
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Checked subtraction.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ArithmeticOverflow`] if `rhs > self`.
    pub fn checked_sub(self, rhs: Self) -> Result<Self, LedgerError> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or(LedgerError::ArithmeticOverflow("amount subtraction"))
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl From<Amount> for u128 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u128>().map(Self)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Narrows a [`U256`] back into an [`Amount`].
///
/// # Errors
///
/// Returns [`LedgerError::ArithmeticOverflow`] if `value` exceeds `u128::MAX`.
pub fn narrow(value: U256, context: &'static str) -> Result<Amount, LedgerError> {
    if value > U256::from(u128::MAX) {
        return Err(LedgerError::ArithmeticOverflow(context));
    }
    Ok(Amount(value.low_u128()))
}

/// Computes `a × b / d`, rounding toward zero.
///
/// # Errors
///
/// Returns [`LedgerError::ArithmeticOverflow`] if `d` is zero or the
/// quotient does not fit in an [`Amount`].
pub fn mul_div_floor(
    a: Amount,
    b: Amount,
    d: Amount,
    context: &'static str,
) -> Result<Amount, LedgerError> {
    let product = a
        .widen()
        .checked_mul(b.widen())
        .ok_or(LedgerError::ArithmeticOverflow(context))?;
    let quotient = product
        .checked_div(d.widen())
        .ok_or(LedgerError::ArithmeticOverflow(context))?;
    narrow(quotient, context)
}

/// Computes `a × b / d`, rounding away from zero.
///
/// # Errors
///
/// Returns [`LedgerError::ArithmeticOverflow`] if `d` is zero or the
/// quotient does not fit in an [`Amount`].
pub fn mul_div_ceil(
    a: Amount,
    b: Amount,
    d: Amount,
    context: &'static str,
) -> Result<Amount, LedgerError> {
    let product = a
        .widen()
        .checked_mul(b.widen())
        .ok_or(LedgerError::ArithmeticOverflow(context))?;
    let quotient = div_ceil(product, d.widen(), context)?;
    narrow(quotient, context)
}

/// Divides two [`U256`] values, rounding away from zero.
///
/// # Errors
///
/// Returns [`LedgerError::ArithmeticOverflow`] if `d` is zero.
pub fn div_ceil(n: U256, d: U256, context: &'static str) -> Result<U256, LedgerError> {
    if d.is_zero() {
        return Err(LedgerError::ArithmeticOverflow(context));
    }
    let (quotient, remainder) = n.div_mod(d);
    if remainder.is_zero() {
        Ok(quotient)
    } else {
        quotient
            .checked_add(U256::one())
            .ok_or(LedgerError::ArithmeticOverflow(context))
    }
}
