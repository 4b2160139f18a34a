//! Amount - Non-negative token amount with fixed precision
//!
//! All balances and transfer amounts in DSP are non-negative and carry at most
//! [`DECIMALS`] fractional digits. Both rules are enforced by the constructor.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fractional digits of the token (1 unit = 10_000 base units)
pub const DECIMALS: u32 = 4;

/// Errors that can occur when working with amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Amount has more than {DECIMALS} decimal places: {0}")]
    ExcessPrecision(Decimal),
}

/// A non-negative token amount with at most four decimal places.
///
/// # Invariant
/// The inner value is always >= 0 and `scale() <= DECIMALS` once normalized.
///
/// # Example
/// ```
/// use dsp_core::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::from_units(1_000_0000);
/// assert_eq!(amount.value(), Decimal::new(1000, 0));
///
/// // Negative amounts are rejected
/// assert!(Amount::new(Decimal::new(-100, 0)).is_err());
/// // So are amounts finer than the token precision
/// assert!(Amount::new(Decimal::new(1, 5)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero amount constant
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new Amount from a Decimal.
    ///
    /// Returns an error if the value is negative or finer than the token precision.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::NegativeAmount(value));
        }
        if value.normalize().scale() > DECIMALS {
            return Err(AmountError::ExcessPrecision(value));
        }
        Ok(Self(value))
    }

    /// Create an Amount from a computed value, dropping digits beyond the
    /// token precision (rounds toward zero).
    pub fn truncated(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::NegativeAmount(value));
        }
        Ok(Self(value.round_dp_with_strategy(DECIMALS, RoundingStrategy::ToZero)))
    }

    /// Create an Amount from integer base units (`1_0000` == 1.0000)
    pub fn from_units(units: u64) -> Self {
        Self(Decimal::from(units) / Decimal::from(10u64.pow(DECIMALS)))
    }

    /// Create an Amount without validation.
    ///
    /// # Safety
    /// The caller MUST ensure the value is non-negative and within precision.
    /// Use only for trusted sources (e.g., constants).
    #[inline]
    pub const fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    /// Get the inner Decimal value
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Check if the amount is zero
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition - returns None on overflow
    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Checked subtraction - returns None if result would be negative
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        let result = self.0.checked_sub(other.0)?;
        if result < Decimal::ZERO {
            None
        } else {
            Some(Amount(result))
        }
    }

    /// Subtraction clamped at zero
    pub fn saturating_sub(&self, other: &Amount) -> Amount {
        self.checked_sub(other).unwrap_or(Amount::ZERO)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}
