//! # Money Module
//!
//! Fixed-point money stored as integer cents.
//!
//! Balances live in the store as INTEGER minor units so that debit and credit
//! can be expressed as atomic column updates (`balance = balance - ?`) without
//! any rounding. `rust_decimal::Decimal` is the exchange format at the edges.

use crate::error::{CoreError, CoreResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of fractional digits carried by every amount.
pub const SCALE: u32 = 2;

/// An amount of money in the bank's single currency.
///
/// # Examples
/// ```
/// use kodbank_core::Money;
/// use rust_decimal::Decimal;
///
/// let rent = Money::from_decimal(Decimal::new(250000, 2)).unwrap();
/// assert_eq!(rent.cents(), 250000);
/// assert_eq!(rent.to_string(), "2500.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Balance credited to every newly registered account (10,000.00)
    pub const STARTING_BALANCE: Money = Money(1_000_000);

    /// Smallest amount a single transfer may move (1.00)
    pub const MIN_TRANSFER: Money = Money(100);

    /// Largest amount a single transfer may move (1,000,000.00)
    pub const MAX_TRANSFER: Money = Money(100_000_000);

    /// Create Money from raw cents
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Convert a decimal into Money.
    ///
    /// Rejects values with more than two fractional digits instead of
    /// rounding them, and values that do not fit in i64 cents.
    pub fn from_decimal(value: Decimal) -> CoreResult<Self> {
        if value.round_dp(SCALE) != value {
            return Err(CoreError::InvalidAmount(format!(
                "{} has more than {} decimal places",
                value, SCALE
            )));
        }
        let cents = (value * Decimal::ONE_HUNDRED)
            .to_i64()
            .ok_or_else(|| CoreError::InvalidAmount(format!("{} is out of range", value)))?;
        Ok(Self(cents))
    }

    /// Raw cents
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Decimal representation with scale 2
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, SCALE)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Validate that this amount may be moved by a single transfer.
    pub fn ensure_transfer_range(self) -> CoreResult<Self> {
        if self < Self::MIN_TRANSFER || self > Self::MAX_TRANSFER {
            return Err(CoreError::AmountOutOfRange {
                amount: self.to_string(),
                min: Self::MIN_TRANSFER,
                max: Self::MAX_TRANSFER,
            });
        }
        Ok(self)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = CoreError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::from_decimal(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.to_decimal()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_decimal() {
        assert_eq!(Money::from_decimal(dec!(2500.00)).unwrap().cents(), 250_000);
        assert_eq!(Money::from_decimal(dec!(0.5)).unwrap().cents(), 50);
        assert_eq!(Money::from_decimal(dec!(10000)).unwrap(), Money::STARTING_BALANCE);
    }

    #[test]
    fn test_from_decimal_rejects_sub_cent_precision() {
        let err = Money::from_decimal(dec!(1.005)).unwrap_err();
        assert!(err.is_amount_error());
        // Trailing zeros are not extra precision
        assert!(Money::from_decimal(dec!(1.5000)).is_ok());
    }

    #[test]
    fn test_display_keeps_two_decimals() {
        assert_eq!(Money::from_cents(750_000).to_string(), "7500.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_transfer_range() {
        assert!(Money::from_decimal(dec!(1)).unwrap().ensure_transfer_range().is_ok());
        assert!(Money::from_decimal(dec!(1000000)).unwrap().ensure_transfer_range().is_ok());
        assert!(Money::from_decimal(dec!(0.99)).unwrap().ensure_transfer_range().is_err());
        assert!(Money::from_decimal(dec!(999999999)).unwrap().ensure_transfer_range().is_err());
    }

    #[test]
    fn test_serde_as_decimal_string() {
        let json = serde_json::to_string(&Money::from_cents(123_456)).unwrap();
        assert_eq!(json, "\"1234.56\"");

        let back: Money = serde_json::from_str("\"1234.56\"").unwrap();
        assert_eq!(back.cents(), 123_456);

        assert!(serde_json::from_str::<Money>("\"1.234\"").is_err());
    }
}
