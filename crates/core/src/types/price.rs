//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(10, 2)` and carried as [`Decimal`]. Any
//! arithmetic that produces a charged amount (line totals, order totals) goes
//! through integer minor units (kopecks/cents) via [`Price::to_minor_units`]
//! and [`Price::from_minor_units`], so summing many lines never accumulates
//! rounding drift.

use core::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of minor units in one major unit.
const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Errors produced by price arithmetic.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is negative.
    #[error("price cannot be negative")]
    Negative,
    /// The amount does not fit in 64-bit minor units.
    #[error("price is out of range")]
    Overflow,
}

/// A non-negative monetary amount in the store currency.
///
/// Serializes as a decimal string (e.g. `"1240.00"`) to avoid float
/// precision loss in JSON clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero in the store currency.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount in major units.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for amounts below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Build a price from whole minor units, e.g. `124_000` -> `1240.00`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for negative input.
    pub fn from_minor_units(minor: i64) -> Result<Self, PriceError> {
        if minor < 0 {
            return Err(PriceError::Negative);
        }
        Ok(Self(Decimal::new(minor, 2)))
    }

    /// Convert to whole minor units, rounding half-up at the second decimal.
    ///
    /// `0.005` becomes `1`, `490.00` becomes `49_000`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the amount does not fit in `i64`.
    pub fn to_minor_units(&self) -> Result<i64, PriceError> {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let minor = rounded
            .checked_mul(Decimal::from(MINOR_UNITS_PER_MAJOR))
            .ok_or(PriceError::Overflow)?;
        minor.trunc().to_i64().ok_or(PriceError::Overflow)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn price(s: &str) -> Price {
        Price::new(Decimal::from_str(s).unwrap()).unwrap()
    }

    #[test]
    fn test_to_minor_units_exact() {
        assert_eq!(price("490.00").to_minor_units().unwrap(), 49_000);
        assert_eq!(price("260").to_minor_units().unwrap(), 26_000);
        assert_eq!(price("0").to_minor_units().unwrap(), 0);
    }

    #[test]
    fn test_to_minor_units_rounds_half_up() {
        assert_eq!(price("0.005").to_minor_units().unwrap(), 1);
        assert_eq!(price("0.004").to_minor_units().unwrap(), 0);
        assert_eq!(price("19.995").to_minor_units().unwrap(), 2000);
        assert_eq!(price("0.1").to_minor_units().unwrap(), 10);
    }

    #[test]
    fn test_from_minor_units_keeps_two_decimals() {
        let total = Price::from_minor_units(124_000).unwrap();
        assert_eq!(total.to_string(), "1240.00");
        assert_eq!(total, price("1240.00"));
    }

    #[test]
    fn test_negative_rejected() {
        assert_eq!(
            Price::new(Decimal::from_str("-0.01").unwrap()),
            Err(PriceError::Negative)
        );
        assert_eq!(Price::from_minor_units(-1), Err(PriceError::Negative));
    }

    #[test]
    fn test_overflow_detected() {
        let huge = Price::new(Decimal::MAX).unwrap();
        assert_eq!(huge.to_minor_units(), Err(PriceError::Overflow));
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&price("150.00")).unwrap();
        assert_eq!(json, "\"150.00\"");
    }
}
