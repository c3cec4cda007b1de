//! Non-negative monetary amounts using decimal arithmetic.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("price must be a number")]
    NotANumber,
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount has more than two decimal places.
    #[error("price can have at most 2 decimal places")]
    TooPrecise,
    /// The amount does not fit the stored `NUMERIC(12, 2)` column.
    #[error("price must be less than 10000000000")]
    TooLarge,
}

/// A non-negative amount in the shop currency.
///
/// Serialized as a JSON number so storefront clients can do arithmetic on it;
/// deserialization accepts either a number or a numeric string.
///
/// ```
/// use bazaar_core::Price;
///
/// let total = Price::sum([Price::parse("10").unwrap(), Price::parse("15").unwrap()]);
/// assert_eq!(total.to_gateway_amount(), "25.00");
/// assert!(Price::parse("-1").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Maximum number of decimal places accepted.
    pub const MAX_SCALE: u32 = 2;

    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Exclusive upper bound: ten integer digits.
    pub const LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` for amounts below zero,
    /// `PriceError::TooLarge` for amounts of [`Price::LIMIT`] or more, and
    /// `PriceError::TooPrecise` for more than two decimal places.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount >= Self::LIMIT {
            return Err(PriceError::TooLarge);
        }
        let normalized = amount.normalize();
        if normalized.scale() > Self::MAX_SCALE {
            return Err(PriceError::TooPrecise);
        }
        Ok(Self(normalized))
    }

    /// Parse a price from user input such as `"19.99"`.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::NotANumber` if the input is not a decimal, or any
    /// error from [`Price::new`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    /// Returns the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Sum a sequence of prices.
    #[must_use]
    pub fn sum(prices: impl IntoIterator<Item = Self>) -> Self {
        Self(prices.into_iter().map(|p| p.0).sum())
    }

    /// Format with exactly two decimal places, as payment gateways expect.
    #[must_use]
    pub fn to_gateway_amount(&self) -> String {
        format!("{:.2}", self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Two decimal places always fit in an f64 without visible rounding.
        serializer.serialize_f64(self.0.to_f64().unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        let rounded = amount.round_dp(Self::MAX_SCALE);
        Self::new(rounded).map_err(serde::de::Error::custom)
    }
}

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
        // The column carries a CHECK (price >= 0) constraint.
        Ok(Self(amount))
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
