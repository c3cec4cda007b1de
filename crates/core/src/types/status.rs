//! Status and role enums.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fulfilment status of an order.
///
/// Serialized with the human-readable labels storefront clients display
/// (`"Not Process"`, `"Shipped"`, ...). Any status may be overwritten with
/// any other by an administrator; there is no transition graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "Not Process")]
    NotProcess,
    #[serde(rename = "Processing")]
    Processing,
    #[serde(rename = "Shipped")]
    Shipped,
    #[serde(rename = "Delivered")]
    Delivered,
    #[serde(rename = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::NotProcess,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// The stored and displayed label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotProcess => "Not Process",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.label() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        s.parse().map_err(Into::into)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.label(), buf)
    }
}

/// Account role.
///
/// Stored as a small integer (`0` consumer, `1` admin) and serialized the
/// same way, which is what existing storefront clients compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UserRole {
    /// Regular shopper.
    #[default]
    Consumer,
    /// Catalog and order administrator.
    Admin,
}

impl UserRole {
    /// Numeric code used in storage and JSON.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Consumer => 0,
            Self::Admin => 1,
        }
    }

    /// Decode a numeric role code.
    ///
    /// # Errors
    ///
    /// Returns an error for codes other than `0` and `1`.
    pub fn from_code(code: i16) -> Result<Self, String> {
        match code {
            0 => Ok(Self::Consumer),
            1 => Ok(Self::Admin),
            other => Err(format!("invalid user role code: {other}")),
        }
    }

    /// Returns true for administrators.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Consumer => write!(f, "consumer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl Serialize for UserRole {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i16(self.code())
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i16::deserialize(deserializer)?;
        Self::from_code(code).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for UserRole {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for UserRole {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let code = <i16 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Self::from_code(code).map_err(Into::into)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for UserRole {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i16 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.code(), buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_default_is_not_process() {
        assert_eq!(OrderStatus::default(), OrderStatus::NotProcess);
        assert_eq!(OrderStatus::default().label(), "Not Process");
    }

    #[test]
    fn test_order_status_labels_round_trip_through_from_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.label().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("Lost".parse::<OrderStatus>().is_err());
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_status_json_uses_labels() {
        let json = serde_json::to_string(&OrderStatus::NotProcess).unwrap();
        assert_eq!(json, "\"Not Process\"");
        let parsed: OrderStatus = serde_json::from_str("\"Cancelled\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
    }

    #[test]
    fn test_user_role_codes() {
        assert_eq!(UserRole::Consumer.code(), 0);
        assert_eq!(UserRole::Admin.code(), 1);
        assert!(UserRole::from_code(1).unwrap().is_admin());
        assert!(UserRole::from_code(7).is_err());
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "1");
    }
}
