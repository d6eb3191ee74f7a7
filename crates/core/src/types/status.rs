//! Status enums for orders.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Order status.
///
/// Sellers may set any status at any time; there is no transition graph.
/// The wire and storage form is the human label (`"Order Placed"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "Order Placed")]
    OrderPlaced,
    #[serde(rename = "Processing")]
    Processing,
    #[serde(rename = "Shipped")]
    Shipped,
    #[serde(rename = "Out for delivery")]
    OutForDelivery,
    #[serde(rename = "Delivered")]
    Delivered,
    #[serde(rename = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Every status, in display order.
    pub const ALL: [Self; 6] = [
        Self::OrderPlaced,
        Self::Processing,
        Self::Shipped,
        Self::OutForDelivery,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Human label used on the wire and in storage.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OrderPlaced => "Order Placed",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::OutForDelivery => "Out for delivery",
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

impl std::str::FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::invalid("status", format!("'{s}' is not a known status")))
    }
}

/// How an order is paid.
///
/// Only cash on delivery is placed by this system; `Online` exists so orders
/// paid elsewhere can still be stored and listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentType {
    #[default]
    #[serde(rename = "COD")]
    Cod,
    #[serde(rename = "Online")]
    Online,
}

impl PaymentType {
    /// Wire and storage label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cod => "COD",
            Self::Online => "Online",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for PaymentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "COD" => Ok(Self::Cod),
            "Online" => Ok(Self::Online),
            other => Err(ValidationError::invalid(
                "paymentType",
                format!("'{other}' is not a known payment type"),
            )),
        }
    }
}

/// Store a label enum as `TEXT`.
#[cfg(feature = "postgres")]
macro_rules! text_column {
    ($name:ty) => {
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <&str as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let label = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(label.parse::<Self>()?)
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.label(), buf)
            }
        }
    };
}

#[cfg(feature = "postgres")]
text_column!(OrderStatus);
#[cfg(feature = "postgres")]
text_column!(PaymentType);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_labels() {
        let json = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"Out for delivery\"");
        let parsed: OrderStatus = serde_json::from_str("\"Order Placed\"").unwrap();
        assert_eq!(parsed, OrderStatus::OrderPlaced);
    }

    #[test]
    fn test_status_from_str_is_case_insensitive() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_type_labels() {
        assert_eq!(PaymentType::default().to_string(), "COD");
        assert_eq!("Online".parse::<PaymentType>().unwrap(), PaymentType::Online);
    }
}
