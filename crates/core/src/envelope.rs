//! The JSON response envelope shared by every endpoint.
//!
//! ```json
//! { "success": true, "message": "Product added", "product": { ... } }
//! { "success": false, "message": "Not authorized" }
//! ```
//!
//! The payload keys are flattened next to `success` and `message`, so each
//! endpoint picks its own payload struct (see [`payload`]).

use serde::{Deserialize, Serialize};

/// `{ success, message?, ...payload }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Successful response carrying a payload.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Successful response carrying a message and a payload.
    #[must_use]
    pub fn ok_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    /// Successful response with only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Failure response; never carries a payload.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Convert into the payload, or the failure message.
    ///
    /// # Errors
    ///
    /// Returns the envelope message when `success` is false or the payload is
    /// missing.
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(self
                .message
                .unwrap_or_else(|| "response is missing its payload".to_owned())),
            (false, _) => Err(self.message.unwrap_or_else(|| "request failed".to_owned())),
        }
    }
}

/// Endpoint payloads.
pub mod payload {
    use serde::{Deserialize, Serialize};

    use crate::types::{Address, CartRevision, OrderDetails, Product, User};

    /// No payload beyond `success`/`message`.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Empty {}

    /// Login, registration and `is-auth`.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserPayload {
        pub user: User,
        /// Bearer token, present on login and registration.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub token: Option<String>,
    }

    /// Seller login.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TokenPayload {
        pub token: String,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ProductsPayload {
        pub products: Vec<Product>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ProductPayload {
        pub product: Product,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AddressesPayload {
        pub addresses: Vec<Address>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AddressPayload {
        pub address: Address,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct OrdersPayload {
        pub orders: Vec<OrderDetails>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct OrderPayload {
        pub order: OrderDetails,
    }

    /// Cart update result: the revision now stored on the server.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CartPayload {
        pub revision: CartRevision,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::payload::{CartPayload, Empty};
    use super::*;
    use crate::types::CartRevision;

    #[test]
    fn test_payload_is_flattened() {
        let envelope = Envelope::ok_with_message(
            "Cart Updated",
            CartPayload {
                revision: CartRevision::new(4),
            },
        );
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({ "success": true, "message": "Cart Updated", "revision": 4 })
        );
    }

    #[test]
    fn test_failure_has_no_payload() {
        let envelope = Envelope::<CartPayload>::failure("Not authorized");
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({ "success": false, "message": "Not authorized" })
        );
    }

    #[test]
    fn test_failure_deserializes_without_payload() {
        let envelope: Envelope<CartPayload> =
            serde_json::from_value(json!({ "success": false, "message": "nope" })).unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(envelope.into_result(), Err("nope".to_owned()));
    }

    #[test]
    fn test_message_only_round_trips_with_empty() {
        let envelope: Envelope<Empty> =
            serde_json::from_value(json!({ "success": true, "message": "Logged out" })).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("Logged out"));
    }
}
