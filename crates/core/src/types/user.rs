//! User records as exposed to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CartItems, CartRevision, Email, UserId};

/// A shopper or seller account.
///
/// Credentials never leave the server, so this type has no password field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub is_seller: bool,
    pub cart: CartItems,
    /// Revision of the last applied cart write.
    pub cart_revision: CartRevision,
    pub created_at: DateTime<Utc>,
}
