//! Cart sync route handler.
//!
//! The client owns the cart and pushes the whole mapping after every change.

use std::collections::BTreeMap;

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use greencart_core::{CartItems, CartRevision, Envelope, ProductId, envelope::payload::CartPayload};

use super::json::JsonBody;
use crate::db::CartWrite;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartUpdateRequest {
    /// Raw quantities; non-positive entries are dropped.
    #[serde(default)]
    pub cart_items: BTreeMap<ProductId, i64>,
    /// Client mutation counter. Absent means last writer wins.
    #[serde(default)]
    pub revision: Option<CartRevision>,
}

/// Store the caller's cart.
///
/// Unknown product ids are dropped. A write whose revision is not newer than
/// the stored one is ignored and answered with the stored revision, so the
/// client can tell it was superseded.
#[instrument(skip(state, body), fields(revision = ?body.revision))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    JsonBody(body): JsonBody<CartUpdateRequest>,
) -> Result<Json<Envelope<CartPayload>>> {
    let mut items = CartItems::from_quantities(body.cart_items)?;

    let ids: Vec<ProductId> = items.ids().collect();
    let known = state.products().existing_ids(&ids).await?;
    let dropped = items.retain_known(&known);
    if !dropped.is_empty() {
        tracing::warn!(?dropped, "Dropping unknown products from cart");
    }

    match state
        .users()
        .update_cart(user_id, &items, body.revision)
        .await?
    {
        CartWrite::Applied(revision) => Ok(Json(Envelope::ok_with_message(
            "Cart updated",
            CartPayload { revision },
        ))),
        CartWrite::Stale(revision) => {
            tracing::debug!(stored = revision.get(), "Ignoring stale cart write");
            Ok(Json(Envelope::ok_with_message(
                "Cart update superseded",
                CartPayload { revision },
            )))
        }
    }
}
