//! Order route handlers.
//!
//! Only cash-on-delivery orders are placed here. Listings show orders that
//! are COD or already paid, with products and address expanded.

use std::collections::BTreeSet;

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use greencart_core::{
    AddressId, Envelope, Order, OrderDetails, OrderId, OrderItem, OrderStatus, PaymentType,
    Price, ProductId, order_amount,
    envelope::payload::{OrderPayload, OrdersPayload},
};

use super::json::JsonBody;
use crate::db::{NewOrder, RepositoryError};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{RequireSeller, RequireUser};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct OrderLine {
    pub product: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderLine>,
    pub address: Option<AddressId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

// =============================================================================
// Helpers
// =============================================================================

/// Expand orders with their products and addresses in two batch reads.
async fn expand_orders(state: &AppState, orders: Vec<Order>) -> Result<Vec<OrderDetails>> {
    let product_ids: Vec<ProductId> = orders
        .iter()
        .flat_map(|o| o.items.iter().map(|i| i.product_id))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let address_ids: Vec<AddressId> = orders
        .iter()
        .map(|o| o.address_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let products = state.products().get_many(&product_ids).await?;
    let addresses = state.addresses().get_many(&address_ids).await?;

    Ok(orders
        .into_iter()
        .map(|order| {
            let address = addresses.iter().find(|a| a.id == order.address_id).cloned();
            OrderDetails::expand(order, &products, address)
        })
        .collect())
}

// =============================================================================
// Handlers
// =============================================================================

/// Place a cash-on-delivery order and empty the caller's cart.
///
/// The amount is priced server-side from current offer prices plus tax.
#[instrument(skip(state, body), fields(items = body.items.len()))]
pub async fn place_cod(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    JsonBody(body): JsonBody<PlaceOrderRequest>,
) -> Result<Json<Envelope<OrderPayload>>> {
    let Some(address_id) = body.address else {
        return Err(AppError::BadRequest("Invalid data".to_string()));
    };
    if body.items.is_empty() || body.items.iter().any(|line| line.quantity == 0) {
        return Err(AppError::BadRequest("Invalid data".to_string()));
    }

    let address = state
        .addresses()
        .get(address_id)
        .await?
        .filter(|a| a.user_id == user_id)
        .ok_or_else(|| AppError::NotFound("Address not found".to_string()))?;

    let items: Vec<OrderItem> = body
        .items
        .iter()
        .map(|line| OrderItem {
            product_id: line.product,
            quantity: line.quantity,
        })
        .collect();
    let ids: Vec<ProductId> = items.iter().map(|i| i.product_id).collect();
    let products = state.products().get_many(&ids).await?;
    let amount = order_amount(&items, &products)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    if amount > Price::MAX {
        return Err(AppError::BadRequest("Order amount is too large".to_string()));
    }

    let order = state
        .orders()
        .create(NewOrder {
            user_id,
            items,
            amount,
            address_id,
            payment_type: PaymentType::Cod,
        })
        .await?;
    add_breadcrumb("order", "Order placed", Some(&[("payment", "COD")]));
    tracing::info!(order_id = %order.id, amount = %order.amount, "Order placed");

    // The order stands even if the cart cannot be emptied.
    if let Err(e) = state.users().clear_cart(user_id).await {
        tracing::warn!(error = %e, "Failed to clear cart after order");
    }

    Ok(Json(Envelope::ok_with_message(
        "Order Placed Successfully",
        OrderPayload {
            order: OrderDetails::expand(order, &products, Some(address)),
        },
    )))
}

/// The caller's orders, newest first.
#[instrument(skip(state))]
pub async fn user_orders(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<Envelope<OrdersPayload>>> {
    let orders = state.orders().list_listed(Some(user_id)).await?;
    let orders = expand_orders(&state, orders).await?;
    Ok(Json(Envelope::ok(OrdersPayload { orders })))
}

/// Every order, newest first.
#[instrument(skip(state))]
pub async fn seller_orders(
    State(state): State<AppState>,
    RequireSeller(seller_id): RequireSeller,
) -> Result<Json<Envelope<OrdersPayload>>> {
    let orders = state.orders().list_listed(None).await?;
    let orders = expand_orders(&state, orders).await?;
    Ok(Json(Envelope::ok(OrdersPayload { orders })))
}

/// Set an order's status. Any status may follow any other.
#[instrument(skip(state))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireSeller(seller_id): RequireSeller,
    JsonBody(body): JsonBody<StatusRequest>,
) -> Result<Json<Envelope<OrderPayload>>> {
    let order = state
        .orders()
        .set_status(body.order_id, body.status)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Order not found".to_string()),
            other => other.into(),
        })?;

    let mut expanded = expand_orders(&state, vec![order]).await?;
    let order = expanded
        .pop()
        .ok_or_else(|| AppError::Internal("expanded order vanished".to_string()))?;

    Ok(Json(Envelope::ok_with_message(
        "Status updated",
        OrderPayload { order },
    )))
}
