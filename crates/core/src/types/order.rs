//! Orders and their line items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Address, AddressId, OrderId, OrderStatus, PaymentType, Price, Product, ProductId, UserId};

/// Tax added on top of the item amount: 2 %, rounded down to a whole unit.
pub const TAX_RATE: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// One `(product, quantity)` pair of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    /// Item total plus tax.
    pub amount: Price,
    pub address_id: AddressId,
    pub status: OrderStatus,
    pub payment_type: PaymentType,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether the order shows up in order listings: cash on delivery, or paid.
    #[must_use]
    pub fn is_listed(&self) -> bool {
        self.payment_type == PaymentType::Cod || self.is_paid
    }
}

/// Order amount for `items` priced from `catalog`: item total plus floored tax.
///
/// Returns `None` if an item's product is not in `catalog`.
#[must_use]
pub fn order_amount(items: &[OrderItem], catalog: &[Product]) -> Option<Price> {
    let subtotal = items
        .iter()
        .map(|item| {
            catalog
                .iter()
                .find(|p| p.id == item.product_id)
                .map(|p| p.effective_price() * item.quantity)
        })
        .sum::<Option<Price>>()?;
    Some(subtotal + subtotal.scale(TAX_RATE).floor())
}

/// A line item with its product expanded.
///
/// `product` is `None` when the product has since been deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDetails {
    pub product_id: ProductId,
    pub quantity: u32,
    pub product: Option<Product>,
}

/// An order with its products and address expanded, as listed to users and sellers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItemDetails>,
    pub amount: Price,
    pub address: Option<Address>,
    pub status: OrderStatus,
    pub payment_type: PaymentType,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
}

impl OrderDetails {
    /// Expand `order` against the given products and address.
    #[must_use]
    pub fn expand(order: Order, products: &[Product], address: Option<Address>) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| OrderItemDetails {
                product_id: item.product_id,
                quantity: item.quantity,
                product: products.iter().find(|p| p.id == item.product_id).cloned(),
            })
            .collect();

        Self {
            id: order.id,
            user_id: order.user_id,
            items,
            amount: order.amount,
            address,
            status: order.status,
            payment_type: order.payment_type,
            is_paid: order.is_paid,
            created_at: order.created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::sample_products;

    #[test]
    fn test_tax_rate_is_two_percent() {
        assert_eq!(TAX_RATE, Decimal::new(2, 2));
    }

    #[test]
    fn test_order_amount_adds_floored_tax() {
        let mut catalog = sample_products();
        catalog.truncate(1);
        let product = catalog.first().unwrap().clone();
        let items = [OrderItem {
            product_id: product.id,
            quantity: 3,
        }];

        let subtotal = product.effective_price() * 3;
        let expected = subtotal + subtotal.scale(TAX_RATE).floor();
        assert_eq!(order_amount(&items, &catalog), Some(expected));
    }

    #[test]
    fn test_order_amount_unknown_product() {
        let items = [OrderItem {
            product_id: ProductId::new(-1),
            quantity: 1,
        }];
        assert_eq!(order_amount(&items, &sample_products()), None);
    }
}
