//! Cart mapping: product id → quantity.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{Price, Product, ProductId, ValidationError};

/// Quantities of products in a shopper's cart.
///
/// Every stored quantity is at least 1; an operation that would leave an
/// entry at zero removes it instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartItems(BTreeMap<ProductId, u32>);

impl CartItems {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build a cart from raw client quantities.
    ///
    /// Entries with a non-positive quantity are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Invalid`] if a quantity does not fit in `u32`.
    pub fn from_quantities(
        raw: impl IntoIterator<Item = (ProductId, i64)>,
    ) -> Result<Self, ValidationError> {
        let mut items = BTreeMap::new();
        for (id, quantity) in raw {
            if quantity <= 0 {
                continue;
            }
            let quantity = u32::try_from(quantity).map_err(|_| {
                ValidationError::invalid("cartItems", format!("quantity for product {id} is too large"))
            })?;
            items.insert(id, quantity);
        }
        Ok(Self(items))
    }

    /// Increment the quantity of `id`, initializing it to 1.
    pub fn add(&mut self, id: ProductId) {
        let quantity = self.0.entry(id).or_insert(0);
        *quantity = quantity.saturating_add(1);
    }

    /// Set the exact quantity of `id`; zero removes the entry.
    pub fn set(&mut self, id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.0.remove(&id);
        } else {
            self.0.insert(id, quantity);
        }
    }

    /// Decrement the quantity of `id`, removing it when it reaches zero.
    ///
    /// Returns `false` if `id` was not in the cart.
    pub fn remove_one(&mut self, id: ProductId) -> bool {
        let Some(quantity) = self.0.get_mut(&id) else {
            return false;
        };
        *quantity -= 1;
        if *quantity == 0 {
            self.0.remove(&id);
        }
        true
    }

    /// Drop entries whose product is not in `known`, returning the dropped ids.
    pub fn retain_known(&mut self, known: &HashSet<ProductId>) -> Vec<ProductId> {
        let dropped: Vec<ProductId> = self
            .0
            .keys()
            .filter(|id| !known.contains(id))
            .copied()
            .collect();
        for id in &dropped {
            self.0.remove(id);
        }
        dropped
    }

    /// Quantity of `id`, zero if absent.
    #[must_use]
    pub fn quantity(&self, id: ProductId) -> u32 {
        self.0.get(&id).copied().unwrap_or(0)
    }

    /// Total number of units across all entries.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.0.values().map(|&q| u64::from(q)).sum()
    }

    /// Sum of line prices for products present in `catalog`.
    ///
    /// Each line uses the offer price, or the list price when no offer is set.
    /// Entries whose product is missing from the catalog contribute nothing.
    #[must_use]
    pub fn total_amount(&self, catalog: &[Product]) -> Price {
        self.0
            .iter()
            .filter_map(|(id, &quantity)| {
                catalog
                    .iter()
                    .find(|p| p.id == *id)
                    .map(|p| p.effective_price() * quantity)
            })
            .sum()
    }

    /// Product ids in the cart.
    pub fn ids(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.0.keys().copied()
    }

    /// `(id, quantity)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ProductId, u32)> + '_ {
        self.0.iter().map(|(&id, &q)| (id, q))
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Monotonic sequence number attached to each cart write.
///
/// The server stores the revision of the last applied write and ignores
/// writes that carry an older or equal one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartRevision(u64);

impl CartRevision {
    /// Wrap a raw revision.
    #[must_use]
    pub const fn new(revision: u64) -> Self {
        Self(revision)
    }

    /// The raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The revision after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}
