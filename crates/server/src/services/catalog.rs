//! Cached product list.
//!
//! The full product list is read on every storefront load, so it is cached
//! for a short time and invalidated on every product write.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use greencart_core::Product;

use crate::db::{ProductRepository, RepositoryError};

/// Only one entry: the whole list.
const LIST_KEY: () = ();

/// Time-to-live bounding staleness if an invalidation races a refill.
const LIST_TTL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<(), Arc<Vec<Product>>>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder().max_capacity(1).time_to_live(LIST_TTL).build(),
        }
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns the repository error on a cache miss that fails to load.
    pub async fn list(
        &self,
        products: &dyn ProductRepository,
    ) -> Result<Arc<Vec<Product>>, RepositoryError> {
        if let Some(cached) = self.cache.get(&LIST_KEY).await {
            debug!("Cache hit for product list");
            return Ok(cached);
        }

        let fresh = Arc::new(products.list().await?);
        self.cache.insert(LIST_KEY, Arc::clone(&fresh)).await;
        Ok(fresh)
    }

    /// Drop the cached list after a product write.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&LIST_KEY).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use greencart_core::{NewProduct, Price, Rating};

    use super::*;
    use crate::db::memory::MemoryStore;

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            description: vec![],
            category: "Fruits".to_owned(),
            price: Price::from_unsigned_cents(300),
            offer_price: Price::from_unsigned_cents(250),
            in_stock: true,
            rating: Rating::default(),
            images: vec![],
        }
    }

    #[tokio::test]
    async fn test_list_is_cached_until_invalidated() {
        let store = MemoryStore::default();
        let cache = CatalogCache::new();

        ProductRepository::create(&store, new_product("Apple")).await.unwrap();
        assert_eq!(cache.list(&store).await.unwrap().len(), 1);

        ProductRepository::create(&store, new_product("Pear")).await.unwrap();
        assert_eq!(cache.list(&store).await.unwrap().len(), 1);

        cache.invalidate().await;
        let products = cache.list(&store).await.unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Pear");
    }
}
