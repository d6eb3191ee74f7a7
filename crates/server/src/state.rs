//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::{
    AddressRepository, HealthCheck, OrderRepository, ProductRepository, Repositories,
    UserRepository,
};
use crate::services::auth::TokenService;
use crate::services::catalog::CatalogCache;
use crate::services::media::MediaStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like repositories, the media store, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    repos: Repositories,
    media: Arc<dyn MediaStore>,
    tokens: TokenService,
    catalog: CatalogCache,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ServerConfig, repos: Repositories, media: Arc<dyn MediaStore>) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                repos,
                media,
                tokens,
                catalog: CatalogCache::new(),
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserRepository {
        self.inner.repos.users.as_ref()
    }

    #[must_use]
    pub fn products(&self) -> &dyn ProductRepository {
        self.inner.repos.products.as_ref()
    }

    #[must_use]
    pub fn addresses(&self) -> &dyn AddressRepository {
        self.inner.repos.addresses.as_ref()
    }

    #[must_use]
    pub fn orders(&self) -> &dyn OrderRepository {
        self.inner.repos.orders.as_ref()
    }

    #[must_use]
    pub fn health(&self) -> &dyn HealthCheck {
        self.inner.repos.health.as_ref()
    }

    /// Get a reference to the product image store.
    #[must_use]
    pub fn media(&self) -> &dyn MediaStore {
        self.inner.media.as_ref()
    }

    /// Get a reference to the bearer token issuer.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the cached product list.
    #[must_use]
    pub fn catalog(&self) -> &CatalogCache {
        &self.inner.catalog
    }
}
