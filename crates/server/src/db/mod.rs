//! Database access for the GreenCart API.
//!
//! # Tables
//!
//! - `users` - Shoppers and sellers, with the cart stored inline as JSONB
//! - `products` - Catalog
//! - `addresses` - Delivery addresses owned by users
//! - `orders` - Placed orders with their line items as JSONB
//! - `tower_sessions.session` - Session storage (created by `PostgresStore::migrate`)
//!
//! # Repositories
//!
//! Handlers talk to the database through the repository traits below, bundled
//! in [`Repositories`]. `PostgreSQL` implementations live in the per-table
//! modules; [`memory`] holds an in-process implementation used by the router
//! tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p greencart-cli -- migrate
//! ```

pub mod addresses;
pub mod memory;
pub mod orders;
pub mod products;
pub mod users;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use greencart_core::{
    Address, AddressId, CartItems, CartRevision, Email, NewProduct, Order, OrderId, OrderItem,
    OrderStatus, PaymentType, Price, Product, ProductId, User, UserId, ValidAddress,
};

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

// =============================================================================
// Ports
// =============================================================================

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub is_seller: bool,
}

/// Outcome of a cart write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartWrite {
    /// The cart was stored; the stored revision is now this one.
    Applied(CartRevision),
    /// The write carried a revision that is not newer than the stored one,
    /// which is returned unchanged.
    Stale(CartRevision),
}

/// Input for creating an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub amount: Price,
    pub address_id: AddressId,
    pub payment_type: PaymentType,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user. Returns `Conflict` if the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// The user with `email` together with their password hash.
    async fn get_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Replace the cart.
    ///
    /// With a revision, the write only applies when it is newer than the
    /// stored revision, which then becomes the stored one. Without a revision
    /// the write always applies and the stored revision is left as is.
    async fn update_cart(
        &self,
        id: UserId,
        cart: &CartItems,
        revision: Option<CartRevision>,
    ) -> Result<CartWrite, RepositoryError>;

    /// Empty the cart, keeping its revision.
    async fn clear_cart(&self, id: UserId) -> Result<(), RepositoryError>;

    /// Grant or revoke the seller flag. Returns `NotFound` for an unknown email.
    async fn set_seller(&self, email: &Email, is_seller: bool) -> Result<User, RepositoryError>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    /// Every product, newest first.
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Products with the given ids; missing ids are skipped.
    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    /// Which of `ids` exist.
    async fn existing_ids(&self, ids: &[ProductId]) -> Result<HashSet<ProductId>, RepositoryError>;

    /// Replace the editable fields. Returns `NotFound` for an unknown id.
    async fn update(&self, id: ProductId, product: NewProduct) -> Result<Product, RepositoryError>;

    async fn set_stock(&self, id: ProductId, in_stock: bool) -> Result<Product, RepositoryError>;

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait AddressRepository: Send + Sync {
    async fn create(&self, user_id: UserId, address: ValidAddress)
    -> Result<Address, RepositoryError>;

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError>;

    async fn get(&self, id: AddressId) -> Result<Option<Address>, RepositoryError>;

    async fn get_many(&self, ids: &[AddressId]) -> Result<Vec<Address>, RepositoryError>;

    /// Delete one of `user_id`'s addresses. Returns `NotFound` if the address
    /// does not exist or belongs to someone else.
    async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError>;

    /// Listed orders (cash on delivery, or paid), newest first, optionally
    /// restricted to one user.
    async fn list_listed(&self, user_id: Option<UserId>) -> Result<Vec<Order>, RepositoryError>;

    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, RepositoryError>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Round-trip to the store.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Every repository the handlers use.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub addresses: Arc<dyn AddressRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub health: Arc<dyn HealthCheck>,
}

impl Repositories {
    /// `PostgreSQL`-backed repositories sharing one pool.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(users::PgUserRepository::new(pool.clone())),
            products: Arc::new(products::PgProductRepository::new(pool.clone())),
            addresses: Arc::new(addresses::PgAddressRepository::new(pool.clone())),
            orders: Arc::new(orders::PgOrderRepository::new(pool.clone())),
            health: Arc::new(PgHealth(pool)),
        }
    }

    /// In-process repositories, empty.
    #[must_use]
    pub fn in_memory() -> Self {
        let store = memory::MemoryStore::default();
        Self {
            users: Arc::new(store.clone()),
            products: Arc::new(store.clone()),
            addresses: Arc::new(store.clone()),
            orders: Arc::new(store.clone()),
            health: Arc::new(store),
        }
    }
}

struct PgHealth(PgPool);

#[async_trait]
impl HealthCheck for PgHealth {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.0).await?;
        Ok(())
    }
}
