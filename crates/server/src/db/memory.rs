//! In-process repositories.
//!
//! Mirrors the `PostgreSQL` behavior closely enough for router tests: unique
//! emails, newest-first listings, conditional cart writes.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use greencart_core::{
    Address, AddressId, CartItems, CartRevision, Email, NewProduct, Order, OrderId, OrderStatus,
    Product, ProductId, User, UserId, ValidAddress,
};

use super::{
    AddressRepository, CartWrite, HealthCheck, NewOrder, NewUser, OrderRepository,
    ProductRepository, RepositoryError, UserRepository,
};

#[derive(Default)]
struct Tables {
    next_id: i32,
    users: BTreeMap<UserId, (User, String)>,
    products: BTreeMap<ProductId, Product>,
    addresses: BTreeMap<AddressId, Address>,
    orders: BTreeMap<OrderId, Order>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared in-memory tables; clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::DataCorruption("memory store lock poisoned".to_owned()))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|(u, _)| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let id = UserId::new(tables.next_id());
        let created = User {
            id,
            name: user.name,
            email: user.email,
            is_seller: user.is_seller,
            cart: CartItems::new(),
            cart_revision: CartRevision::default(),
            created_at: Utc::now(),
        };
        tables.users.insert(id, (created.clone(), user.password_hash));
        Ok(created)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock()?.users.get(&id).map(|(u, _)| u.clone()))
    }

    async fn get_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|(u, _)| &u.email == email)
            .cloned())
    }

    async fn update_cart(
        &self,
        id: UserId,
        cart: &CartItems,
        revision: Option<CartRevision>,
    ) -> Result<CartWrite, RepositoryError> {
        let mut tables = self.lock()?;
        let (user, _) = tables.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;

        match revision {
            Some(revision) if revision <= user.cart_revision => {
                Ok(CartWrite::Stale(user.cart_revision))
            }
            Some(revision) => {
                user.cart = cart.clone();
                user.cart_revision = revision;
                Ok(CartWrite::Applied(revision))
            }
            None => {
                user.cart = cart.clone();
                Ok(CartWrite::Applied(user.cart_revision))
            }
        }
    }

    async fn clear_cart(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        let (user, _) = tables.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        user.cart = CartItems::new();
        Ok(())
    }

    async fn set_seller(&self, email: &Email, is_seller: bool) -> Result<User, RepositoryError> {
        let mut tables = self.lock()?;
        let (user, _) = tables
            .users
            .values_mut()
            .find(|(u, _)| &u.email == email)
            .ok_or(RepositoryError::NotFound)?;
        user.is_seller = is_seller;
        Ok(user.clone())
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.lock()?;
        let id = ProductId::new(tables.next_id());
        let now = Utc::now();
        let created = Product {
            id,
            name: product.name,
            description: product.description,
            category: product.category,
            price: product.price,
            offer_price: product.offer_price,
            in_stock: product.in_stock,
            rating: product.rating,
            images: product.images,
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(id, created.clone());
        Ok(created)
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        // Ids are handed out in creation order.
        Ok(self.lock()?.products.values().rev().cloned().collect())
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.lock()?.products.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| tables.products.get(id).cloned())
            .collect())
    }

    async fn existing_ids(&self, ids: &[ProductId]) -> Result<HashSet<ProductId>, RepositoryError> {
        let tables = self.lock()?;
        Ok(ids
            .iter()
            .filter(|id| tables.products.contains_key(id))
            .copied()
            .collect())
    }

    async fn update(&self, id: ProductId, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.lock()?;
        let existing = tables.products.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        existing.name = product.name;
        existing.description = product.description;
        existing.category = product.category;
        existing.price = product.price;
        existing.offer_price = product.offer_price;
        existing.in_stock = product.in_stock;
        existing.rating = product.rating;
        existing.images = product.images;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn set_stock(&self, id: ProductId, in_stock: bool) -> Result<Product, RepositoryError> {
        let mut tables = self.lock()?;
        let existing = tables.products.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        existing.in_stock = in_stock;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        self.lock()?
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl AddressRepository for MemoryStore {
    async fn create(
        &self,
        user_id: UserId,
        address: ValidAddress,
    ) -> Result<Address, RepositoryError> {
        let mut tables = self.lock()?;
        let id = AddressId::new(tables.next_id());
        let created = Address {
            id,
            user_id,
            first_name: address.first_name,
            last_name: address.last_name,
            email: address.email,
            street: address.street,
            city: address.city,
            state: address.state,
            zipcode: address.zipcode,
            country: address.country,
            phone: address.phone,
        };
        tables.addresses.insert(id, created.clone());
        Ok(created)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        Ok(self
            .lock()?
            .addresses
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        Ok(self.lock()?.addresses.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[AddressId]) -> Result<Vec<Address>, RepositoryError> {
        let tables = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| tables.addresses.get(id).cloned())
            .collect())
    }

    async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        match tables.addresses.get(&id) {
            Some(address) if address.user_id == user_id => {
                tables.addresses.remove(&id);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tables = self.lock()?;
        let id = OrderId::new(tables.next_id());
        let now = Utc::now();
        let created = Order {
            id,
            user_id: order.user_id,
            items: order.items,
            amount: order.amount,
            address_id: order.address_id,
            status: OrderStatus::default(),
            payment_type: order.payment_type,
            is_paid: false,
            created_at: now,
            updated_at: now,
        };
        tables.orders.insert(id, created.clone());
        Ok(created)
    }

    async fn list_listed(&self, user_id: Option<UserId>) -> Result<Vec<Order>, RepositoryError> {
        Ok(self
            .lock()?
            .orders
            .values()
            .rev()
            .filter(|o| user_id.is_none_or(|id| o.user_id == id) && o.is_listed())
            .cloned()
            .collect())
    }

    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, RepositoryError> {
        let mut tables = self.lock()?;
        let order = tables.orders.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.lock().map(|_| ())
    }
}
