//! Shared storefront state.
//!
//! One [`StoreContext`] is created per client session and cloned into every
//! view. Cart mutations apply locally at once; when a shopper is logged in
//! the whole cart is then pushed to the server on a spawned task.
//!
//! Each mutation bumps the cart revision and the push carries it, so the
//! server ignores pushes that arrive out of order and the context ignores
//! answers for anything but its latest mutation.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use greencart_core::{
    CartItems, CartRevision, Price, Product, ProductId, User,
    catalog::{self, sample_products},
};

use crate::api::Backend;
use crate::error::ClientError;

/// Notifications buffered for slow subscribers.
const NOTIFICATION_CAPACITY: usize = 32;

/// Pushes per sync task before giving up on a server that keeps moving ahead.
const MAX_SYNC_ATTEMPTS: usize = 3;

/// A transient message for the shopper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
    Info(String),
}

#[derive(Debug, Default)]
struct State {
    user: Option<User>,
    is_seller: bool,
    show_user_login: bool,
    products: Vec<Product>,
    cart: CartItems,
    cart_revision: CartRevision,
    /// Latest revision the server confirmed.
    synced_revision: Option<CartRevision>,
    search_query: String,
}

struct Inner {
    backend: Arc<dyn Backend>,
    state: RwLock<State>,
    notifications: broadcast::Sender<Notification>,
}

/// The storefront's shared state.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct StoreContext {
    inner: Arc<Inner>,
}

impl StoreContext {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                backend,
                state: RwLock::new(State::default()),
                notifications,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, notification: Notification) {
        // No subscribers is fine.
        let _ = self.inner.notifications.send(notification);
    }

    /// Receive transient notifications (toasts).
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifications.subscribe()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    #[must_use]
    pub fn is_seller(&self) -> bool {
        self.read().is_seller
    }

    #[must_use]
    pub fn show_user_login(&self) -> bool {
        self.read().show_user_login
    }

    pub fn set_show_user_login(&self, show: bool) {
        self.write().show_user_login = show;
    }

    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.read().products.clone()
    }

    #[must_use]
    pub fn cart(&self) -> CartItems {
        self.read().cart.clone()
    }

    #[must_use]
    pub fn cart_revision(&self) -> CartRevision {
        self.read().cart_revision
    }

    /// Latest cart revision the server acknowledged, if any this session.
    #[must_use]
    pub fn synced_revision(&self) -> Option<CartRevision> {
        self.read().synced_revision
    }

    #[must_use]
    pub fn search_query(&self) -> String {
        self.read().search_query.clone()
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        self.write().search_query = query.into();
    }

    /// In-stock products matching the search query.
    #[must_use]
    pub fn listing(&self) -> Vec<Product> {
        let state = self.read();
        catalog::listing(&state.products, &state.search_query)
            .into_iter()
            .cloned()
            .collect()
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add one of `id` to the cart.
    pub fn add_to_cart(&self, id: ProductId) -> Option<JoinHandle<()>> {
        self.notify(Notification::Success("Added to cart".to_owned()));
        self.mutate_cart(|cart| cart.add(id))
    }

    /// Set the quantity of `id`; zero removes it.
    pub fn update_cart_item(&self, id: ProductId, quantity: u32) -> Option<JoinHandle<()>> {
        self.notify(Notification::Success("Cart updated".to_owned()));
        self.mutate_cart(|cart| cart.set(id, quantity))
    }

    /// Remove one of `id`. Does nothing if it is not in the cart.
    pub fn remove_from_cart(&self, id: ProductId) -> Option<JoinHandle<()>> {
        if self.read().cart.quantity(id) == 0 {
            return None;
        }
        self.notify(Notification::Success("Removed from cart".to_owned()));
        self.mutate_cart(|cart| {
            cart.remove_one(id);
        })
    }

    /// Replace the whole cart, e.g. with the server's after an order.
    pub fn set_cart_items(&self, cart: CartItems) -> Option<JoinHandle<()>> {
        self.mutate_cart(|current| *current = cart)
    }

    /// Empty the cart.
    pub fn clear_cart(&self) -> Option<JoinHandle<()>> {
        self.set_cart_items(CartItems::new())
    }

    /// Total number of items in the cart.
    #[must_use]
    pub fn cart_count(&self) -> u64 {
        self.read().cart.count()
    }

    /// Cart total at offer prices, falling back to list prices.
    #[must_use]
    pub fn total_cart_amount(&self) -> Price {
        let state = self.read();
        state.cart.total_amount(&state.products)
    }

    /// Apply `change` and push the cart if a shopper is logged in.
    ///
    /// Returns the sync task, if one was started.
    fn mutate_cart(&self, change: impl FnOnce(&mut CartItems)) -> Option<JoinHandle<()>> {
        let (cart, revision, logged_in) = {
            let mut state = self.write();
            change(&mut state.cart);
            state.cart_revision = state.cart_revision.next();
            (state.cart.clone(), state.cart_revision, state.user.is_some())
        };

        if logged_in {
            self.spawn_sync(cart, revision)
        } else {
            None
        }
    }

    fn spawn_sync(&self, cart: CartItems, revision: CartRevision) -> Option<JoinHandle<()>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime; cart not synced");
            return None;
        };

        let this = self.clone();
        Some(runtime.spawn(async move { this.sync(cart, revision).await }))
    }

    /// Push `cart` at `revision`, re-pushing while the server is ahead of us.
    async fn sync(&self, mut cart: CartItems, mut revision: CartRevision) {
        for _ in 0..MAX_SYNC_ATTEMPTS {
            let result = self.inner.backend.update_cart(&cart, revision).await;
            match self.finish_sync(revision, result) {
                Some((next_cart, next_revision)) => {
                    cart = next_cart;
                    revision = next_revision;
                }
                None => return,
            }
        }

        tracing::warn!(revision = revision.get(), "Cart sync gave up; server keeps moving ahead");
        self.notify(Notification::Error("Cart sync failed".to_owned()));
    }

    /// Record the server's answer for the push at `sent`.
    ///
    /// Returns the cart and revision to push again when the server holds a
    /// newer revision than `sent` (another device wrote the cart). The local
    /// cart wins and is re-sent above the server's revision.
    fn finish_sync(
        &self,
        sent: CartRevision,
        result: Result<CartRevision, ClientError>,
    ) -> Option<(CartItems, CartRevision)> {
        let mut state = self.write();
        if sent < state.cart_revision {
            tracing::debug!(
                sent = sent.get(),
                latest = state.cart_revision.get(),
                "Discarding superseded cart sync"
            );
            return None;
        }

        match result {
            Ok(stored) if stored > sent && state.user.is_some() => {
                state.synced_revision = Some(stored);
                state.cart_revision = stored.next();
                let retry = (state.cart.clone(), state.cart_revision);
                drop(state);

                tracing::info!(
                    sent = sent.get(),
                    stored = stored.get(),
                    "Server holds a newer cart; re-sending this one"
                );
                self.notify(Notification::Info(
                    "Cart was changed on another device; keeping this cart".to_owned(),
                ));
                Some(retry)
            }
            Ok(stored) => {
                state.synced_revision = Some(stored);
                None
            }
            Err(e) => {
                drop(state);
                tracing::warn!(error = %e, "Cart sync failed");
                let message = if e.is_api() {
                    e.to_string()
                } else {
                    "Cart sync failed".to_owned()
                };
                self.notify(Notification::Error(message));
                None
            }
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Fetch seller status, user and products concurrently.
    pub async fn load(&self) {
        tokio::join!(self.fetch_seller(), self.fetch_user(), self.fetch_products());
    }

    /// Refresh the shopper and their saved cart.
    ///
    /// A rejected session simply means nobody is logged in; only an
    /// unreachable server is reported.
    pub async fn fetch_user(&self) {
        match self.inner.backend.fetch_user().await {
            Ok(user) => self.adopt_user(user),
            Err(e) => {
                self.write().user = None;
                if e.is_api() {
                    tracing::debug!(error = %e, "No user session");
                } else {
                    tracing::warn!(error = %e, "User fetch failed");
                    self.notify(Notification::Error("User fetch error".to_owned()));
                }
            }
        }
    }

    pub async fn fetch_seller(&self) {
        let is_seller = self.inner.backend.seller_is_auth().await.is_ok();
        self.write().is_seller = is_seller;
    }

    /// Refresh the catalog, falling back to the sample catalog when the API
    /// fails or has no products.
    pub async fn fetch_products(&self) {
        let fallback = match self.inner.backend.list_products().await {
            Ok(products) if !products.is_empty() => {
                self.write().products = products;
                return;
            }
            Ok(_) => Notification::Info("Using sample products (no products found)".to_owned()),
            Err(e) => {
                tracing::warn!(error = %e, "Product fetch failed");
                Notification::Error("Failed to fetch products. Using sample data.".to_owned())
            }
        };

        self.write().products = sample_products();
        self.notify(fallback);
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Log in and adopt the shopper's saved cart.
    ///
    /// # Errors
    ///
    /// Returns the backend error, after notifying it.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let result = self.inner.backend.login(email, password).await;
        self.finish_login(result)
    }

    /// Create an account and log in.
    ///
    /// # Errors
    ///
    /// Returns the backend error, after notifying it.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ClientError> {
        let result = self.inner.backend.register(name, email, password).await;
        self.finish_login(result)
    }

    fn finish_login(&self, result: Result<User, ClientError>) -> Result<User, ClientError> {
        match result {
            Ok(user) => {
                self.adopt_user(user.clone());
                self.write().show_user_login = false;
                self.notify(Notification::Success(format!("Welcome, {}", user.name)));
                Ok(user)
            }
            Err(e) => {
                self.notify(Notification::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Log out and drop the shopper's cart from local state.
    ///
    /// # Errors
    ///
    /// Returns the backend error; local state is cleared regardless.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self.inner.backend.logout().await;
        {
            let mut state = self.write();
            state.user = None;
            state.cart = CartItems::new();
            state.cart_revision = CartRevision::default();
            state.synced_revision = None;
        }
        match &result {
            Ok(()) => self.notify(Notification::Success("Logged out".to_owned())),
            Err(e) => self.notify(Notification::Error(e.to_string())),
        }
        result
    }

    /// Take the server's view of the user, cart and revision included.
    fn adopt_user(&self, user: User) {
        let mut state = self.write();
        state.cart = user.cart.clone();
        state.cart_revision = user.cart_revision;
        state.synced_revision = Some(user.cart_revision);
        state.user = Some(user);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use greencart_core::{Email, UserId};

    use super::*;

    #[derive(Default)]
    struct FakeBackend {
        user: Mutex<Option<User>>,
        products: Vec<Product>,
        fail_products: bool,
        pushes: Mutex<Vec<(CartItems, CartRevision)>>,
        /// Revision the fake server has stored; writes must beat it.
        server_revision: Mutex<CartRevision>,
    }

    fn shopper() -> User {
        let mut cart = CartItems::new();
        cart.add(ProductId::new(1));
        User {
            id: UserId::new(7),
            name: "Asha".to_owned(),
            email: Email::parse("asha@example.com").unwrap(),
            is_seller: false,
            cart,
            cart_revision: CartRevision::new(4),
            created_at: Utc::now(),
        }
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn fetch_user(&self) -> Result<User, ClientError> {
            self.user
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ClientError::Api("Not authorized".to_owned()))
        }

        async fn seller_is_auth(&self) -> Result<(), ClientError> {
            Err(ClientError::Api("Not authorized".to_owned()))
        }

        async fn list_products(&self) -> Result<Vec<Product>, ClientError> {
            if self.fail_products {
                return Err(ClientError::Config("test".to_owned(), "offline".to_owned()));
            }
            Ok(self.products.clone())
        }

        async fn login(&self, email: &str, _password: &str) -> Result<User, ClientError> {
            let user = shopper();
            if user.email.as_str() != email {
                return Err(ClientError::Api("Invalid email or password".to_owned()));
            }
            *self.user.lock().unwrap() = Some(user.clone());
            Ok(user)
        }

        async fn register(
            &self,
            _name: &str,
            _email: &str,
            _password: &str,
        ) -> Result<User, ClientError> {
            Err(ClientError::Api("User already exists".to_owned()))
        }

        async fn logout(&self) -> Result<(), ClientError> {
            *self.user.lock().unwrap() = None;
            Ok(())
        }

        async fn update_cart(
            &self,
            cart: &CartItems,
            revision: CartRevision,
        ) -> Result<CartRevision, ClientError> {
            self.pushes.lock().unwrap().push((cart.clone(), revision));
            let mut stored = self.server_revision.lock().unwrap();
            if revision > *stored {
                *stored = revision;
            }
            Ok(*stored)
        }
    }

    fn context(backend: FakeBackend) -> (StoreContext, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        (StoreContext::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn test_cart_mutations_without_user_stay_local() {
        let (store, backend) = context(FakeBackend::default());
        let apple = ProductId::new(1);

        assert!(store.add_to_cart(apple).is_none());
        store.add_to_cart(apple);
        assert_eq!(store.cart_count(), 2);

        store.remove_from_cart(apple);
        store.remove_from_cart(apple);
        assert_eq!(store.cart_count(), 0);
        assert!(store.cart().is_empty());
        assert!(store.remove_from_cart(apple).is_none());

        store.update_cart_item(apple, 5);
        store.update_cart_item(apple, 0);
        assert!(store.cart().is_empty());
        assert!(backend.pushes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logged_in_mutations_push_with_increasing_revisions() {
        let (store, backend) = context(FakeBackend {
            user: Mutex::new(Some(shopper())),
            ..FakeBackend::default()
        });
        store.fetch_user().await;
        assert_eq!(store.cart_revision(), CartRevision::new(4));

        store.add_to_cart(ProductId::new(2)).unwrap().await.unwrap();
        store.update_cart_item(ProductId::new(1), 3).unwrap().await.unwrap();

        let pushes = backend.pushes.lock().unwrap().clone();
        assert_eq!(pushes.len(), 2);
        assert_eq!(pushes[0].1, CartRevision::new(5));
        assert_eq!(pushes[1].1, CartRevision::new(6));
        assert_eq!(pushes[1].0.quantity(ProductId::new(1)), 3);
        assert_eq!(store.synced_revision(), Some(CartRevision::new(6)));
    }

    #[tokio::test]
    async fn test_superseded_sync_result_is_ignored() {
        let (store, _) = context(FakeBackend::default());
        store.adopt_user(shopper());
        {
            let mut state = store.write();
            state.cart_revision = CartRevision::new(9);
        }
        let mut notifications = store.subscribe();

        let retry = store.finish_sync(
            CartRevision::new(8),
            Err(ClientError::Api("boom".to_owned())),
        );
        assert!(retry.is_none());
        assert!(notifications.try_recv().is_err());
        assert_eq!(store.synced_revision(), Some(CartRevision::new(4)));

        assert!(store.finish_sync(CartRevision::new(9), Ok(CartRevision::new(9))).is_none());
        assert_eq!(store.synced_revision(), Some(CartRevision::new(9)));
    }

    #[tokio::test]
    async fn test_server_ahead_of_client_gets_local_cart_resent() {
        let (store, backend) = context(FakeBackend {
            user: Mutex::new(Some(shopper())),
            server_revision: Mutex::new(CartRevision::new(10)),
            ..FakeBackend::default()
        });
        store.fetch_user().await;
        assert_eq!(store.cart_revision(), CartRevision::new(4));
        let mut notifications = store.subscribe();

        store.add_to_cart(ProductId::new(2)).unwrap().await.unwrap();

        let pushes = backend.pushes.lock().unwrap().clone();
        let revisions: Vec<u64> = pushes.iter().map(|(_, rev)| rev.get()).collect();
        assert_eq!(revisions, vec![5, 11]);
        assert_eq!(pushes[1].0.quantity(ProductId::new(2)), 1);
        assert_eq!(store.cart_revision(), CartRevision::new(11));
        assert_eq!(store.synced_revision(), Some(CartRevision::new(11)));

        assert_eq!(
            notifications.try_recv().unwrap(),
            Notification::Success("Added to cart".to_owned())
        );
        assert!(matches!(notifications.try_recv().unwrap(), Notification::Info(_)));

        // Later mutations land without another round trip.
        store.add_to_cart(ProductId::new(2)).unwrap().await.unwrap();
        assert_eq!(backend.pushes.lock().unwrap().last().unwrap().1, CartRevision::new(12));
        assert_eq!(store.synced_revision(), Some(CartRevision::new(12)));
    }

    #[tokio::test]
    async fn test_clear_cart_bumps_revision_and_syncs() {
        let (store, backend) = context(FakeBackend {
            user: Mutex::new(Some(shopper())),
            ..FakeBackend::default()
        });
        store.fetch_user().await;
        assert_eq!(store.cart_count(), 1);

        store.clear_cart().unwrap().await.unwrap();
        assert!(store.cart().is_empty());
        assert_eq!(store.cart_revision(), CartRevision::new(5));

        let (pushed, revision) = backend.pushes.lock().unwrap().last().cloned().unwrap();
        assert!(pushed.is_empty());
        assert_eq!(revision, CartRevision::new(5));

        // A later mutation starts from the cleared cart.
        store.add_to_cart(ProductId::new(3)).unwrap().await.unwrap();
        let (pushed, _) = backend.pushes.lock().unwrap().last().cloned().unwrap();
        assert_eq!(pushed.quantity(ProductId::new(1)), 0);
        assert_eq!(pushed.quantity(ProductId::new(3)), 1);

        let mut replacement = CartItems::new();
        replacement.set(ProductId::new(4), 2);
        store.set_cart_items(replacement.clone()).unwrap().await.unwrap();
        assert_eq!(store.cart(), replacement);
    }

    #[tokio::test]
    async fn test_fetch_products_falls_back_to_samples() {
        let (store, _) = context(FakeBackend {
            fail_products: true,
            ..FakeBackend::default()
        });
        let mut notifications = store.subscribe();

        store.fetch_products().await;
        assert_eq!(store.products(), sample_products());
        assert!(matches!(notifications.try_recv().unwrap(), Notification::Error(_)));

        let (store, _) = context(FakeBackend::default());
        store.fetch_products().await;
        assert_eq!(store.products().len(), sample_products().len());
    }

    #[tokio::test]
    async fn test_listing_and_total_use_catalog() {
        let (store, _) = context(FakeBackend::default());
        store.fetch_products().await;

        let tomato = store
            .products()
            .into_iter()
            .find(|p| p.name.starts_with("Tomato"))
            .unwrap();
        store.add_to_cart(tomato.id);
        store.add_to_cart(tomato.id);
        assert_eq!(store.total_cart_amount(), tomato.effective_price() * 2);

        store.set_search_query("TOMATO");
        let listing = store.listing();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].id, tomato.id);

        store.set_search_query("spinach");
        assert!(store.listing().is_empty(), "out-of-stock products are hidden");
    }

    #[tokio::test]
    async fn test_load_without_session() {
        let (store, _) = context(FakeBackend::default());
        store.load().await;
        assert!(store.user().is_none());
        assert!(!store.is_seller());
        assert!(!store.products().is_empty());
    }

    #[tokio::test]
    async fn test_login_adopts_cart_and_logout_clears_it() {
        let (store, _) = context(FakeBackend::default());
        store.set_show_user_login(true);

        assert!(store.login("nobody@example.com", "x").await.is_err());
        assert!(store.register("A", "asha@example.com", "s3cure-pass").await.is_err());
        assert!(store.user().is_none());

        let user = store.login("asha@example.com", "s3cure-pass").await.unwrap();
        assert_eq!(store.user(), Some(user));
        assert!(!store.show_user_login());
        assert_eq!(store.cart_count(), 1);

        store.logout().await.unwrap();
        assert!(store.user().is_none());
        assert_eq!(store.cart_count(), 0);
        assert_eq!(store.cart_revision(), CartRevision::default());
    }
}
