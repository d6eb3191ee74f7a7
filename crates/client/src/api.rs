//! API access for the storefront context.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use url::Url;

use greencart_core::{
    CartItems, CartRevision, Envelope, Product, User,
    envelope::payload::{CartPayload, Empty, ProductsPayload, UserPayload},
};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::token::TokenStore;

/// The endpoints the storefront context needs.
#[async_trait]
pub trait Backend: Send + Sync {
    /// The logged-in shopper, cart included.
    async fn fetch_user(&self) -> Result<User, ClientError>;

    /// Succeeds if the caller is logged in as a seller.
    async fn seller_is_auth(&self) -> Result<(), ClientError>;

    async fn list_products(&self) -> Result<Vec<Product>, ClientError>;

    async fn login(&self, email: &str, password: &str) -> Result<User, ClientError>;

    async fn register(&self, name: &str, email: &str, password: &str)
    -> Result<User, ClientError>;

    async fn logout(&self) -> Result<(), ClientError>;

    /// Push the whole cart; returns the revision the server now holds.
    async fn update_cart(
        &self,
        cart: &CartItems,
        revision: CartRevision,
    ) -> Result<CartRevision, ClientError>;
}

/// [`Backend`] over HTTP with a cookie jar and bearer token.
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
    tokens: Arc<TokenStore>,
}

impl HttpBackend {
    /// Build a backend from configuration, opening the token file if set.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the token file
    /// cannot be read.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let tokens = match &config.token_path {
            Some(path) => TokenStore::open(path.clone())?,
            None => TokenStore::in_memory(),
        };
        Self::with_tokens(config.api_url.clone(), Arc::new(tokens))
    }

    /// Build a backend sharing an existing token store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_tokens(base: Url, tokens: Arc<TokenStore>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base,
            tokens,
        })
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let request = self.client.get(self.url(path)?);
        self.send(request).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let request = self.client.post(self.url(path)?).json(body);
        self.send(request).await
    }

    /// Attach the bearer token, send, and unwrap the envelope.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let request = match self.tokens.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        // Rate-limited requests carry a failure envelope on their 429.
        let response = if response.status() == StatusCode::TOO_MANY_REQUESTS {
            response
        } else {
            response.error_for_status()?
        };
        let envelope: Envelope<T> = response.json().await?;
        envelope.into_result().map_err(ClientError::Api)
    }

    fn remember(&self, payload: UserPayload) -> Result<User, ClientError> {
        if let Some(token) = payload.token.as_deref() {
            self.tokens.set(token)?;
        }
        Ok(payload.user)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch_user(&self) -> Result<User, ClientError> {
        let payload: UserPayload = self.get("/api/user/is-auth").await?;
        Ok(payload.user)
    }

    async fn seller_is_auth(&self) -> Result<(), ClientError> {
        let _: Empty = self.get("/api/seller/is-auth").await?;
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>, ClientError> {
        let payload: ProductsPayload = self.get("/api/product/list").await?;
        Ok(payload.products)
    }

    async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let payload: UserPayload = self
            .post(
                "/api/user/login",
                &json!({ "email": email, "password": password }),
            )
            .await?;
        self.remember(payload)
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ClientError> {
        let payload: UserPayload = self
            .post(
                "/api/user/register",
                &json!({ "name": name, "email": email, "password": password }),
            )
            .await?;
        self.remember(payload)
    }

    async fn logout(&self) -> Result<(), ClientError> {
        let result = self.get::<Empty>("/api/user/logout").await;
        // Forget the token even if the server could not be reached.
        self.tokens.clear()?;
        result.map(|_| ())
    }

    async fn update_cart(
        &self,
        cart: &CartItems,
        revision: CartRevision,
    ) -> Result<CartRevision, ClientError> {
        let payload: CartPayload = self
            .post(
                "/api/cart/update",
                &json!({ "cartItems": cart, "revision": revision }),
            )
            .await?;
        Ok(payload.revision)
    }
}
