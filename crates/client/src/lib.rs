//! GreenCart storefront client.
//!
//! [`StoreContext`] is the state every storefront view shares: the session,
//! the seller flag, the catalog, the cart and the search query. It talks to
//! the API through a [`Backend`], normally [`HttpBackend`].
//!
//! ```rust,ignore
//! let config = ClientConfig::from_env()?;
//! let store = StoreContext::new(Arc::new(HttpBackend::new(&config)?));
//! store.load().await;
//! store.add_to_cart(product_id);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod token;

pub use api::{Backend, HttpBackend};
pub use config::ClientConfig;
pub use context::{Notification, StoreContext};
pub use error::ClientError;
pub use token::TokenStore;
