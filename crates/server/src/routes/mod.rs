//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! # Shoppers
//! POST   /api/user/register     - Create account, returns token
//! POST   /api/user/login        - Log in, returns token (rate limited)
//! GET    /api/user/is-auth      - Current user with cart
//! GET    /api/user/logout       - Clear session
//!
//! # Sellers
//! POST   /api/seller/login      - Seller log in, returns token (rate limited)
//! GET    /api/seller/is-auth    - Seller check
//! GET    /api/seller/logout     - Clear seller session
//!
//! # Products
//! POST   /api/product/add       - Multipart productData + images (seller)
//! GET    /api/product/list      - All products, newest first
//! GET    /api/product/{id}      - One product
//! PUT    /api/product/{id}      - Replace product fields (seller)
//! DELETE /api/product/{id}      - Delete product (seller)
//! POST   /api/product/stock     - Set in-stock flag (seller)
//!
//! # Cart, addresses, orders (shopper unless noted)
//! POST   /api/cart/update       - Store cart mapping
//! POST   /api/address/add       - Add address
//! GET    /api/address/get       - List addresses
//! DELETE /api/address/{id}      - Delete address
//! POST   /api/order/cod         - Place cash-on-delivery order
//! GET    /api/order/user        - Caller's orders
//! GET    /api/order/seller      - All orders (seller)
//! POST   /api/order/status      - Set order status (seller)
//! ```

pub mod address;
pub mod cart;
pub mod json;
pub mod order;
pub mod product;
pub mod seller;
pub mod user;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::map_response,
    routing::{delete, get, post},
};

use crate::middleware::{auth_rate_limiter, rate_limited_envelope};
use crate::state::AppState;

/// Multipart body limit for product uploads: every image plus the JSON.
const PRODUCT_UPLOAD_LIMIT: usize = product::MAX_IMAGES * product::MAX_IMAGE_BYTES + 64 * 1024;

/// Create the shopper account routes router.
pub fn user_routes() -> Router<AppState> {
    let credentials = Router::new()
        .route("/register", post(user::register))
        .route("/login", post(user::login))
        .layer(auth_rate_limiter())
        .layer(map_response(rate_limited_envelope));

    Router::new()
        .merge(credentials)
        .route("/is-auth", get(user::is_auth))
        .route("/logout", get(user::logout))
}

/// Create the seller routes router.
pub fn seller_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            post(seller::login)
                .layer(auth_rate_limiter())
                .layer(map_response(rate_limited_envelope)),
        )
        .route("/is-auth", get(seller::is_auth))
        .route("/logout", get(seller::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/add",
            post(product::add).layer(DefaultBodyLimit::max(PRODUCT_UPLOAD_LIMIT)),
        )
        .route("/list", get(product::list))
        .route("/stock", post(product::change_stock))
        .route(
            "/{id}",
            get(product::get)
                .put(product::update)
                .delete(product::delete),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new().route("/update", post(cart::update))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(address::add))
        .route("/get", get(address::list))
        .route("/{id}", delete(address::delete))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/cod", post(order::place_cod))
        .route("/user", get(order::user_orders))
        .route("/seller", get(order::seller_orders))
        .route("/status", post(order::update_status))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/user", user_routes())
        .nest("/api/seller", seller_routes())
        .nest("/api/product", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/address", address_routes())
        .nest("/api/order", order_routes())
}
