//! Router tests over in-memory repositories, sessions and a temp upload dir.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use tower_sessions::MemoryStore as MemorySessionStore;
use url::Url;

use greencart_core::{Email, Price};

use crate::config::ServerConfig;
use crate::db::Repositories;
use crate::services::media::{LocalMediaStore, MediaStore};
use crate::state::AppState;

const BOUNDARY: &str = "greencart-test-boundary";

struct TestApp {
    router: Router,
    repos: Repositories,
    _uploads: TempDir,
}

fn test_config(uploads: &TempDir) -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 5000,
        public_url: Url::parse("http://localhost:5000").unwrap(),
        jwt_secret: SecretString::from("kT9#vL2qX8mW4zR7nB1cY6pH3sJ5dF0gA"),
        token_ttl: Duration::from_secs(3600),
        allowed_origins: vec!["http://localhost:5173".to_owned()],
        uploads_dir: uploads.path().to_path_buf(),
        cloudinary: None,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

impl TestApp {
    fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let config = test_config(&uploads);
        let repos = Repositories::in_memory();
        let media: Arc<dyn MediaStore> = Arc::new(LocalMediaStore::new(
            config.uploads_dir.clone(),
            config.public_url.clone(),
        ));
        let state = AppState::new(config, repos.clone(), media);

        Self {
            router: crate::app(state, MemorySessionStore::default()),
            repos,
            _uploads: uploads,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value, Option<String>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_owned);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body, cookie)
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Value {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let (status, body, _) = self.send(request).await;
        assert_eq!(status, StatusCode::OK, "unexpected status for {uri}: {body}");
        body
    }

    async fn register(&self, name: &str, email: &str) -> (i64, String) {
        let body = self
            .call(
                Method::POST,
                "/api/user/register",
                None,
                Some(json!({ "name": name, "email": email, "password": "s3cure-pass" })),
            )
            .await;
        assert_eq!(body["success"], true, "{body}");
        (
            body["user"]["id"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_owned(),
        )
    }

    async fn seller_token(&self) -> String {
        self.register("Sam Seller", "sam@example.com").await;
        let email = Email::parse("sam@example.com").unwrap();
        self.repos.users.set_seller(&email, true).await.unwrap();

        let body = self
            .call(
                Method::POST,
                "/api/seller/login",
                None,
                Some(json!({ "email": "sam@example.com", "password": "s3cure-pass" })),
            )
            .await;
        assert_eq!(body["success"], true, "{body}");
        body["token"].as_str().unwrap().to_owned()
    }

    async fn add_product(&self, token: &str, product: &Value) -> Value {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"productData\"\r\n\r\n{product}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"apple.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"\x89PNG\r\n\x1a\nfake-image");
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/product/add")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, body, _) = self.send(request).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }
}

fn apple() -> Value {
    json!({
        "name": "Apple",
        "description": ["Crisp", "Sweet"],
        "category": "Fruits",
        "price": "100.00",
        "offerPrice": "80.00",
    })
}

fn address() -> Value {
    json!({
        "address": {
            "firstName": "Asha",
            "lastName": "Rao",
            "email": "asha@example.com",
            "street": "1 Market St",
            "city": "Pune",
            "state": "MH",
            "zipcode": "411001",
            "country": "India",
            "phone": "+91 98765 43210",
        }
    })
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let request = Request::builder()
        .uri("/health/ready")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unauthenticated_access_returns_failure_envelope() {
    let app = TestApp::new();

    for (method, uri) in [
        (Method::GET, "/api/user/is-auth"),
        (Method::GET, "/api/seller/is-auth"),
        (Method::GET, "/api/address/get"),
        (Method::GET, "/api/order/user"),
        (Method::GET, "/api/order/seller"),
    ] {
        let body = app.call(method, uri, None, None).await;
        assert_eq!(body["success"], false, "{uri}");
        assert_eq!(body["message"], "Not authorized", "{uri}");
    }

    let body = app
        .call(
            Method::POST,
            "/api/product/stock",
            Some("not-a-token"),
            Some(json!({ "id": 1, "inStock": false })),
        )
        .await;
    assert_eq!(body["success"], false);
    assert!(body.get("product").is_none());
}

#[tokio::test]
async fn test_user_token_cannot_reach_seller_endpoints() {
    let app = TestApp::new();
    let (_, token) = app.register("Asha", "asha@example.com").await;

    let body = app.call(Method::GET, "/api/seller/is-auth", Some(&token), None).await;
    assert_eq!(body["success"], false);

    let body = app.call(Method::GET, "/api/user/is-auth", Some(&token), None).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], "asha@example.com");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_seller_session_survives_shopper_bearer_token() {
    let app = TestApp::new();
    let (_, shopper_token) = app.register("Asha", "asha@example.com").await;
    app.register("Sam Seller", "sam@example.com").await;
    let email = Email::parse("sam@example.com").unwrap();
    app.repos.users.set_seller(&email, true).await.unwrap();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/seller/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "sam@example.com", "password": "s3cure-pass" }).to_string(),
        ))
        .unwrap();
    let (_, body, cookie) = app.send(request).await;
    assert_eq!(body["success"], true, "{body}");
    let cookie = cookie.unwrap();

    let seller_check = |bearer: String| {
        Request::builder()
            .uri("/api/seller/is-auth")
            .header(header::COOKIE, &cookie)
            .header(header::AUTHORIZATION, bearer)
            .body(Body::empty())
            .unwrap()
    };

    // A valid token for the other role falls back to the session.
    let (_, body, _) = app.send(seller_check(format!("Bearer {shopper_token}"))).await;
    assert_eq!(body["success"], true, "{body}");

    // An invalid token is still rejected even with a good session.
    let (_, body, _) = app.send(seller_check("Bearer not-a-token".to_owned())).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Not authorized");
}

#[tokio::test]
async fn test_register_validation_and_duplicates() {
    let app = TestApp::new();
    app.register("Asha", "asha@example.com").await;

    let body = app
        .call(
            Method::POST,
            "/api/user/register",
            None,
            Some(json!({ "name": "Asha", "email": "ASHA@example.com", "password": "s3cure-pass" })),
        )
        .await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "User already exists");

    let body = app
        .call(
            Method::POST,
            "/api/user/register",
            None,
            Some(json!({ "email": "b@example.com", "password": "s3cure-pass" })),
        )
        .await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Missing details: name");

    let body = app
        .call(
            Method::POST,
            "/api/user/login",
            None,
            Some(json!({ "email": "asha@example.com", "password": "wrong-pass" })),
        )
        .await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_rate_limited_login_returns_failure_envelope() {
    let app = TestApp::new();

    let login = || {
        Request::builder()
            .method(Method::POST)
            .uri("/api/user/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "email": "nobody@example.com", "password": "wrong-pass" }).to_string(),
            ))
            .unwrap()
    };

    // Burst of 10, then limited.
    for _ in 0..10 {
        let (status, body, _) = app.send(login()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Invalid email or password");
    }

    let (status, body, _) = app.send(login()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Too many attempts, please try again later");
}

#[tokio::test]
async fn test_session_cookie_authenticates_after_login() {
    let app = TestApp::new();
    app.register("Asha", "asha@example.com").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/user/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "asha@example.com", "password": "s3cure-pass" }).to_string(),
        ))
        .unwrap();
    let (_, body, cookie) = app.send(request).await;
    assert_eq!(body["success"], true);
    let cookie = cookie.unwrap();
    assert!(cookie.starts_with("greencart_session="));

    let request = Request::builder()
        .uri("/api/user/is-auth")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (_, body, _) = app.send(request).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["name"], "Asha");

    let request = Request::builder()
        .uri("/api/user/logout")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (_, body, _) = app.send(request).await;
    assert_eq!(body["success"], true);

    let request = Request::builder()
        .uri("/api/user/is-auth")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (_, body, _) = app.send(request).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_created_product_appears_in_listing() {
    let app = TestApp::new();
    let seller = app.seller_token().await;

    // Prime the cache so the write has something to invalidate.
    let body = app.call(Method::GET, "/api/product/list", None, None).await;
    assert_eq!(body["products"].as_array().unwrap().len(), 0);

    let body = app.add_product(&seller, &apple()).await;
    assert_eq!(body["success"], true, "{body}");
    assert_eq!(body["message"], "Product added");
    let image = body["product"]["images"][0].as_str().unwrap();
    assert!(image.starts_with("http://localhost:5000/images/"));
    assert!(image.ends_with(".png"));

    let body = app.call(Method::GET, "/api/product/list", None, None).await;
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Apple");
    assert_eq!(products[0]["description"], json!(["Crisp", "Sweet"]));

    let id = products[0]["id"].as_i64().unwrap();
    let body = app
        .call(
            Method::POST,
            "/api/product/stock",
            Some(&seller),
            Some(json!({ "id": id, "inStock": false })),
        )
        .await;
    assert_eq!(body["success"], true);

    let body = app.call(Method::GET, &format!("/api/product/{id}"), None, None).await;
    assert_eq!(body["product"]["inStock"], false);
}

#[tokio::test]
async fn test_product_upload_rejects_non_images() {
    let app = TestApp::new();
    let seller = app.seller_token().await;

    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"productData\"\r\n\r\n{}\r\n\
         --{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"x.txt\"\r\nContent-Type: text/plain\r\n\r\nhello\r\n\
         --{BOUNDARY}--\r\n",
        apple()
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/product/add")
        .header(header::AUTHORIZATION, format!("Bearer {seller}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, body, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);

    let body = app.call(Method::GET, "/api/product/list", None, None).await;
    assert_eq!(body["products"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_cart_update_sanitizes_quantities() {
    let app = TestApp::new();
    let seller = app.seller_token().await;
    let apple_id = app.add_product(&seller, &apple()).await["product"]["id"]
        .as_i64()
        .unwrap();
    let (_, token) = app.register("Asha", "asha@example.com").await;

    let body = app
        .call(
            Method::POST,
            "/api/cart/update",
            Some(&token),
            Some(json!({ "cartItems": { apple_id.to_string(): 3, "999": 2, "1000": 0 } })),
        )
        .await;
    assert_eq!(body["success"], true, "{body}");

    let body = app.call(Method::GET, "/api/user/is-auth", Some(&token), None).await;
    assert_eq!(body["user"]["cart"], json!({ apple_id.to_string(): 3 }));
}

#[tokio::test]
async fn test_stale_cart_revision_is_not_applied() {
    let app = TestApp::new();
    let seller = app.seller_token().await;
    let apple_id = app.add_product(&seller, &apple()).await["product"]["id"]
        .as_i64()
        .unwrap();
    let (_, token) = app.register("Asha", "asha@example.com").await;

    let body = app
        .call(
            Method::POST,
            "/api/cart/update",
            Some(&token),
            Some(json!({ "cartItems": { apple_id.to_string(): 2 }, "revision": 5 })),
        )
        .await;
    assert_eq!(body["revision"], 5);

    let body = app
        .call(
            Method::POST,
            "/api/cart/update",
            Some(&token),
            Some(json!({ "cartItems": { apple_id.to_string(): 9 }, "revision": 3 })),
        )
        .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["revision"], 5);

    let body = app.call(Method::GET, "/api/user/is-auth", Some(&token), None).await;
    assert_eq!(body["user"]["cart"], json!({ apple_id.to_string(): 2 }));
}

#[tokio::test]
async fn test_cod_order_includes_tax_and_clears_cart() {
    let app = TestApp::new();
    let seller = app.seller_token().await;
    let apple_id = app.add_product(&seller, &apple()).await["product"]["id"]
        .as_i64()
        .unwrap();
    let (_, token) = app.register("Asha", "asha@example.com").await;

    let body = app
        .call(Method::POST, "/api/address/add", Some(&token), Some(address()))
        .await;
    assert_eq!(body["success"], true, "{body}");
    let address_id = body["address"]["id"].as_i64().unwrap();

    app.call(
        Method::POST,
        "/api/cart/update",
        Some(&token),
        Some(json!({ "cartItems": { apple_id.to_string(): 2 } })),
    )
    .await;

    let body = app
        .call(
            Method::POST,
            "/api/order/cod",
            Some(&token),
            Some(json!({
                "items": [{ "product": apple_id, "quantity": 2 }],
                "address": address_id,
            })),
        )
        .await;
    assert_eq!(body["success"], true, "{body}");
    // 2 x 80.00 = 160.00, plus floor(3.20) tax.
    let amount: Price = serde_json::from_value(body["order"]["amount"].clone()).unwrap();
    assert_eq!(amount, Price::from_cents(16300).unwrap());
    assert_eq!(body["order"]["status"], "Order Placed");
    assert_eq!(body["order"]["paymentType"], "COD");

    let body = app.call(Method::GET, "/api/user/is-auth", Some(&token), None).await;
    assert_eq!(body["user"]["cart"], json!({}));

    let body = app.call(Method::GET, "/api/order/user", Some(&token), None).await;
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["items"][0]["product"]["name"], "Apple");
    assert_eq!(orders[0]["address"]["city"], "Pune");

    let order_id = orders[0]["id"].as_i64().unwrap();
    let body = app
        .call(
            Method::POST,
            "/api/order/status",
            Some(&seller),
            Some(json!({ "orderId": order_id, "status": "Shipped" })),
        )
        .await;
    assert_eq!(body["success"], true, "{body}");

    let body = app.call(Method::GET, "/api/order/seller", Some(&seller), None).await;
    assert_eq!(body["orders"][0]["status"], "Shipped");
}

#[tokio::test]
async fn test_amounts_beyond_storage_are_validation_failures() {
    let app = TestApp::new();
    let seller = app.seller_token().await;

    let mut too_dear = apple();
    too_dear["price"] = json!("10000000000.00");
    let body = app.add_product(&seller, &too_dear).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "price must be at most $9999999999.99");

    let mut dearest = apple();
    dearest["price"] = json!("9999999999.99");
    dearest["offerPrice"] = json!("9999999999.99");
    let body = app.add_product(&seller, &dearest).await;
    assert_eq!(body["success"], true, "{body}");
    let product_id = body["product"]["id"].as_i64().unwrap();

    let (_, token) = app.register("Asha", "asha@example.com").await;
    let body = app
        .call(Method::POST, "/api/address/add", Some(&token), Some(address()))
        .await;
    let address_id = body["address"]["id"].as_i64().unwrap();

    let body = app
        .call(
            Method::POST,
            "/api/order/cod",
            Some(&token),
            Some(json!({
                "items": [{ "product": product_id, "quantity": 2 }],
                "address": address_id,
            })),
        )
        .await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Order amount is too large");

    let body = app.call(Method::GET, "/api/order/user", Some(&token), None).await;
    assert_eq!(body["orders"], json!([]));
}

#[tokio::test]
async fn test_order_rejects_foreign_address_and_empty_items() {
    let app = TestApp::new();
    let seller = app.seller_token().await;
    let apple_id = app.add_product(&seller, &apple()).await["product"]["id"]
        .as_i64()
        .unwrap();
    let (_, owner) = app.register("Asha", "asha@example.com").await;
    let (_, other) = app.register("Ravi", "ravi@example.com").await;

    let body = app
        .call(Method::POST, "/api/address/add", Some(&owner), Some(address()))
        .await;
    let address_id = body["address"]["id"].as_i64().unwrap();

    let body = app
        .call(
            Method::POST,
            "/api/order/cod",
            Some(&other),
            Some(json!({ "items": [{ "product": apple_id, "quantity": 1 }], "address": address_id })),
        )
        .await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Address not found");

    let body = app
        .call(
            Method::POST,
            "/api/order/cod",
            Some(&owner),
            Some(json!({ "items": [], "address": address_id })),
        )
        .await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid data");
}

#[tokio::test]
async fn test_address_add_list_delete() {
    let app = TestApp::new();
    let (_, token) = app.register("Asha", "asha@example.com").await;
    let (_, other) = app.register("Ravi", "ravi@example.com").await;

    let mut missing_city = address();
    missing_city["address"]["city"] = json!("  ");
    let body = app
        .call(Method::POST, "/api/address/add", Some(&token), Some(missing_city))
        .await;
    assert_eq!(body["success"], false);

    let body = app
        .call(Method::POST, "/api/address/add", Some(&token), Some(address()))
        .await;
    let id = body["address"]["id"].as_i64().unwrap();

    let body = app.call(Method::GET, "/api/address/get", Some(&token), None).await;
    assert_eq!(body["addresses"].as_array().unwrap().len(), 1);

    let body = app
        .call(Method::DELETE, &format!("/api/address/{id}"), Some(&other), None)
        .await;
    assert_eq!(body["success"], false);

    let body = app
        .call(Method::DELETE, &format!("/api/address/{id}"), Some(&token), None)
        .await;
    assert_eq!(body["success"], true);

    let body = app.call(Method::GET, "/api/address/get", Some(&token), None).await;
    assert_eq!(body["addresses"].as_array().unwrap().len(), 0);
}
