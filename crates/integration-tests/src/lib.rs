//! Black-box tests against a running GreenCart API.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the API with a migrated database
//! greencart migrate && cargo run -p greencart-server
//!
//! # Run the ignored tests against it
//! GREENCART_API_URL=http://localhost:5000 cargo test -p greencart-integration-tests -- --ignored
//! ```
//!
//! Seller tests additionally need `GREENCART_SELLER_EMAIL` and
//! `GREENCART_SELLER_PASSWORD` naming an account created with
//! `greencart seller create`. They skip themselves when those are unset.

use reqwest::Client;
use serde_json::Value;

/// Base URL of the API under test.
#[must_use]
pub fn api_url() -> String {
    std::env::var("GREENCART_API_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// Seller credentials from the environment, if configured.
#[must_use]
pub fn seller_credentials() -> Option<(String, String)> {
    let email = std::env::var("GREENCART_SELLER_EMAIL").ok()?;
    let password = std::env::var("GREENCART_SELLER_PASSWORD").ok()?;
    Some((email, password))
}

/// A client that keeps the session cookie between requests.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A throwaway email that will not collide with earlier runs.
#[must_use]
pub fn unique_email() -> String {
    format!("it-{}@example.com", uuid::Uuid::new_v4().simple())
}

/// GET `path` and decode the JSON envelope.
///
/// # Panics
///
/// Panics on transport errors or a non-JSON body.
#[allow(clippy::expect_used)]
pub async fn get(client: &Client, path: &str, token: Option<&str>) -> Value {
    let mut req = client.get(format!("{}{path}", api_url()));
    if let Some(token) = token {
        req = req.bearer_auth(token);
    }
    req.send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Response was not JSON")
}

/// POST a JSON body to `path` and decode the JSON envelope.
///
/// # Panics
///
/// Panics on transport errors or a non-JSON body.
#[allow(clippy::expect_used)]
pub async fn post(client: &Client, path: &str, body: &Value, token: Option<&str>) -> Value {
    let mut req = client.post(format!("{}{path}", api_url())).json(body);
    if let Some(token) = token {
        req = req.bearer_auth(token);
    }
    req.send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Response was not JSON")
}

/// Register a fresh shopper and return `(email, token)`.
///
/// # Panics
///
/// Panics if registration does not succeed.
#[allow(clippy::expect_used)]
pub async fn register(client: &Client) -> (String, String) {
    let email = unique_email();
    let body = serde_json::json!({
        "name": "Integration Shopper",
        "email": email,
        "password": "correct-horse-battery",
    });
    let resp = post(client, "/api/user/register", &body, None).await;
    assert_eq!(resp["success"], true, "register failed: {resp}");
    let token = resp["token"].as_str().expect("token missing").to_string();
    (email, token)
}
