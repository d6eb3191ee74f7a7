//! Seller flows against a running server.
//!
//! These need `GREENCART_SELLER_EMAIL` and `GREENCART_SELLER_PASSWORD`;
//! without them each test returns early.

use greencart_integration_tests::{get, post, register, seller_credentials, session_client};
use serde_json::json;

async fn seller_token() -> Option<String> {
    let (email, password) = seller_credentials()?;
    let resp = post(
        &session_client(),
        "/api/seller/login",
        &json!({ "email": email, "password": password }),
        None,
    )
    .await;
    assert_eq!(resp["success"], true, "seller login failed: {resp}");
    resp["token"].as_str().map(str::to_owned)
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_shopper_token_cannot_list_all_orders() {
    let client = session_client();
    let (_, token) = register(&client).await;

    let resp = get(&client, "/api/order/seller", Some(&token)).await;
    assert_eq!(resp["success"], false);
    assert_eq!(resp["message"], "Not authorized");
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_seller_is_auth_and_order_listing() {
    let Some(token) = seller_token().await else {
        return;
    };
    let client = session_client();

    let auth = get(&client, "/api/seller/is-auth", Some(&token)).await;
    assert_eq!(auth["success"], true);

    let orders = get(&client, "/api/order/seller", Some(&token)).await;
    assert_eq!(orders["success"], true);
    assert!(orders["orders"].is_array());
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_seller_wrong_password_fails() {
    let Some((email, _)) = seller_credentials() else {
        return;
    };
    let resp = post(
        &session_client(),
        "/api/seller/login",
        &json!({ "email": email, "password": "definitely-not-it" }),
        None,
    )
    .await;
    assert_eq!(resp["success"], false);
}
