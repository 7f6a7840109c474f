//! Integration tests for order placement against a real database.
//!
//! Require a running server and its database; see the crate docs. These
//! tests rewrite the `"store"` settings to the default pricing.

#![allow(clippy::indexing_slicing)]

use beauty_shop_core::{Role, UserId};
use beauty_shop_integration_tests::{TestContext, order_body};
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_order_totals() {
    let ctx = TestContext::new().await;
    ctx.reset_store_settings().await;
    let token = ctx.login(&ctx.create_account(Role::User).await).await;
    let product = ctx.create_product(2000, 10).await;

    let resp = ctx
        .client
        .post(ctx.url("/api/orders"))
        .bearer_auth(&token)
        .json(&order_body(&[(product, 2)]))
        .send()
        .await
        .expect("create order");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let order: Value = resp.json().await.expect("order body");
    assert_eq!(order["subtotal"], 4000);
    assert_eq!(order["tax"], 640);
    assert_eq!(order["shipping"], 500);
    assert_eq!(order["total"], 5140);
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["paymentStatus"], "PENDING");
    assert!(order["orderNumber"].as_str().expect("number").starts_with("ORD-"));
    assert_eq!(ctx.stock(product).await, (8, true));

    let mine: Vec<Value> = ctx
        .client
        .get(ctx.url("/api/orders"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("list orders")
        .json()
        .await
        .expect("orders body");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["id"], order["id"]);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_client_price_is_ignored() {
    let ctx = TestContext::new().await;
    ctx.reset_store_settings().await;
    let token = ctx.login(&ctx.create_account(Role::User).await).await;
    let product = ctx.create_product(3000, 10).await;

    let mut body = order_body(&[(product, 2)]);
    body["items"][0]["price"] = Value::from(1);

    let order: Value = ctx
        .client
        .post(ctx.url("/api/orders"))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await
        .expect("create order")
        .json()
        .await
        .expect("order body");

    assert_eq!(order["subtotal"], 6000);
    assert_eq!(order["shipping"], 0);
    assert_eq!(order["total"], 6960);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_out_of_stock_rolls_back_earlier_lines() {
    let ctx = TestContext::new().await;
    let token = ctx.login(&ctx.create_account(Role::User).await).await;
    let plenty = ctx.create_product(1000, 10).await;
    let scarce = ctx.create_product(1000, 1).await;

    let resp = ctx
        .client
        .post(ctx.url("/api/orders"))
        .bearer_auth(&token)
        .json(&order_body(&[(plenty, 3), (scarce, 2)]))
        .send()
        .await
        .expect("create order");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(ctx.stock(plenty).await, (10, true));
    assert_eq!(ctx.stock(scarce).await, (1, true));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_selling_out_clears_in_stock() {
    let ctx = TestContext::new().await;
    let token = ctx.login(&ctx.create_account(Role::User).await).await;
    let product = ctx.create_product(1500, 2).await;

    let resp = ctx
        .client
        .post(ctx.url("/api/orders"))
        .bearer_auth(&token)
        .json(&order_body(&[(product, 2)]))
        .send()
        .await
        .expect("create order");
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(ctx.stock(product).await, (0, false));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_concurrent_orders_never_oversell() {
    let ctx = TestContext::new().await;
    let token = ctx.login(&ctx.create_account(Role::User).await).await;
    let product = ctx.create_product(1000, 5).await;

    let requests = (0..6).map(|_| {
        ctx.client
            .post(ctx.url("/api/orders"))
            .bearer_auth(&token)
            .json(&order_body(&[(product, 2)]))
            .send()
    });
    let mut handles = Vec::new();
    for request in requests {
        handles.push(tokio::spawn(request));
    }

    let mut created = 0;
    for handle in handles {
        let resp = handle.await.expect("join").expect("send");
        match resp.status() {
            StatusCode::CREATED => created += 1,
            StatusCode::BAD_REQUEST => {}
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(created, 2);
    assert_eq!(ctx.stock(product).await, (1, true));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_unknown_product_is_bad_request() {
    let ctx = TestContext::new().await;
    let token = ctx.login(&ctx.create_account(Role::User).await).await;

    let resp = ctx
        .client
        .post(ctx.url("/api/orders"))
        .bearer_auth(&token)
        .json(&order_body(&[(uuid::Uuid::new_v4(), 1)]))
        .send()
        .await
        .expect("create order");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.expect("error body");
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_token_for_missing_account_is_unauthorized() {
    let ctx = TestContext::new().await;
    let token = TestContext::token_for(UserId::generate(), Role::User);
    let product = ctx.create_product(1500, 4).await;

    let resp = ctx
        .client
        .post(ctx.url("/api/orders"))
        .bearer_auth(&token)
        .json(&order_body(&[(product, 1)]))
        .send()
        .await
        .expect("create order");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("error body");
    assert_eq!(body["error"], "User not found");
    assert_eq!(ctx.stock(product).await, (4, true));

    let resp = ctx
        .client
        .get(ctx.url("/api/orders"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("list orders");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
