use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use orderdeck_server::{api::app_router, build_state, config::Config};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

async fn test_app() -> (Router, TempDir) {
    let tmp = tempdir().unwrap();
    let config = Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        db_path: tmp.path().join("test.db").to_string_lossy().to_string(),
        cors_allow: vec!["*".to_string()],
        request_timeout: Duration::from_secs(5),
    };
    let state = build_state(&config).await.unwrap();
    (app_router(state, &config), tmp)
}

fn order_payload(item_name: &str) -> Value {
    json!({
        "items": [{ "name": item_name, "quantity": 2, "unitPrice": 6.5 }],
        "totalAmount": 13.0,
        "deliveryAddress": {
            "fullName": "Lina Ben Salah",
            "street": "5 Avenue Habib Bourguiba",
            "city": "Sousse",
            "postalCode": "4000"
        }
    })
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn create_order_assigns_id_and_pending_status() {
    let (app, _tmp) = test_app().await;

    let (status, body) = post_json(&app, "/api/orders", order_payload("Margherita")).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(!body["data"]["id"].as_str().unwrap().is_empty());
    assert_eq!(body["data"]["status"], "Pending");
    assert_eq!(body["data"]["totalAmount"], 13.0);
}

#[tokio::test]
async fn list_orders_returns_envelope_newest_first() {
    let (app, _tmp) = test_app().await;

    post_json(&app, "/api/orders", order_payload("First")).await;
    post_json(&app, "/api/orders", order_payload("Second")).await;

    let (status, body) = get_json(&app, "/api/orders").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let orders = body["data"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["items"][0]["name"], "Second");
    assert_eq!(orders[1]["items"][0]["name"], "First");
}

#[tokio::test]
async fn order_with_mismatched_total_is_rejected() {
    let (app, _tmp) = test_app().await;

    let mut payload = order_payload("Margherita");
    payload["totalAmount"] = json!(99.0);
    let (status, body) = post_json(&app, "/api/orders", payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Total amount"));
}

#[tokio::test]
async fn status_update_persists_and_shows_in_listing() {
    let (app, _tmp) = test_app().await;

    let (_, created) = post_json(&app, "/api/orders", order_payload("Margherita")).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/orders/{}/status", id))
                .header("content-type", "application/json")
                .body(Body::from(json!({ "status": "Out for Delivery" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let updated: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(updated["status"], "Out for Delivery");

    let (_, listing) = get_json(&app, "/api/orders").await;
    assert_eq!(listing["data"][0]["status"], "Out for Delivery");
}

#[tokio::test]
async fn status_update_for_unknown_order_is_404() {
    let (app, _tmp) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/orders/no-such-order/status")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "status": "Confirmed" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
