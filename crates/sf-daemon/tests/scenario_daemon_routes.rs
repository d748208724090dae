//! In-process scenario tests for the sf-daemon order endpoints.
//!
//! These tests spin up the Axum router **without** binding a TCP socket.
//! Each test calls `routes::build_router` and drives it via
//! `tower::ServiceExt::oneshot` — no network I/O required.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::json;
use sf_config::StorefrontConfig;
use sf_daemon::{routes, state};
use sf_testkit::MemoryOrderStore;
use tower::ServiceExt; // oneshot
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fresh state over an empty in-memory store, default config.
fn make_state() -> (Arc<state::AppState>, Arc<MemoryOrderStore>) {
    let store = Arc::new(MemoryOrderStore::new());
    let st = state::AppState::new(&StorefrontConfig::default(), Arc::clone(&store) as _)
        .expect("state build failed");
    (Arc::new(st), store)
}

/// Drive the router with a single request and return (status, body_bytes).
async fn call(router: axum::Router, req: Request<axum::body::Body>) -> (StatusCode, bytes::Bytes) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

/// Parse body bytes as a `serde_json::Value`.
fn parse_json(b: bytes::Bytes) -> serde_json::Value {
    serde_json::from_slice(&b).expect("body is not valid JSON")
}

fn get(uri: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_200_with_fingerprint() {
    let (st, _) = make_state();
    let (status, body) = call(routes::build_router(st), get("/v1/health")).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "sf-daemon");
    assert_eq!(
        json["config_fingerprint"].as_str().unwrap_or("").len(),
        64,
        "fingerprint should be sha256 hex"
    );
}

// ---------------------------------------------------------------------------
// POST /v1/orders  then  POST /v1/orders/query
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_order_then_query_round_trips() {
    let (st, _) = make_state();

    let storefront = Uuid::new_v4();
    let create = post_json(
        "/v1/orders",
        json!({
            "store_reference": storefront,
            "customer_name": "Ada Smith",
            "customer_email": "ada@example.test",
            "total": "42.50",
            "line_items": [{"product_id": "sku-1", "quantity": 2}],
        }),
    );
    let (status, body) = call(routes::build_router(Arc::clone(&st)), create).await;
    assert_eq!(status, StatusCode::CREATED);
    let created = parse_json(body);
    assert_eq!(created["total"], "42.50");
    assert!(!created["id"].is_null());

    // Scoped query sees it; a different storefront does not.
    let (status, body) = call(
        routes::build_router(Arc::clone(&st)),
        post_json("/v1/orders/query", json!({"store_reference": storefront})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json = parse_json(body);
    assert_eq!(json["orders"].as_array().unwrap().len(), 1);

    let (_, body) = call(
        routes::build_router(Arc::clone(&st)),
        post_json(
            "/v1/orders/query",
            json!({"store_reference": Uuid::new_v4()}),
        ),
    )
    .await;
    assert_eq!(parse_json(body)["orders"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn query_without_store_returns_all_orders() {
    let (st, _) = make_state();

    for _ in 0..3 {
        let req = post_json(
            "/v1/orders",
            json!({
                "store_reference": Uuid::new_v4(),
                "customer_name": "n",
                "customer_email": "e@example.test",
                "total": "1.00",
                "line_items": [],
            }),
        );
        let (status, _) = call(routes::build_router(Arc::clone(&st)), req).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = call(
        routes::build_router(Arc::clone(&st)),
        post_json("/v1/orders/query", json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(body)["orders"].as_array().unwrap().len(), 3);
}

// ---------------------------------------------------------------------------
// POST /v1/orders/count
// ---------------------------------------------------------------------------

#[tokio::test]
async fn order_count_resolves_storefront() {
    let (st, store) = make_state();

    let user = Uuid::new_v4();
    let storefront = Uuid::new_v4();
    store.seed_storefront(user, storefront).await;

    // Two orders in the user's storefront, one elsewhere.
    for sf in [storefront, storefront, Uuid::new_v4()] {
        let req = post_json(
            "/v1/orders",
            json!({
                "store_reference": sf,
                "customer_name": "n",
                "customer_email": "e@example.test",
                "total": "5.00",
                "line_items": [],
            }),
        );
        let _ = call(routes::build_router(Arc::clone(&st)), req).await;
    }

    let (status, body) = call(
        routes::build_router(Arc::clone(&st)),
        post_json("/v1/orders/count", json!({"user_uuid": user})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json = parse_json(body);
    assert_eq!(json["storefront_uuid"], json!(storefront));
    assert_eq!(json["order_count"], 2);
}

#[tokio::test]
async fn order_count_404_for_user_without_storefront() {
    let (st, _) = make_state();
    let (status, body) = call(
        routes::build_router(st),
        post_json("/v1/orders/count", json!({"user_uuid": Uuid::new_v4()})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(parse_json(body)["error"]
        .as_str()
        .unwrap()
        .contains("no storefront"));
}

// ---------------------------------------------------------------------------
// POST /v1/orders/fulfillment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fulfillment_partial_update_preserves_other_fields() {
    let (st, _) = make_state();

    let create = post_json(
        "/v1/orders",
        json!({
            "store_reference": Uuid::new_v4(),
            "customer_name": "n",
            "customer_email": "e@example.test",
            "total": "5.00",
            "line_items": [],
        }),
    );
    let (_, body) = call(routes::build_router(Arc::clone(&st)), create).await;
    let order_id = parse_json(body)["id"].as_str().unwrap().to_string();

    // First patch sets confirmation only.
    let (status, body) = call(
        routes::build_router(Arc::clone(&st)),
        post_json(
            "/v1/orders/fulfillment",
            json!({"order_id": order_id, "confirmation": "CONF-1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(body)["confirmation"], "CONF-1");

    // Second patch sets tracking; confirmation must survive.
    let (status, body) = call(
        routes::build_router(Arc::clone(&st)),
        post_json(
            "/v1/orders/fulfillment",
            json!({"order_id": order_id, "tracking_number": "1Z999"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json = parse_json(body);
    assert_eq!(json["confirmation"], "CONF-1");
    assert_eq!(json["tracking_number"], "1Z999");
}

#[tokio::test]
async fn fulfillment_empty_patch_is_400() {
    let (st, _) = make_state();
    let (status, body) = call(
        routes::build_router(st),
        post_json(
            "/v1/orders/fulfillment",
            json!({"order_id": Uuid::new_v4()}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(parse_json(body)["error"]
        .as_str()
        .unwrap()
        .contains("at least one field"));
}

#[tokio::test]
async fn fulfillment_unknown_order_is_404() {
    let (st, _) = make_state();
    let (status, _) = call(
        routes::build_router(st),
        post_json(
            "/v1/orders/fulfillment",
            json!({"order_id": Uuid::new_v4(), "confirmation": "CONF-9"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Unknown routes return 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let (st, _) = make_state();
    let (status, _) = call(routes::build_router(st), get("/v1/does_not_exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
