//! Scenario tests for the analytics endpoints, driven through the full
//! router with a seeded in-memory store.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde_json::json;
use sf_config::StorefrontConfig;
use sf_daemon::{routes, state};
use sf_schemas::{Fulfillment, LineItem, OrderRecord};
use sf_testkit::MemoryOrderStore;
use tower::ServiceExt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_state() -> (Arc<state::AppState>, Arc<MemoryOrderStore>) {
    let store = Arc::new(MemoryOrderStore::new());
    let st = state::AppState::new(&StorefrontConfig::default(), Arc::clone(&store) as _)
        .expect("state build failed");
    (Arc::new(st), store)
}

async fn get_json(
    st: &Arc<state::AppState>,
    uri: &str,
) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = routes::build_router(Arc::clone(st))
        .oneshot(req)
        .await
        .expect("oneshot failed");
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn order(
    store: Uuid,
    created_at: Option<&str>,
    total: &str,
    items: &[(&str, u32)],
) -> OrderRecord {
    OrderRecord {
        id: Uuid::new_v4(),
        store_reference: Some(store),
        created_at: created_at.map(|s| {
            DateTime::parse_from_rfc3339(s)
                .expect("bad test timestamp")
                .with_timezone(&Utc)
        }),
        total: Some(total.to_string()),
        line_items: items
            .iter()
            .map(|(id, qty)| LineItem {
                product_id: Some((*id).to_string()),
                quantity: *qty,
            })
            .collect(),
        customer_name: None,
        customer_email: None,
        fulfillment: Fulfillment::default(),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/analytics/top-sellers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn top_sellers_ranks_by_cumulative_quantity() {
    let (st, store) = make_state();
    let sf = Uuid::new_v4();

    store
        .seed_orders(vec![
            order(sf, Some("2024-01-05T10:00:00Z"), "10.00", &[("mug", 3), ("hat", 1)]),
            order(sf, Some("2024-01-06T10:00:00Z"), "10.00", &[("mug", 2)]),
            order(sf, Some("2024-01-07T10:00:00Z"), "10.00", &[("tee", 4)]),
        ])
        .await;

    let (status, json) = get_json(&st, "/v1/analytics/top-sellers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["limit"], 6);

    let products = json["products"].as_array().unwrap();
    assert_eq!(products.len(), 3);
    assert_eq!(products[0]["product_id"], "mug");
    assert_eq!(products[0]["total_quantity"], 5);
    assert_eq!(products[1]["product_id"], "tee");
    assert_eq!(products[2]["product_id"], "hat");
}

#[tokio::test]
async fn top_sellers_ties_keep_first_seen_order() {
    let (st, store) = make_state();
    let sf = Uuid::new_v4();

    // zeta appears before alpha and they tie on quantity.
    store
        .seed_orders(vec![order(
            sf,
            Some("2024-01-05T10:00:00Z"),
            "10.00",
            &[("zeta", 2), ("alpha", 2)],
        )])
        .await;

    let (_, json) = get_json(&st, "/v1/analytics/top-sellers").await;
    let products = json["products"].as_array().unwrap();
    assert_eq!(products[0]["product_id"], "zeta");
    assert_eq!(products[1]["product_id"], "alpha");
}

#[tokio::test]
async fn top_sellers_limit_param_truncates() {
    let (st, store) = make_state();
    let sf = Uuid::new_v4();

    store
        .seed_orders(vec![order(
            sf,
            Some("2024-01-05T10:00:00Z"),
            "10.00",
            &[("a", 5), ("b", 4), ("c", 3)],
        )])
        .await;

    let (status, json) = get_json(&st, "/v1/analytics/top-sellers?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["limit"], 2);
    assert_eq!(json["products"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn top_sellers_limit_zero_is_400() {
    let (st, _) = make_state();
    let (status, json) = get_json(&st, "/v1/analytics/top-sellers?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("limit"));
}

#[tokio::test]
async fn top_sellers_store_filter_scopes_the_snapshot() {
    let (st, store) = make_state();
    let mine = Uuid::new_v4();
    let theirs = Uuid::new_v4();

    store
        .seed_orders(vec![
            order(mine, Some("2024-01-05T10:00:00Z"), "10.00", &[("mug", 1)]),
            order(theirs, Some("2024-01-05T10:00:00Z"), "10.00", &[("hat", 9)]),
        ])
        .await;

    let (_, json) = get_json(&st, &format!("/v1/analytics/top-sellers?store={mine}")).await;
    let products = json["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["product_id"], "mug");
}

// ---------------------------------------------------------------------------
// GET /v1/analytics/orders-per-month
// ---------------------------------------------------------------------------

#[tokio::test]
async fn orders_per_month_buckets_and_counts_skips() {
    let (st, store) = make_state();
    let sf = Uuid::new_v4();

    store
        .seed_orders(vec![
            order(sf, Some("2024-01-05T10:00:00Z"), "10.00", &[]),
            order(sf, Some("2024-01-28T23:59:59Z"), "10.00", &[]),
            order(sf, Some("2024-02-01T00:00:00Z"), "10.00", &[]),
            order(sf, None, "10.00", &[]),
        ])
        .await;

    let (status, json) = get_json(&st, "/v1/analytics/orders-per-month").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["buckets"]["2024-01"], 2);
    assert_eq!(json["buckets"]["2024-02"], 1);
    assert_eq!(json["skipped"], 1);
}

#[tokio::test]
async fn orders_per_month_empty_store_is_empty_mapping() {
    let (st, _) = make_state();
    let (status, json) = get_json(&st, "/v1/analytics/orders-per-month").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["buckets"], json!({}));
    assert_eq!(json["skipped"], 0);
}

// ---------------------------------------------------------------------------
// GET /v1/analytics/sales-per-month
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sales_per_month_sums_totals_in_cents() {
    let (st, store) = make_state();
    let sf = Uuid::new_v4();

    store
        .seed_orders(vec![
            order(sf, Some("2024-01-05T10:00:00Z"), "10.00", &[]),
            order(sf, Some("2024-01-06T10:00:00Z"), "5.50", &[]),
            order(sf, Some("2024-03-01T10:00:00Z"), "not-a-price", &[]),
        ])
        .await;

    let (status, json) = get_json(&st, "/v1/analytics/sales-per-month").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["buckets"]["2024-01"], 1550);
    // Unparsable total still occupies its month, contributing zero.
    assert_eq!(json["buckets"]["2024-03"], 0);
    assert_eq!(json["skipped"], 0);
}
