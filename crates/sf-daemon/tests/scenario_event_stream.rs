//! Scenario tests for the event bus and its SSE surface: bus messages must
//! come out of `GET /v1/events` as named SSE frames, and the write routes
//! must publish their events.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::json;
use sf_config::StorefrontConfig;
use sf_daemon::{routes, state::{AppState, BusMsg}};
use sf_schemas::ProductRow;
use sf_testkit::MemoryOrderStore;
use tower::ServiceExt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_state() -> (Arc<AppState>, Arc<MemoryOrderStore>) {
    let store = Arc::new(MemoryOrderStore::new());
    let st = AppState::new(&StorefrontConfig::default(), Arc::clone(&store) as _)
        .expect("state build failed");
    (Arc::new(st), store)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

/// Read the next SSE frame off the response body as text.
async fn next_frame(body: &mut axum::body::Body) -> String {
    let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
        .await
        .expect("no SSE frame within timeout")
        .expect("stream ended")
        .expect("stream errored");
    let bytes = frame.into_data().expect("expected a data frame");
    String::from_utf8(bytes.to_vec()).expect("SSE frame is not UTF-8")
}

// ---------------------------------------------------------------------------
// GET /v1/events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn events_stream_emits_named_frames_with_json_payload() {
    let (st, _) = make_state();

    let req = Request::builder()
        .method("GET")
        .uri("/v1/events")
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = routes::build_router(Arc::clone(&st))
        .oneshot(req)
        .await
        .expect("oneshot failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["cache-control"], "no-cache");

    // The handler has subscribed; anything published now is delivered.
    let order_id = Uuid::new_v4();
    let store_reference = Uuid::new_v4();
    st.bus
        .send(BusMsg::OrderCreated {
            order_id,
            store_reference,
        })
        .expect("bus send failed");
    st.bus
        .send(BusMsg::PricesAdjusted {
            store_reference,
            updated: 3,
        })
        .expect("bus send failed");

    let mut body = resp.into_body();

    let frame = next_frame(&mut body).await;
    assert!(frame.contains("event: order_created"), "{frame}");
    assert!(frame.contains(r#""type":"order_created""#), "{frame}");
    assert!(frame.contains(&order_id.to_string()), "{frame}");

    let frame = next_frame(&mut body).await;
    assert!(frame.contains("event: prices_adjusted"), "{frame}");
    assert!(frame.contains(r#""updated":3"#), "{frame}");
}

// ---------------------------------------------------------------------------
// Write routes publish bus events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_order_publishes_order_created() {
    let (st, _) = make_state();
    let mut rx = st.bus.subscribe();

    let storefront = Uuid::new_v4();
    let req = post_json(
        "/v1/orders",
        json!({
            "store_reference": storefront,
            "customer_name": "n",
            "customer_email": "e@example.test",
            "total": "5.00",
            "line_items": [],
        }),
    );
    let resp = routes::build_router(Arc::clone(&st))
        .oneshot(req)
        .await
        .expect("oneshot failed");
    assert_eq!(resp.status(), StatusCode::CREATED);

    match rx.recv().await.expect("bus recv failed") {
        BusMsg::OrderCreated {
            store_reference, ..
        } => assert_eq!(store_reference, storefront),
        other => panic!("expected order_created, got {other:?}"),
    }
}

#[tokio::test]
async fn percent_adjust_publishes_prices_adjusted() {
    let (st, store) = make_state();
    let sf = Uuid::new_v4();
    store
        .seed_products(vec![ProductRow {
            id: Uuid::new_v4(),
            store_reference: sf,
            base_price: "10.00".to_string(),
            current_price: None,
        }])
        .await;

    let mut rx = st.bus.subscribe();

    let req = post_json(
        "/v1/products/percent-adjust",
        json!({"store_reference": sf, "percent": 10.0}),
    );
    let resp = routes::build_router(Arc::clone(&st))
        .oneshot(req)
        .await
        .expect("oneshot failed");
    assert_eq!(resp.status(), StatusCode::OK);

    match rx.recv().await.expect("bus recv failed") {
        BusMsg::PricesAdjusted {
            store_reference,
            updated,
        } => {
            assert_eq!(store_reference, sf);
            assert_eq!(updated, 1);
        }
        other => panic!("expected prices_adjusted, got {other:?}"),
    }
}
