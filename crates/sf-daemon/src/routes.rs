//! Axum router and all HTTP handlers for sf-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers.  All handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.
//!
//! Handlers are thin: they validate, call the store/aggregator/provider, and
//! serialize. Per-record data anomalies are handled inside sf-aggregate; only
//! structural problems (bad limit, empty patch, unknown ids) become 4xx here.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{error, info};

use sf_aggregate::{
    apply_percent_adjustment, bucket_by_month, count_selector, rank_top_sellers,
    revenue_selector, Percent, PriceInput,
};
use sf_clients::{CheckoutSessionRequest, TemplateMail};
use sf_schemas::NewOrder;

use crate::{
    api_types::{
        ErrorResponse, FulfillmentUpdateRequest, HealthResponse, MonthlyQuery,
        OrderCountRequest, OrderCountResponse, OrdersQueryRequest, OrdersResponse,
        PercentAdjustRequest, PercentAdjustResponse, TopSellersQuery, TopSellersResponse,
    },
    state::{AppState, BusMsg},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/analytics/top-sellers", get(top_sellers))
        .route("/v1/analytics/orders-per-month", get(orders_per_month))
        .route("/v1/analytics/sales-per-month", get(sales_per_month))
        .route("/v1/orders", post(create_order))
        .route("/v1/orders/query", post(query_orders))
        .route("/v1/orders/count", post(count_orders))
        .route("/v1/orders/fulfillment", post(update_fulfillment))
        .route("/v1/products/percent-adjust", post(percent_adjust))
        .route("/v1/checkout/session", post(checkout_session))
        .route("/v1/shipping/rates", post(shipping_rates))
        .route("/v1/mail/send", post(send_mail))
        .route("/v1/events", get(events))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Error helpers
// ---------------------------------------------------------------------------

fn err(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: msg.into() })).into_response()
}

fn internal(what: &str, e: anyhow::Error) -> Response {
    error!(error = %e, "{what} failed");
    err(StatusCode::INTERNAL_SERVER_ERROR, format!("{what}: {e}"))
}

fn upstream(what: &str, e: anyhow::Error) -> Response {
    error!(error = %e, "{what} upstream error");
    err(StatusCode::BAD_GATEWAY, format!("{what}: {e}"))
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
            config_fingerprint: st.config_fingerprint.clone(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/analytics/top-sellers
// ---------------------------------------------------------------------------

/// Rank products by cumulative quantity across the order snapshot.
///
/// `?store=` restricts the snapshot to one storefront; `?limit=` overrides
/// the configured cap. `limit=0` is a caller error, refused before the
/// aggregator sees it.
pub(crate) async fn top_sellers(
    State(st): State<Arc<AppState>>,
    Query(q): Query<TopSellersQuery>,
) -> Response {
    let limit = q.limit.unwrap_or(st.top_limit);
    if limit == 0 {
        return err(StatusCode::BAD_REQUEST, "limit must be at least 1");
    }

    let orders = match st.store.fetch_orders(q.store).await {
        Ok(orders) => orders,
        Err(e) => return internal("top-sellers order fetch", e),
    };

    let products = rank_top_sellers(&orders, limit);
    (StatusCode::OK, Json(TopSellersResponse { limit, products })).into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/analytics/orders-per-month
// ---------------------------------------------------------------------------

/// Per-month order counts, keyed `"YYYY-MM"` (UTC). Orders without a
/// parsable timestamp land in the `skipped` counter.
pub(crate) async fn orders_per_month(
    State(st): State<Arc<AppState>>,
    Query(q): Query<MonthlyQuery>,
) -> Response {
    let orders = match st.store.fetch_orders(q.store).await {
        Ok(orders) => orders,
        Err(e) => return internal("orders-per-month fetch", e),
    };

    let buckets = bucket_by_month(&orders, count_selector);
    (StatusCode::OK, Json(buckets)).into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/analytics/sales-per-month
// ---------------------------------------------------------------------------

/// Per-month revenue in cents, same keying and skip policy as the count
/// variant. Orders whose `total` does not parse contribute zero but still
/// occupy their month bucket.
pub(crate) async fn sales_per_month(
    State(st): State<Arc<AppState>>,
    Query(q): Query<MonthlyQuery>,
) -> Response {
    let orders = match st.store.fetch_orders(q.store).await {
        Ok(orders) => orders,
        Err(e) => return internal("sales-per-month fetch", e),
    };

    let buckets = bucket_by_month(&orders, revenue_selector);
    (StatusCode::OK, Json(buckets)).into_response()
}

// ---------------------------------------------------------------------------
// POST /v1/orders
// ---------------------------------------------------------------------------

pub(crate) async fn create_order(
    State(st): State<Arc<AppState>>,
    Json(new): Json<NewOrder>,
) -> Response {
    let record = match st.store.insert_order(&new).await {
        Ok(record) => record,
        Err(e) => return internal("order insert", e),
    };

    info!(order_id = %record.id, store = %new.store_reference, "order created");
    let _ = st.bus.send(BusMsg::OrderCreated {
        order_id: record.id,
        store_reference: new.store_reference,
    });

    (StatusCode::CREATED, Json(record)).into_response()
}

// ---------------------------------------------------------------------------
// POST /v1/orders/query
// ---------------------------------------------------------------------------

pub(crate) async fn query_orders(
    State(st): State<Arc<AppState>>,
    Json(req): Json<OrdersQueryRequest>,
) -> Response {
    let orders = match st.store.fetch_orders(req.store_reference).await {
        Ok(orders) => orders,
        Err(e) => return internal("order query", e),
    };

    (StatusCode::OK, Json(OrdersResponse { orders })).into_response()
}

// ---------------------------------------------------------------------------
// POST /v1/orders/count
// ---------------------------------------------------------------------------

/// Resolve the caller's storefront and count its orders. A user with no
/// storefront is a 404, not an empty count.
pub(crate) async fn count_orders(
    State(st): State<Arc<AppState>>,
    Json(req): Json<OrderCountRequest>,
) -> Response {
    match st.store.count_orders_for_user(req.user_uuid).await {
        Ok(Some(count)) => (
            StatusCode::OK,
            Json(OrderCountResponse {
                storefront_uuid: count.storefront_uuid,
                order_count: count.order_count,
            }),
        )
            .into_response(),
        Ok(None) => err(
            StatusCode::NOT_FOUND,
            format!("no storefront for user {}", req.user_uuid),
        ),
        Err(e) => internal("order count", e),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/orders/fulfillment
// ---------------------------------------------------------------------------

/// Partial fulfillment update: only the fields present in the request are
/// written; absent fields keep their stored value.
pub(crate) async fn update_fulfillment(
    State(st): State<Arc<AppState>>,
    Json(req): Json<FulfillmentUpdateRequest>,
) -> Response {
    if req.patch.is_empty() {
        return err(
            StatusCode::BAD_REQUEST,
            "fulfillment patch must set at least one field",
        );
    }

    match st.store.update_fulfillment(req.order_id, &req.patch).await {
        Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(None) => err(
            StatusCode::NOT_FOUND,
            format!("no order {}", req.order_id),
        ),
        Err(e) => internal("fulfillment update", e),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/products/percent-adjust
// ---------------------------------------------------------------------------

/// Bulk percent price adjustment for one storefront's catalog.
///
/// Reads every product, adjusts parsable base prices half-away-from-zero at
/// the cent boundary, writes the results back, and reports how many rows
/// changed and how many were skipped as unparsable.
pub(crate) async fn percent_adjust(
    State(st): State<Arc<AppState>>,
    Json(req): Json<PercentAdjustRequest>,
) -> Response {
    let percent = match Percent::from_f64(req.percent) {
        Ok(p) => p,
        Err(e) => return err(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let products = match st.store.fetch_products(req.store_reference).await {
        Ok(products) => products,
        Err(e) => return internal("product fetch", e),
    };

    let inputs: Vec<PriceInput> = products.iter().filter_map(PriceInput::from_row).collect();
    let skipped_unparsable = products.len() - inputs.len();

    let adjustments = apply_percent_adjustment(&inputs, percent);

    let updated = match st.store.apply_price_adjustments(&adjustments).await {
        Ok(updated) => updated,
        Err(e) => return internal("price write-back", e),
    };

    info!(
        store = %req.store_reference,
        percent = req.percent,
        updated,
        skipped_unparsable,
        "percent adjustment applied"
    );
    let _ = st.bus.send(BusMsg::PricesAdjusted {
        store_reference: req.store_reference,
        updated,
    });

    (
        StatusCode::OK,
        Json(PercentAdjustResponse {
            updated,
            skipped_unparsable,
            adjustments,
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// POST /v1/checkout/session
// ---------------------------------------------------------------------------

pub(crate) async fn checkout_session(
    State(st): State<Arc<AppState>>,
    Json(req): Json<CheckoutSessionRequest>,
) -> Response {
    let Some(checkout) = st.checkout.as_ref() else {
        return err(
            StatusCode::SERVICE_UNAVAILABLE,
            "checkout provider not configured",
        );
    };

    match checkout.create_session(&req).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(e) => upstream("checkout session", e),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/shipping/rates
// ---------------------------------------------------------------------------

/// Quote shipping rates for a shipment description. The request body is
/// forwarded to the carrier API as-is; only the rate list comes back.
pub(crate) async fn shipping_rates(
    State(st): State<Arc<AppState>>,
    Json(shipment): Json<serde_json::Value>,
) -> Response {
    let Some(rates) = st.rates.as_ref() else {
        return err(
            StatusCode::SERVICE_UNAVAILABLE,
            "shipping rate provider not configured",
        );
    };

    match rates.get_rates(&shipment).await {
        Ok(quotes) => (StatusCode::OK, Json(quotes)).into_response(),
        Err(e) => upstream("shipping rates", e),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/mail/send
// ---------------------------------------------------------------------------

pub(crate) async fn send_mail(
    State(st): State<Arc<AppState>>,
    Json(mail): Json<TemplateMail>,
) -> Response {
    let Some(provider) = st.mail.as_ref() else {
        return err(
            StatusCode::SERVICE_UNAVAILABLE,
            "mail provider not configured",
        );
    };

    match provider.send_template(&mail).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "ok": true }))).into_response(),
        Err(e) => upstream("mail send", e),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/events  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn events(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx);

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let event_name = match &m {
                    BusMsg::Heartbeat { .. } => "heartbeat",
                    BusMsg::OrderCreated { .. } => "order_created",
                    BusMsg::PricesAdjusted { .. } => "prices_adjusted",
                };
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(event_name).data(data)))
            }
            Err(_) => None, // lagged / closed
        }
    })
}
