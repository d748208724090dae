//! Request and response types for all sf-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` where Axum needs them to be.
//! No business logic lives here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sf_aggregate::{AdjustedPrice, ProductTotal};
use sf_schemas::{FulfillmentPatch, OrderRecord};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
    /// sha256 of the active config file; lets a deploy script confirm which
    /// config a running daemon picked up.
    pub config_fingerprint: String,
}

// ---------------------------------------------------------------------------
// Error envelope
// ---------------------------------------------------------------------------

/// Uniform JSON error body for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// /v1/analytics/top-sellers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TopSellersQuery {
    /// Restrict the ranking to one storefront; omit for the whole catalog.
    pub store: Option<Uuid>,
    /// Result cap; defaults to the configured analytics.top_limit.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopSellersResponse {
    pub limit: usize,
    pub products: Vec<ProductTotal>,
}

// ---------------------------------------------------------------------------
// /v1/analytics/orders-per-month  /v1/analytics/sales-per-month
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MonthlyQuery {
    pub store: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// /v1/orders/query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OrdersQueryRequest {
    /// Omit (or null) to fetch orders across all storefronts.
    pub store_reference: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<OrderRecord>,
}

// ---------------------------------------------------------------------------
// /v1/orders/count
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OrderCountRequest {
    pub user_uuid: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderCountResponse {
    pub storefront_uuid: Uuid,
    pub order_count: i64,
}

// ---------------------------------------------------------------------------
// /v1/orders/fulfillment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct FulfillmentUpdateRequest {
    pub order_id: Uuid,
    #[serde(flatten)]
    pub patch: FulfillmentPatch,
}

// ---------------------------------------------------------------------------
// /v1/products/percent-adjust
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PercentAdjustRequest {
    pub store_reference: Uuid,
    /// Signed percentage, e.g. `10.0` raises prices 10%, `-25.0` cuts a
    /// quarter off.
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PercentAdjustResponse {
    /// Rows actually written back.
    pub updated: u64,
    /// Products skipped because their stored base price was not a parsable
    /// decimal. Skips are surfaced, never silently absorbed.
    pub skipped_unparsable: usize,
    pub adjustments: Vec<AdjustedPrice>,
}
