//! sf-schemas
//!
//! Shared data types for the storefront backend. Everything here is plain
//! serde — no business logic, no I/O.
//!
//! The order shapes that come out of the store are historically messy:
//! `line_items` is sometimes an array, sometimes a bare object, sometimes
//! null; `quantity` shows up as a number, a numeric string, or not at all;
//! timestamps are occasionally unparsable. Normalization happens once, at
//! the serde boundary, so every consumer downstream sees a clean
//! [`OrderRecord`]. Per-item anomalies coerce to safe defaults and never
//! fail deserialization; only a structurally broken document is an error.

mod lenient;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use lenient::{coerce_quantity, normalize_line_items};

// ---------------------------------------------------------------------------
// LineItem
// ---------------------------------------------------------------------------

/// One product-quantity entry within an order.
///
/// `product_id` is opaque at this layer — there is no referential-integrity
/// guarantee, and unknown ids aggregate like any other. A missing id is
/// `None` and the item is skipped by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product identifier. Accepts a JSON string or number; anything else
    /// normalizes to `None`.
    #[serde(default, deserialize_with = "lenient::opt_id", alias = "id")]
    pub product_id: Option<String>,
    /// Ordered quantity. Coerced to a non-negative integer: numeric strings
    /// parse, negatives and garbage become 0, missing becomes 0.
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub quantity: u32,
}

// ---------------------------------------------------------------------------
// OrderRecord
// ---------------------------------------------------------------------------

/// One historical order as supplied by the Order Store.
///
/// Monetary amounts stay as decimal strings here so callers can normalize
/// deterministically (no floats); `sf-aggregate` owns the fixed-point
/// conversion rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: Uuid,
    /// Storefront this order belongs to.
    pub store_reference: Option<Uuid>,
    /// Order creation instant (UTC). `None` when the source timestamp was
    /// absent or unparsable; such orders are excluded from month buckets
    /// and counted as skipped.
    #[serde(default, deserialize_with = "lenient::opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    /// Total charged for the order, as a decimal string (e.g. `"19.99"`).
    #[serde(default)]
    pub total: Option<String>,
    /// Ordered line items. A bare object is wrapped into a one-element
    /// sequence; null/missing becomes empty.
    #[serde(default, deserialize_with = "lenient::line_items")]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(flatten)]
    pub fulfillment: Fulfillment,
}

/// Post-payment fulfillment fields, all optional until the order ships.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fulfillment {
    #[serde(default)]
    pub confirmation: Option<String>,
    #[serde(default)]
    pub shipment_id: Option<String>,
    #[serde(default)]
    pub label_data: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

// ---------------------------------------------------------------------------
// Write-side shapes
// ---------------------------------------------------------------------------

/// Payload for inserting a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub store_reference: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    /// Decimal string, e.g. `"129.00"`.
    pub total: String,
    #[serde(default, deserialize_with = "lenient::line_items")]
    pub line_items: Vec<LineItem>,
}

/// Partial fulfillment update. Only fields present in the patch are
/// written; an all-`None` patch is rejected by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FulfillmentPatch {
    pub confirmation: Option<String>,
    pub shipment_id: Option<String>,
    pub label_data: Option<String>,
    pub tracking_number: Option<String>,
}

impl FulfillmentPatch {
    /// True when the patch carries nothing to write.
    pub fn is_empty(&self) -> bool {
        self.confirmation.is_none()
            && self.shipment_id.is_none()
            && self.label_data.is_none()
            && self.tracking_number.is_none()
    }
}

// ---------------------------------------------------------------------------
// ProductRow
// ---------------------------------------------------------------------------

/// One product row as needed by the bulk price adjustment.
///
/// Prices are decimal strings for the same reason as [`OrderRecord::total`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRow {
    pub id: Uuid,
    pub store_reference: Uuid,
    /// The price adjustments are computed from. Never mutated by the
    /// percent adjustment itself.
    pub base_price: String,
    /// The currently effective price (base price after the last
    /// adjustment), if any adjustment has been applied.
    #[serde(default)]
    pub current_price: Option<String>,
}
