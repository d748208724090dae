//! sf-aggregate
//!
//! Order aggregation core for the storefront backend:
//! - Top-seller ranking (cumulative quantity, stable tie order)
//! - Calendar-month bucketing (counts and revenue, UTC `"YYYY-MM"` keys)
//! - Bulk percent price adjustment (half-away-from-zero cent rounding)
//! - `Cents` fixed-point money, `Percent` basis-point adjustments
//! - Pure deterministic logic (no IO, no clocks, no store wiring)
//!
//! Each invocation is a pure function of an in-memory order snapshot; the
//! surrounding handler fetches the snapshot and serializes the result.
//! Per-record anomalies (missing quantities, unknown product ids,
//! unparsable timestamps) are normalized or skipped-and-counted, never
//! errors; structurally invalid calls (a zero limit, a non-finite percent)
//! fail loudly at the call site.

mod buckets;
mod cents;
mod pricing;
mod ranking;

pub use buckets::{
    bucket_by_month, count_selector, month_key, revenue_selector, MonthlyBuckets,
};
pub use cents::{Cents, InvalidPercent, ParseCentsError, Percent};
pub use pricing::{apply_percent_adjustment, AdjustedPrice, PriceInput};
pub use ranking::{rank_top_sellers, ProductTotal, DEFAULT_TOP_LIMIT};
