//! Calendar-month bucketing of order counts and revenue.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use sf_schemas::OrderRecord;

use crate::Cents;

/// Canonical month key: `"YYYY-MM"`, zero-padded, derived from the UTC
/// instant of the order timestamp.
///
/// The policy is deliberately single: UTC only, year first. (The data this
/// system inherited mixed `MM-YYYY` local-time and UTC keys across handler
/// copies; mixing bucket policies silently shifts orders near month
/// boundaries between buckets.)
pub fn month_key(ts: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", ts.year(), ts.month())
}

/// Month-keyed aggregation result.
///
/// `skipped` counts orders excluded because their timestamp was absent or
/// unparsable — surfaced rather than silently dropped so callers can see
/// when the totals are incomplete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyBuckets {
    /// `"YYYY-MM"` -> accumulated value. BTreeMap keeps output ordering
    /// chronological and deterministic.
    pub buckets: BTreeMap<String, i64>,
    /// Orders excluded for lack of a parsable timestamp.
    pub skipped: usize,
}

/// Bucket orders by calendar month, accumulating `selector(order)` per
/// bucket. Every order with a parsable timestamp lands in exactly one
/// bucket; the rest are counted in [`MonthlyBuckets::skipped`]. Empty input
/// yields an empty mapping.
pub fn bucket_by_month<F>(orders: &[OrderRecord], selector: F) -> MonthlyBuckets
where
    F: Fn(&OrderRecord) -> i64,
{
    let mut out = MonthlyBuckets::default();
    for order in orders {
        match order.created_at {
            Some(ts) => {
                *out.buckets.entry(month_key(ts)).or_insert(0) += selector(order);
            }
            None => out.skipped += 1,
        }
    }
    out
}

/// Selector for per-month order counts.
pub fn count_selector(_order: &OrderRecord) -> i64 {
    1
}

/// Selector for per-month revenue in cents. An absent or unparsable total
/// contributes zero (the order still lands in its bucket).
pub fn revenue_selector(order: &OrderRecord) -> i64 {
    order
        .total
        .as_deref()
        .and_then(|s| s.parse::<Cents>().ok())
        .unwrap_or(Cents::ZERO)
        .raw()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(created_at: &str, total: Option<&str>) -> OrderRecord {
        serde_json::from_value(serde_json::json!({
            "id": uuid::Uuid::new_v4(),
            "created_at": created_at,
            "total": total,
        }))
        .unwrap()
    }

    #[test]
    fn month_key_is_utc_year_first_zero_padded() {
        let ts = "2024-03-05T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(month_key(ts), "2024-03");
        // An instant late on Jan 31 in a western zone is still January in UTC.
        let ts = "2024-01-31T23:59:59Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(month_key(ts), "2024-01");
    }

    #[test]
    fn counts_two_orders_in_same_month() {
        let orders = vec![
            order("2024-01-15T00:00:00Z", None),
            order("2024-01-31T23:59:59Z", None),
        ];
        let r = bucket_by_month(&orders, count_selector);
        assert_eq!(r.buckets.len(), 1);
        assert_eq!(r.buckets["2024-01"], 2);
        assert_eq!(r.skipped, 0);
    }

    #[test]
    fn empty_input_yields_empty_mapping() {
        let r = bucket_by_month(&[], count_selector);
        assert!(r.buckets.is_empty());
        assert_eq!(r.skipped, 0);
    }

    #[test]
    fn unparsable_timestamps_are_counted_not_dropped() {
        let orders = vec![
            order("2024-02-01T00:00:00Z", None),
            order("whenever", None),
            order("", None),
        ];
        let r = bucket_by_month(&orders, count_selector);
        assert_eq!(r.buckets["2024-02"], 1);
        assert_eq!(r.skipped, 2);
    }

    #[test]
    fn revenue_sums_cents_per_month() {
        let orders = vec![
            order("2024-01-10T00:00:00Z", Some("19.99")),
            order("2024-01-20T00:00:00Z", Some("5.01")),
            order("2024-02-01T00:00:00Z", Some("100")),
            order("2024-02-02T00:00:00Z", Some("not money")),
        ];
        let r = bucket_by_month(&orders, revenue_selector);
        assert_eq!(r.buckets["2024-01"], 2500);
        assert_eq!(r.buckets["2024-02"], 10_000);
    }

    #[test]
    fn buckets_iterate_chronologically() {
        let orders = vec![
            order("2024-03-01T00:00:00Z", None),
            order("2023-12-01T00:00:00Z", None),
            order("2024-01-01T00:00:00Z", None),
        ];
        let r = bucket_by_month(&orders, count_selector);
        let keys: Vec<&str> = r.buckets.keys().map(String::as_str).collect();
        assert_eq!(keys, ["2023-12", "2024-01", "2024-03"]);
    }
}
