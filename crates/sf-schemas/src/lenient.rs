//! Lenient deserializers for externally-shaped order JSON.
//!
//! Coercion rules (applied per field, never failing the whole document):
//! - quantity: integer >= 0 kept; numeric string parsed; negative, float,
//!   null, missing, or garbage -> 0.
//! - product id: string kept; number stringified; anything else -> None.
//! - line_items: array kept; bare object wrapped as a one-element sequence;
//!   null/missing -> empty.
//! - created_at: RFC 3339 or `%Y-%m-%d %H:%M:%S` (assumed UTC) or bare date;
//!   anything else -> None.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::LineItem;

/// Coerce an arbitrary JSON value to a non-negative integer quantity.
///
/// This is the single place the "malformed quantity means zero" rule lives;
/// exposed so the aggregation tests can assert it directly.
pub fn coerce_quantity(v: &Value) -> u32 {
    match v {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u32::try_from(u).unwrap_or(u32::MAX)
            } else {
                // Negative or fractional: not a valid quantity.
                0
            }
        }
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(n) if n >= 0 => u32::try_from(n).unwrap_or(u32::MAX),
            _ => 0,
        },
        _ => 0,
    }
}

pub(crate) fn quantity<'de, D>(d: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    Ok(coerce_quantity(&v))
}

pub(crate) fn opt_id<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub(crate) fn line_items<'de, D>(d: D) -> Result<Vec<LineItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    Ok(normalize_line_items(v))
}

/// Normalize a raw `line_items` JSON value (array, bare object, or null)
/// into a clean sequence. This is what the serde path uses; the store's row
/// mapper calls it directly on the jsonb column.
pub fn normalize_line_items(v: Value) -> Vec<LineItem> {
    match v {
        Value::Array(items) => items.into_iter().filter_map(item_from_value).collect(),
        obj @ Value::Object(_) => item_from_value(obj).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn item_from_value(v: Value) -> Option<LineItem> {
    // LineItem's own field deserializers are total, so this only rejects
    // non-object entries (e.g. a stray string inside the array).
    serde_json::from_value::<LineItem>(v).ok()
}

pub(crate) fn opt_datetime<'de, D>(d: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    let Value::String(s) = v else {
        return Ok(None);
    };
    Ok(parse_datetime(&s))
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}
