//! Bulk percent price adjustment.

use serde::Serialize;
use sf_schemas::ProductRow;
use uuid::Uuid;

use crate::{Cents, Percent};

/// One product's base price, ready for adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceInput {
    pub id: Uuid,
    pub base_price: Cents,
}

impl PriceInput {
    /// Build from a store row. `None` when the row's base price is not a
    /// parsable decimal — such rows are reported by the caller, not
    /// silently adjusted to garbage.
    pub fn from_row(row: &ProductRow) -> Option<Self> {
        Some(PriceInput {
            id: row.id,
            base_price: row.base_price.parse().ok()?,
        })
    }
}

/// One adjusted price, in the same order as the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjustedPrice {
    pub id: Uuid,
    pub adjusted_price: Cents,
}

/// Compute `base_price * (1 + percent/100)` for every item, rounded
/// half-away-from-zero at the cent boundary (see [`Cents::adjust_by`]).
///
/// Output order matches input order. A zero base maps to zero for any
/// percent; negative results are passed through unclamped.
pub fn apply_percent_adjustment(items: &[PriceInput], percent: Percent) -> Vec<AdjustedPrice> {
    items
        .iter()
        .map(|it| AdjustedPrice {
            id: it.id,
            adjusted_price: it.base_price.adjust_by(percent),
        })
        .collect()
}
