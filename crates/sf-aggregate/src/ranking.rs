//! Top-seller ranking: group line-item quantities by product and rank.

use std::collections::HashMap;

use serde::Serialize;
use sf_schemas::OrderRecord;

/// Default number of top sellers returned by the analytics endpoint.
pub const DEFAULT_TOP_LIMIT: usize = 6;

/// Cumulative ordered quantity for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductTotal {
    pub product_id: String,
    pub total_quantity: u64,
}

/// Rank products by cumulative ordered quantity, descending, and return the
/// first `limit` entries (fewer if the input has fewer distinct products).
///
/// Ties keep first-encounter order — the order in which a product id first
/// appears while scanning `orders` front to back — so repeated runs on
/// identical input produce identical output.
///
/// Total over messy data: items without a product id are skipped, and
/// quantities were already coerced to non-negative integers at the serde
/// boundary, so no per-record anomaly can fail the ranking. The sum of all
/// totals in the unsliced ranking equals the sum of all input quantities.
///
/// # Panics
///
/// Panics if `limit == 0`. Asking for a top-zero list is a caller bug, not a
/// data condition.
pub fn rank_top_sellers(orders: &[OrderRecord], limit: usize) -> Vec<ProductTotal> {
    assert!(limit > 0, "rank_top_sellers: limit must be positive");

    // Accumulate in encounter order so tie-breaking is deterministic.
    let mut totals: Vec<ProductTotal> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();

    for order in orders {
        for item in &order.line_items {
            let Some(id) = item.product_id.as_deref() else {
                continue;
            };
            let qty = u64::from(item.quantity);
            match index_by_id.get(id) {
                Some(&i) => totals[i].total_quantity += qty,
                None => {
                    index_by_id.insert(id.to_string(), totals.len());
                    totals.push(ProductTotal {
                        product_id: id.to_string(),
                        total_quantity: qty,
                    });
                }
            }
        }
    }

    // Vec::sort_by is stable: equal totals keep their encounter order.
    totals.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    totals.truncate(limit);
    totals
}
