//! The `OrderStore` seam between the HTTP layer and persistence.

use anyhow::Result;
use uuid::Uuid;

use sf_aggregate::AdjustedPrice;
use sf_schemas::{FulfillmentPatch, NewOrder, OrderRecord, ProductRow};

use crate::UserOrderCount;

/// Read/write contract for order and product persistence.
///
/// The production implementation is [`crate::PgOrderStore`]; scenario tests
/// use an in-memory store. Filtering and row shaping are the store's
/// responsibility — the aggregator consumes the snapshot as-is.
#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    /// Full order snapshot, optionally filtered to one storefront.
    async fn fetch_orders(&self, store: Option<Uuid>) -> Result<Vec<OrderRecord>>;

    /// Insert a new order, returning the stored row.
    async fn insert_order(&self, new: &NewOrder) -> Result<OrderRecord>;

    /// Partial fulfillment update; `None` when the order does not exist.
    /// Callers must reject an empty patch before calling.
    async fn update_fulfillment(
        &self,
        order_id: Uuid,
        patch: &FulfillmentPatch,
    ) -> Result<Option<OrderRecord>>;

    /// Storefront + order count for a user; `None` when the user has no
    /// storefront.
    async fn count_orders_for_user(&self, user: Uuid) -> Result<Option<UserOrderCount>>;

    /// All products for one storefront.
    async fn fetch_products(&self, store: Uuid) -> Result<Vec<ProductRow>>;

    /// Bulk write-back of adjusted prices; returns rows updated.
    async fn apply_price_adjustments(&self, adjustments: &[AdjustedPrice]) -> Result<u64>;
}
