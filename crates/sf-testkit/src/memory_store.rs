//! Vec-backed `OrderStore`.

use std::collections::HashMap;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use sf_aggregate::AdjustedPrice;
use sf_db::{OrderStore, UserOrderCount};
use sf_schemas::{Fulfillment, FulfillmentPatch, NewOrder, OrderRecord, ProductRow};

#[derive(Default)]
struct Inner {
    orders: Vec<OrderRecord>,
    products: Vec<ProductRow>,
    /// user_reference -> storefront_uuid
    storefronts: HashMap<Uuid, Uuid>,
}

/// In-memory order/product store with the same observable semantics as the
/// Postgres implementation.
#[derive(Default)]
pub struct MemoryOrderStore {
    inner: Mutex<Inner>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_orders(&self, orders: Vec<OrderRecord>) {
        self.inner.lock().await.orders.extend(orders);
    }

    pub async fn seed_products(&self, products: Vec<ProductRow>) {
        self.inner.lock().await.products.extend(products);
    }

    pub async fn seed_storefront(&self, user: Uuid, storefront: Uuid) {
        self.inner.lock().await.storefronts.insert(user, storefront);
    }

    pub async fn orders(&self) -> Vec<OrderRecord> {
        self.inner.lock().await.orders.clone()
    }

    pub async fn products(&self) -> Vec<ProductRow> {
        self.inner.lock().await.products.clone()
    }
}

#[async_trait::async_trait]
impl OrderStore for MemoryOrderStore {
    async fn fetch_orders(&self, store: Option<Uuid>) -> Result<Vec<OrderRecord>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .orders
            .iter()
            .filter(|o| store.is_none() || o.store_reference == store)
            .cloned()
            .collect())
    }

    async fn insert_order(&self, new: &NewOrder) -> Result<OrderRecord> {
        let record = OrderRecord {
            id: Uuid::new_v4(),
            store_reference: Some(new.store_reference),
            created_at: Some(Utc::now()),
            total: Some(new.total.clone()),
            line_items: new.line_items.clone(),
            customer_name: Some(new.customer_name.clone()),
            customer_email: Some(new.customer_email.clone()),
            fulfillment: Fulfillment::default(),
        };
        self.inner.lock().await.orders.push(record.clone());
        Ok(record)
    }

    async fn update_fulfillment(
        &self,
        order_id: Uuid,
        patch: &FulfillmentPatch,
    ) -> Result<Option<OrderRecord>> {
        anyhow::ensure!(!patch.is_empty(), "update_fulfillment: empty patch");

        let mut inner = self.inner.lock().await;
        let Some(order) = inner.orders.iter_mut().find(|o| o.id == order_id) else {
            return Ok(None);
        };
        if let Some(v) = &patch.confirmation {
            order.fulfillment.confirmation = Some(v.clone());
        }
        if let Some(v) = &patch.shipment_id {
            order.fulfillment.shipment_id = Some(v.clone());
        }
        if let Some(v) = &patch.label_data {
            order.fulfillment.label_data = Some(v.clone());
        }
        if let Some(v) = &patch.tracking_number {
            order.fulfillment.tracking_number = Some(v.clone());
        }
        Ok(Some(order.clone()))
    }

    async fn count_orders_for_user(&self, user: Uuid) -> Result<Option<UserOrderCount>> {
        let inner = self.inner.lock().await;
        let Some(&storefront_uuid) = inner.storefronts.get(&user) else {
            return Ok(None);
        };
        let order_count = inner
            .orders
            .iter()
            .filter(|o| o.store_reference == Some(storefront_uuid))
            .count() as i64;
        Ok(Some(UserOrderCount {
            storefront_uuid,
            order_count,
        }))
    }

    async fn fetch_products(&self, store: Uuid) -> Result<Vec<ProductRow>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .products
            .iter()
            .filter(|p| p.store_reference == store)
            .cloned()
            .collect())
    }

    async fn apply_price_adjustments(&self, adjustments: &[AdjustedPrice]) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        let mut updated = 0u64;
        for adj in adjustments {
            if let Some(p) = inner.products.iter_mut().find(|p| p.id == adj.id) {
                p.current_price = Some(adj.adjusted_price.to_string());
                updated += 1;
            }
        }
        Ok(updated)
    }
}
