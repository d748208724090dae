//! sf-db
//!
//! The Order Store: Postgres access for orders and products, plus the
//! [`OrderStore`] trait the HTTP layer consumes so tests can swap in an
//! in-memory store.
//!
//! The aggregator never touches this crate — handlers fetch a snapshot
//! here, hand it to `sf-aggregate`, and write results back through here.
//! Money is `numeric(12,2)` in the schema but crosses this boundary as
//! decimal text; `sf-aggregate::Cents` owns the conversion rules.

mod store;

pub use store::OrderStore;

use anyhow::{Context, Result};
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use sf_aggregate::AdjustedPrice;
use sf_schemas::{
    normalize_line_items, Fulfillment, FulfillmentPatch, NewOrder, OrderRecord, ProductRow,
};

pub const ENV_DB_URL: &str = "SF_DATABASE_URL";

/// Connect to Postgres.
pub async fn connect(url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Connect to Postgres using SF_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url =
        std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;
    connect(&url).await
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

const ORDER_COLUMNS: &str = r#"
    id,
    store_reference,
    customer_name,
    customer_email,
    total::text as total,
    line_items,
    confirmation,
    shipment_id,
    label_data,
    tracking_number,
    created_at
"#;

fn order_from_row(row: &PgRow) -> Result<OrderRecord> {
    let line_items: Option<Value> = row.try_get("line_items")?;
    Ok(OrderRecord {
        id: row.try_get("id")?,
        store_reference: row.try_get("store_reference")?,
        created_at: row.try_get("created_at")?,
        total: row.try_get("total")?,
        line_items: normalize_line_items(line_items.unwrap_or(Value::Null)),
        customer_name: row.try_get("customer_name")?,
        customer_email: row.try_get("customer_email")?,
        fulfillment: Fulfillment {
            confirmation: row.try_get("confirmation")?,
            shipment_id: row.try_get("shipment_id")?,
            label_data: row.try_get("label_data")?,
            tracking_number: row.try_get("tracking_number")?,
        },
    })
}

/// Fetch all orders, optionally filtered to one storefront.
///
/// This is the aggregator's input snapshot; no pagination — the aggregation
/// is a full scan by design.
pub async fn fetch_orders(pool: &PgPool, store: Option<Uuid>) -> Result<Vec<OrderRecord>> {
    let sql = format!(
        "select {ORDER_COLUMNS} from orders where $1::uuid is null or store_reference = $1 \
         order by created_at"
    );
    let rows = sqlx::query(&sql)
        .bind(store)
        .fetch_all(pool)
        .await
        .context("fetch_orders failed")?;

    rows.iter().map(order_from_row).collect()
}

/// Insert a new order and return the stored row.
pub async fn insert_order(pool: &PgPool, new: &NewOrder) -> Result<OrderRecord> {
    let line_items =
        serde_json::to_value(&new.line_items).context("serialize line_items failed")?;
    let sql = format!(
        r#"
        insert into orders (store_reference, customer_name, customer_email, total, line_items)
        values ($1, $2, $3, $4::numeric, $5)
        returning {ORDER_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(new.store_reference)
        .bind(&new.customer_name)
        .bind(&new.customer_email)
        .bind(&new.total)
        .bind(&line_items)
        .fetch_one(pool)
        .await
        .context("insert_order failed")?;

    order_from_row(&row)
}

/// Apply a partial fulfillment update to one order.
///
/// Only fields present in the patch are written (the rest keep their
/// current value). Returns `None` when the order does not exist. An empty
/// patch is a caller error — reject it before calling.
pub async fn update_fulfillment(
    pool: &PgPool,
    order_id: Uuid,
    patch: &FulfillmentPatch,
) -> Result<Option<OrderRecord>> {
    anyhow::ensure!(!patch.is_empty(), "update_fulfillment: empty patch");

    let sql = format!(
        r#"
        update orders
        set confirmation    = coalesce($2, confirmation),
            shipment_id     = coalesce($3, shipment_id),
            label_data      = coalesce($4, label_data),
            tracking_number = coalesce($5, tracking_number),
            updated_at      = now()
        where id = $1
        returning {ORDER_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(order_id)
        .bind(&patch.confirmation)
        .bind(&patch.shipment_id)
        .bind(&patch.label_data)
        .bind(&patch.tracking_number)
        .fetch_optional(pool)
        .await
        .context("update_fulfillment failed")?;

    row.as_ref().map(order_from_row).transpose()
}

/// Order count for one user's storefront.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserOrderCount {
    pub storefront_uuid: Uuid,
    pub order_count: i64,
}

/// Resolve the user's storefront and count its orders.
/// Returns `None` when the user has no storefront.
pub async fn count_orders_for_user(pool: &PgPool, user: Uuid) -> Result<Option<UserOrderCount>> {
    let storefront: Option<(Uuid,)> = sqlx::query_as(
        "select storefront_uuid from storefronts where user_reference = $1",
    )
    .bind(user)
    .fetch_optional(pool)
    .await
    .context("storefront lookup failed")?;

    let Some((storefront_uuid,)) = storefront else {
        return Ok(None);
    };

    let (order_count,): (i64,) = sqlx::query_as(
        "select count(*)::bigint from orders where store_reference = $1",
    )
    .bind(storefront_uuid)
    .fetch_one(pool)
    .await
    .context("order count failed")?;

    Ok(Some(UserOrderCount {
        storefront_uuid,
        order_count,
    }))
}

/// Fetch all products for one storefront (bulk-adjustment input).
pub async fn fetch_products(pool: &PgPool, store: Uuid) -> Result<Vec<ProductRow>> {
    let rows = sqlx::query(
        r#"
        select id, store_reference, base_price::text as base_price,
               current_price::text as current_price
        from products
        where store_reference = $1
        order by id
        "#,
    )
    .bind(store)
    .fetch_all(pool)
    .await
    .context("fetch_products failed")?;

    rows.iter()
        .map(|row| {
            Ok(ProductRow {
                id: row.try_get("id")?,
                store_reference: row.try_get("store_reference")?,
                base_price: row.try_get("base_price")?,
                current_price: row.try_get("current_price")?,
            })
        })
        .collect()
}

/// Bulk write-back of adjusted prices. Runs in one transaction so a partial
/// adjustment is never visible; returns the number of rows updated.
pub async fn apply_price_adjustments(
    pool: &PgPool,
    adjustments: &[AdjustedPrice],
) -> Result<u64> {
    let mut tx = pool.begin().await.context("begin price adjustment tx")?;
    let mut updated = 0u64;

    for adj in adjustments {
        let res = sqlx::query(
            r#"
            update products
            set current_price = $2::numeric,
                updated_at = now()
            where id = $1
            "#,
        )
        .bind(adj.id)
        .bind(adj.adjusted_price.to_string())
        .execute(&mut *tx)
        .await
        .context("price adjustment update failed")?;
        updated += res.rows_affected();
    }

    tx.commit().await.context("commit price adjustment tx")?;
    Ok(updated)
}

/// Production [`OrderStore`] backed by a Postgres pool.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl OrderStore for PgOrderStore {
    async fn fetch_orders(&self, store: Option<Uuid>) -> Result<Vec<OrderRecord>> {
        fetch_orders(&self.pool, store).await
    }

    async fn insert_order(&self, new: &NewOrder) -> Result<OrderRecord> {
        insert_order(&self.pool, new).await
    }

    async fn update_fulfillment(
        &self,
        order_id: Uuid,
        patch: &FulfillmentPatch,
    ) -> Result<Option<OrderRecord>> {
        update_fulfillment(&self.pool, order_id, patch).await
    }

    async fn count_orders_for_user(&self, user: Uuid) -> Result<Option<UserOrderCount>> {
        count_orders_for_user(&self.pool, user).await
    }

    async fn fetch_products(&self, store: Uuid) -> Result<Vec<ProductRow>> {
        fetch_products(&self.pool, store).await
    }

    async fn apply_price_adjustments(&self, adjustments: &[AdjustedPrice]) -> Result<u64> {
        apply_price_adjustments(&self.pool, adjustments).await
    }
}
