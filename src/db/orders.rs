//! Order queries — transactional order materialization and the query surface
//!
//! The orders table carries the idempotency guard: `payment_intent_id` is
//! unique, so a racing duplicate confirmation loses with a constraint
//! violation instead of creating a second order.

use sqlx::PgPool;

/// Order fulfilment state — linear progression, no transition back to pending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_db(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "paid" => Some(OrderStatus::Paid),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

/// Provider-side payment state, tracked alongside the order status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_db(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    #[allow(dead_code)]
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub user_id: Option<i64>,
    pub payment_intent_id: String,
    pub customer_email: String,
    pub customer_name: String,
    pub total_amount: f64,
    pub status: String,
    pub payment_status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Immutable snapshot of one purchased product at order time
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: Option<i64>,
    pub name: String,
    pub quantity: i32,
    pub price: f64,
    pub image: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub created_at: i64,
}

pub struct NewOrder<'a> {
    pub user_id: i64,
    pub payment_intent_id: &'a str,
    pub customer_email: &'a str,
    pub customer_name: &'a str,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub now: i64,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub name: String,
    pub quantity: i32,
    pub price: f64,
    pub image: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Insert the order row and bulk-insert its items in one transaction.
///
/// Commit only if both succeed; any failure (including an item check
/// constraint) rolls the whole write back, so partial order state is never
/// visible. A duplicate `payment_intent_id` surfaces as a unique violation
/// for the caller to translate.
pub async fn create_with_items(
    pool: &PgPool,
    order: &NewOrder<'_>,
    items: &[NewOrderItem],
) -> Result<(Order, Vec<OrderItem>), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let created: Order = sqlx::query_as(
        "INSERT INTO orders (user_id, payment_intent_id, customer_email, customer_name,
                             total_amount, status, payment_status, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
         RETURNING *",
    )
    .bind(order.user_id)
    .bind(order.payment_intent_id)
    .bind(order.customer_email)
    .bind(order.customer_name)
    .bind(order.total_amount)
    .bind(order.status.as_db())
    .bind(order.payment_status.as_db())
    .bind(order.now)
    .fetch_one(&mut *tx)
    .await?;

    let order_ids: Vec<i64> = items.iter().map(|_| created.id).collect();
    let product_ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
    let names: Vec<String> = items.iter().map(|i| i.name.clone()).collect();
    let quantities: Vec<i32> = items.iter().map(|i| i.quantity).collect();
    let prices: Vec<f64> = items.iter().map(|i| i.price).collect();
    let images: Vec<Option<String>> = items.iter().map(|i| i.image.clone()).collect();
    let sizes: Vec<Option<String>> = items.iter().map(|i| i.size.clone()).collect();
    let colors: Vec<Option<String>> = items.iter().map(|i| i.color.clone()).collect();
    let created_ats: Vec<i64> = items.iter().map(|_| order.now).collect();

    let inserted: Vec<OrderItem> = sqlx::query_as(
        "INSERT INTO order_items (order_id, product_id, name, quantity, price,
                                  image, size, color, created_at)
         SELECT * FROM UNNEST($1::bigint[], $2::bigint[], $3::text[], $4::integer[],
                              $5::double precision[], $6::text[], $7::text[], $8::text[],
                              $9::bigint[])
         RETURNING *",
    )
    .bind(&order_ids)
    .bind(&product_ids)
    .bind(&names)
    .bind(&quantities)
    .bind(&prices)
    .bind(&images)
    .bind(&sizes)
    .bind(&colors)
    .bind(&created_ats)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok((created, inserted))
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_payment_intent(
    pool: &PgPool,
    payment_intent_id: &str,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE payment_intent_id = $1")
        .bind(payment_intent_id)
        .fetch_optional(pool)
        .await
}

pub async fn items_for_order(pool: &PgPool, order_id: i64) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(pool)
        .await
}

/// Paginated listing, newest first, ties broken by id for a stable order
pub async fn list(
    pool: &PgPool,
    status: Option<&str>,
    user_id: Option<i64>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM orders
         WHERE ($1::text IS NULL OR status = $1)
           AND ($2::bigint IS NULL OR user_id = $2)
         ORDER BY created_at DESC, id DESC
         LIMIT $3 OFFSET $4",
    )
    .bind(status)
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(
    pool: &PgPool,
    status: Option<&str>,
    user_id: Option<i64>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM orders
         WHERE ($1::text IS NULL OR status = $1)
           AND ($2::bigint IS NULL OR user_id = $2)",
    )
    .bind(status)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn mark_paid(pool: &PgPool, id: i64, now: i64) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE orders SET status = 'paid', payment_status = 'completed', updated_at = $2
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Webhook path: mark the order for a payment intent as paid.
///
/// The update is a no-op on replay (already paid), which is the only
/// idempotency guard the succeeded event needs.
pub async fn mark_paid_by_intent(
    pool: &PgPool,
    payment_intent_id: &str,
    now: i64,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE orders SET status = 'paid', payment_status = 'completed', updated_at = $2
         WHERE payment_intent_id = $1
         RETURNING *",
    )
    .bind(payment_intent_id)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub async fn mark_delivered(
    pool: &PgPool,
    id: i64,
    now: i64,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE orders SET status = 'delivered', updated_at = $2
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(now)
    .fetch_optional(pool)
    .await
}

#[derive(serde::Serialize, sqlx::FromRow)]
pub struct SalesStats {
    pub total_orders: i64,
    pub total_sales: f64,
    pub pending_orders: i64,
}

pub async fn sales_stats(pool: &PgPool) -> Result<SalesStats, sqlx::Error> {
    sqlx::query_as(
        "SELECT COUNT(*) AS total_orders,
                COALESCE(SUM(total_amount), 0) AS total_sales,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending_orders
         FROM orders",
    )
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_db_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_db(status.as_db()), Some(status));
        }
        assert_eq!(OrderStatus::from_db("refunded"), None);
    }

    #[test]
    fn test_payment_status_db_roundtrip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
        ] {
            assert_eq!(PaymentStatus::from_db(status.as_db()), Some(status));
        }
        assert_eq!(PaymentStatus::from_db("paid"), None);
    }
}
