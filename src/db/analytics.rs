//! Read-only aggregates for the admin dashboard

use sqlx::PgPool;

#[derive(serde::Serialize, sqlx::FromRow)]
pub struct Overview {
    pub users_count: i64,
    pub orders_count: i64,
    pub products_count: i64,
}

pub async fn overview(pool: &PgPool) -> Result<Overview, sqlx::Error> {
    sqlx::query_as(
        "SELECT (SELECT COUNT(*) FROM users) AS users_count,
                (SELECT COUNT(*) FROM orders) AS orders_count,
                (SELECT COUNT(*) FROM products) AS products_count",
    )
    .fetch_one(pool)
    .await
}

/// Creation timestamp of one row, for frontend-side time series
#[derive(serde::Serialize, sqlx::FromRow)]
pub struct CreatedAtEntry {
    pub created_at: i64,
}

pub async fn user_signups(pool: &PgPool) -> Result<Vec<CreatedAtEntry>, sqlx::Error> {
    sqlx::query_as("SELECT created_at FROM users ORDER BY created_at")
        .fetch_all(pool)
        .await
}

#[derive(serde::Serialize, sqlx::FromRow)]
pub struct OrderEntry {
    pub total_amount: f64,
    pub created_at: i64,
}

pub async fn order_entries(pool: &PgPool) -> Result<Vec<OrderEntry>, sqlx::Error> {
    sqlx::query_as("SELECT total_amount, created_at FROM orders ORDER BY created_at")
        .fetch_all(pool)
        .await
}

#[derive(serde::Serialize, sqlx::FromRow)]
pub struct ProductEntry {
    pub name: String,
    pub created_at: i64,
}

pub async fn product_entries(pool: &PgPool) -> Result<Vec<ProductEntry>, sqlx::Error> {
    sqlx::query_as("SELECT name, created_at FROM products ORDER BY created_at")
        .fetch_all(pool)
        .await
}

pub async fn total_revenue(pool: &PgPool) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar("SELECT COALESCE(SUM(total_amount), 0) FROM orders")
        .fetch_one(pool)
        .await
}
