//! Cart queries — per-user line items against live stock

use sqlx::PgPool;

#[derive(serde::Serialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Cart row joined with the live product fields the storefront renders
#[derive(serde::Serialize, sqlx::FromRow)]
pub struct CartItemWithProduct {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub name: String,
    pub price: f64,
    pub image: Option<String>,
    pub count_in_stock: i32,
    pub on_sale: bool,
    pub sale_price: Option<f64>,
    pub updated_at: i64,
}

pub async fn list_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<CartItemWithProduct>, sqlx::Error> {
    sqlx::query_as(
        "SELECT c.id, c.product_id, c.quantity, p.name, p.price, p.image,
                p.count_in_stock, p.on_sale, p.sale_price, c.updated_at
         FROM cart_items c
         JOIN products p ON p.id = c.product_id
         WHERE c.user_id = $1
         ORDER BY c.created_at DESC, c.id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Add a product to the cart, incrementing quantity if it is already there
pub async fn add(
    pool: &PgPool,
    user_id: i64,
    product_id: i64,
    quantity: i32,
    now: i64,
) -> Result<CartItem, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO cart_items (user_id, product_id, quantity, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $4)
         ON CONFLICT (user_id, product_id)
         DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity, updated_at = $4
         RETURNING *",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn find_for_user(
    pool: &PgPool,
    id: i64,
    user_id: i64,
) -> Result<Option<CartItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM cart_items WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn update_quantity(
    pool: &PgPool,
    id: i64,
    user_id: i64,
    quantity: i32,
    now: i64,
) -> Result<Option<CartItem>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE cart_items SET quantity = $3, updated_at = $4
         WHERE id = $1 AND user_id = $2
         RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(quantity)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub async fn remove(pool: &PgPool, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
