//! Product catalog queries

use sqlx::PgPool;

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub user_id: Option<i64>,
    pub image: Option<String>,
    pub brand: String,
    pub category: String,
    pub count_in_stock: i32,
    pub num_reviews: i32,
    pub rating: f64,
    pub description: Option<String>,
    pub featured: bool,
    pub size: Option<String>,
    pub color: Option<String>,
    pub gender: Option<String>,
    pub on_sale: bool,
    pub sale_price: Option<f64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Optional catalog filters; absent fields do not constrain the query
#[derive(Debug, Default)]
pub struct ProductFilters {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub gender: Option<String>,
    pub featured: Option<bool>,
}

const FILTER_WHERE: &str = "($1::text IS NULL OR name ILIKE '%' || $1 || '%')
       AND ($2::text IS NULL OR category = $2)
       AND ($3::text IS NULL OR gender = $3)
       AND ($4::boolean IS NULL OR featured = $4)";

pub async fn list(
    pool: &PgPool,
    filters: &ProductFilters,
    limit: i64,
    offset: i64,
) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT * FROM products
         WHERE {FILTER_WHERE}
         ORDER BY created_at DESC, id DESC
         LIMIT $5 OFFSET $6"
    ))
    .bind(&filters.keyword)
    .bind(&filters.category)
    .bind(&filters.gender)
    .bind(filters.featured)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, filters: &ProductFilters) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products WHERE {FILTER_WHERE}"))
        .bind(&filters.keyword)
        .bind(&filters.category)
        .bind(&filters.gender)
        .bind(filters.featured)
        .fetch_one(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn top_rated(pool: &PgPool, limit: i64) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products ORDER BY rating DESC, id LIMIT $1")
        .bind(limit)
        .fetch_all(pool)
        .await
}

/// Fields accepted on create and full update
#[derive(Debug, serde::Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub price: f64,
    pub brand: String,
    pub category: String,
    pub count_in_stock: i32,
    pub image: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub featured: bool,
    pub size: Option<String>,
    pub color: Option<String>,
    pub gender: Option<String>,
    #[serde(default)]
    pub on_sale: bool,
    pub sale_price: Option<f64>,
}

pub async fn create(
    pool: &PgPool,
    user_id: i64,
    input: &ProductInput,
    now: i64,
) -> Result<Product, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO products (name, price, user_id, image, brand, category, count_in_stock,
                               description, featured, size, color, gender, on_sale, sale_price,
                               created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)
         RETURNING *",
    )
    .bind(&input.name)
    .bind(input.price)
    .bind(user_id)
    .bind(&input.image)
    .bind(&input.brand)
    .bind(&input.category)
    .bind(input.count_in_stock)
    .bind(&input.description)
    .bind(input.featured)
    .bind(&input.size)
    .bind(&input.color)
    .bind(&input.gender)
    .bind(input.on_sale)
    .bind(input.sale_price)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    input: &ProductInput,
    now: i64,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE products SET
            name = $2, price = $3, image = $4, brand = $5, category = $6,
            count_in_stock = $7, description = $8, featured = $9, size = $10,
            color = $11, gender = $12, on_sale = $13, sale_price = $14, updated_at = $15
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&input.name)
    .bind(input.price)
    .bind(&input.image)
    .bind(&input.brand)
    .bind(&input.category)
    .bind(input.count_in_stock)
    .bind(&input.description)
    .bind(input.featured)
    .bind(&input.size)
    .bind(&input.color)
    .bind(&input.gender)
    .bind(input.on_sale)
    .bind(input.sale_price)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_all(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products").execute(pool).await?;
    Ok(result.rows_affected())
}

#[derive(serde::Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

pub async fn count_total(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await
}

pub async fn count_out_of_stock(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE count_in_stock = 0")
        .fetch_one(pool)
        .await
}

pub async fn count_low_stock(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM products WHERE count_in_stock > 0 AND count_in_stock < 10",
    )
    .fetch_one(pool)
    .await
}

pub async fn counts_by_category(pool: &PgPool) -> Result<Vec<CategoryCount>, sqlx::Error> {
    sqlx::query_as(
        "SELECT category, COUNT(*) AS count FROM products GROUP BY category ORDER BY category",
    )
    .fetch_all(pool)
    .await
}
