//! Product review queries

use sqlx::PgPool;

#[derive(serde::Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub user_id: Option<i64>,
    pub rating: i32,
    pub comment: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Insert a review and recompute the product's aggregate rating in the same
/// transaction, so `rating`/`num_reviews` never drift from the review rows.
///
/// The (product_id, user_id) unique constraint rejects duplicate reviews.
pub async fn create_and_refresh_rating(
    pool: &PgPool,
    product_id: i64,
    user_id: i64,
    rating: i32,
    comment: &str,
    now: i64,
) -> Result<Review, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let review: Review = sqlx::query_as(
        "INSERT INTO reviews (product_id, user_id, rating, comment, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $5)
         RETURNING *",
    )
    .bind(product_id)
    .bind(user_id)
    .bind(rating)
    .bind(comment)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE products SET
            num_reviews = (SELECT COUNT(*) FROM reviews WHERE product_id = $1),
            rating = COALESCE((SELECT AVG(rating)::double precision
                               FROM reviews WHERE product_id = $1), 0),
            updated_at = $2
         WHERE id = $1",
    )
    .bind(product_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(review)
}

pub async fn list_for_product(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<Review>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM reviews WHERE product_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await
}
