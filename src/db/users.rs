use sqlx::PgPool;

#[derive(sqlx::FromRow)]
#[allow(dead_code)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub role: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// User row without the password hash, safe to serialize
#[derive(serde::Serialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: i64,
    pub updated_at: i64,
}

const PROFILE_COLUMNS: &str = "id, name, email, role, created_at, updated_at";

pub async fn create(
    pool: &PgPool,
    name: &str,
    email: &str,
    hashed_password: &str,
    role: &str,
    now: i64,
) -> Result<UserProfile, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO users (name, email, hashed_password, role, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $5)
         RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(name)
    .bind(email)
    .bind(hashed_password)
    .bind(role)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_profile(pool: &PgPool, id: i64) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list(pool: &PgPool) -> Result<Vec<UserProfile>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {PROFILE_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await
}

/// Update name/email/role, keeping current values for absent fields
pub async fn update(
    pool: &PgPool,
    id: i64,
    name: Option<&str>,
    email: Option<&str>,
    role: Option<&str>,
    now: i64,
) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE users SET
            name = COALESCE($2, name),
            email = COALESCE($3, email),
            role = COALESCE($4, role),
            updated_at = $5
         WHERE id = $1
         RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(role)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Per-user order count, for the admin "most active customers" panel
#[derive(serde::Serialize, sqlx::FromRow)]
pub struct UserOrderCount {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub order_count: i64,
}

pub async fn top_by_order_count(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<UserOrderCount>, sqlx::Error> {
    sqlx::query_as(
        "SELECT u.id, u.name, u.email, COUNT(o.id) AS order_count
         FROM users u
         LEFT JOIN orders o ON o.user_id = u.id
         GROUP BY u.id
         ORDER BY order_count DESC, u.id
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
}

pub async fn count_admins(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
        .fetch_one(pool)
        .await
}
