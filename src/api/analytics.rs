//! Analytics endpoints — read-only aggregates for the admin dashboard

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router, middleware};

use crate::auth::user_auth::{auth_middleware, require_admin};
use crate::db;
use crate::state::AppState;

use super::{ApiResult, internal};

pub fn router(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", get(overview))
        .route("/users", get(user_stats))
        .route("/orders", get(order_stats))
        .route("/products", get(product_stats))
        .route("/revenue", get(revenue))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new().nest("/api/analytics", admin)
}

/// GET /api/analytics
pub async fn overview(State(state): State<AppState>) -> ApiResult<db::analytics::Overview> {
    let overview = db::analytics::overview(&state.pool)
        .await
        .map_err(internal)?;
    Ok(Json(overview))
}

/// GET /api/analytics/users
pub async fn user_stats(
    State(state): State<AppState>,
) -> ApiResult<Vec<db::analytics::CreatedAtEntry>> {
    let users = db::analytics::user_signups(&state.pool)
        .await
        .map_err(internal)?;
    Ok(Json(users))
}

/// GET /api/analytics/orders
pub async fn order_stats(
    State(state): State<AppState>,
) -> ApiResult<Vec<db::analytics::OrderEntry>> {
    let orders = db::analytics::order_entries(&state.pool)
        .await
        .map_err(internal)?;
    Ok(Json(orders))
}

/// GET /api/analytics/products
pub async fn product_stats(
    State(state): State<AppState>,
) -> ApiResult<Vec<db::analytics::ProductEntry>> {
    let products = db::analytics::product_entries(&state.pool)
        .await
        .map_err(internal)?;
    Ok(Json(products))
}

/// GET /api/analytics/revenue
pub async fn revenue(State(state): State<AppState>) -> ApiResult<serde_json::Value> {
    let total_revenue = db::analytics::total_revenue(&state.pool)
        .await
        .map_err(internal)?;
    Ok(Json(serde_json::json!({ "total_revenue": total_revenue })))
}
