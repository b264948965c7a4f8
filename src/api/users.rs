//! Admin user management endpoints

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router, middleware};
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::auth::user_auth::{auth_middleware, require_admin};
use crate::db;
use crate::db::users::{UserOrderCount, UserProfile};
use crate::error::{AppError, ErrorCode};
use crate::state::AppState;
use crate::util::now_millis;

use super::{ApiResult, internal};

const TOP_CUSTOMERS: i64 = 5;

pub fn router(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", get(list_users))
        .route("/stats", get(user_stats))
        .route(
            "/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new().nest("/api/users", admin)
}

/// GET /api/users (admin)
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<UserProfile>> {
    let users = db::users::list(&state.pool).await.map_err(internal)?;
    Ok(Json(users))
}

/// GET /api/users/{id} (admin)
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<UserProfile> {
    let user = db::users::find_profile(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(user))
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// PUT /api/users/{id} (admin)
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<UserProfile> {
    if let Some(role) = req.role.as_deref()
        && Role::from_db(role).is_none()
    {
        return Err(AppError::validation("Unknown role"));
    }
    if let Some(email) = req.email.as_deref()
        && !email.contains('@')
    {
        return Err(AppError::validation("Invalid email address"));
    }

    let user = match db::users::update(
        &state.pool,
        id,
        req.name.as_deref(),
        req.email.as_deref(),
        req.role.as_deref(),
        now_millis(),
    )
    .await
    {
        Ok(Some(user)) => user,
        Ok(None) => return Err(AppError::new(ErrorCode::UserNotFound)),
        Err(e) if db::is_unique_violation(&e) => {
            return Err(AppError::new(ErrorCode::EmailExists));
        }
        Err(e) => return Err(internal(e)),
    };

    Ok(Json(user))
}

/// DELETE /api/users/{id} (admin)
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    let deleted = db::users::delete(&state.pool, id).await.map_err(internal)?;
    if !deleted {
        return Err(AppError::new(ErrorCode::UserNotFound));
    }
    Ok(Json(serde_json::json!({ "message": "User removed" })))
}

#[derive(Serialize)]
pub struct UserStats {
    pub total_users: i64,
    pub admin_users: i64,
    pub regular_users: i64,
    pub active_users: Vec<UserOrderCount>,
}

/// GET /api/users/stats (admin)
pub async fn user_stats(State(state): State<AppState>) -> ApiResult<UserStats> {
    let total_users = db::users::count(&state.pool).await.map_err(internal)?;
    let admin_users = db::users::count_admins(&state.pool).await.map_err(internal)?;
    let active_users = db::users::top_by_order_count(&state.pool, TOP_CUSTOMERS)
        .await
        .map_err(internal)?;

    Ok(Json(UserStats {
        total_users,
        admin_users,
        regular_users: total_users - admin_users,
        active_users,
    }))
}
