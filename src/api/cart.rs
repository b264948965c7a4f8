//! Cart endpoints — per-user line items checked against live stock

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Extension, Json, Router, middleware};
use serde::Deserialize;

use crate::auth::UserIdentity;
use crate::auth::user_auth::auth_middleware;
use crate::db;
use crate::db::carts::{CartItem, CartItemWithProduct};
use crate::error::{AppError, ErrorCode};
use crate::state::AppState;
use crate::util::now_millis;

use super::{ApiResult, internal};

pub fn router(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/", get(get_cart).post(add_to_cart))
        .route("/{id}", put(update_cart_item).delete(remove_from_cart))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new().nest("/api/cart", routes)
}

/// GET /api/cart
pub async fn get_cart(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Vec<CartItemWithProduct>> {
    let items = db::carts::list_for_user(&state.pool, identity.user_id)
        .await
        .map_err(internal)?;
    Ok(Json(items))
}

#[derive(Deserialize)]
pub struct AddToCartRequest {
    pub product_id: i64,
    pub quantity: i32,
}

/// POST /api/cart
pub async fn add_to_cart(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(req): Json<AddToCartRequest>,
) -> ApiResult<CartItem> {
    if req.quantity < 1 {
        return Err(AppError::validation("Quantity must be at least 1"));
    }

    let product = db::products::find_by_id(&state.pool, req.product_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;

    if product.count_in_stock < req.quantity {
        return Err(AppError::new(ErrorCode::InsufficientStock));
    }

    let item = db::carts::add(
        &state.pool,
        identity.user_id,
        req.product_id,
        req.quantity,
        now_millis(),
    )
    .await
    .map_err(internal)?;

    Ok(Json(item))
}

#[derive(Deserialize)]
pub struct UpdateCartRequest {
    pub quantity: i32,
}

/// PUT /api/cart/{id}
pub async fn update_cart_item(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCartRequest>,
) -> ApiResult<CartItem> {
    if req.quantity < 1 {
        return Err(AppError::validation("Quantity must be at least 1"));
    }

    let existing = db::carts::find_for_user(&state.pool, id, identity.user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::CartItemNotFound))?;

    let product = db::products::find_by_id(&state.pool, existing.product_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;

    if product.count_in_stock < req.quantity {
        return Err(AppError::new(ErrorCode::InsufficientStock));
    }

    let item = db::carts::update_quantity(
        &state.pool,
        id,
        identity.user_id,
        req.quantity,
        now_millis(),
    )
    .await
    .map_err(internal)?
    .ok_or_else(|| AppError::new(ErrorCode::CartItemNotFound))?;

    Ok(Json(item))
}

/// DELETE /api/cart/{id}
pub async fn remove_from_cart(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    let removed = db::carts::remove(&state.pool, id, identity.user_id)
        .await
        .map_err(internal)?;
    if !removed {
        return Err(AppError::new(ErrorCode::CartItemNotFound));
    }
    Ok(Json(serde_json::json!({ "message": "Item removed from cart" })))
}
