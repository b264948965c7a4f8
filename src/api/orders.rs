//! Order endpoints: paginated listing, detail, admin transitions, stats

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Extension, Json, Router, middleware};
use serde::{Deserialize, Serialize};

use crate::auth::UserIdentity;
use crate::auth::user_auth::{auth_middleware, require_admin};
use crate::db;
use crate::db::orders::{Order, OrderItem, OrderStatus, SalesStats};
use crate::error::{AppError, ErrorCode};
use crate::live::AdminEvent;
use crate::state::AppState;
use crate::util::{now_millis, positive_param, total_pages};

use super::{ApiResult, internal};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

pub fn router(state: &AppState) -> Router<AppState> {
    let authed = Router::new()
        .route("/", get(list_orders))
        .route("/mine", get(my_orders))
        .route("/{id}", get(get_order))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin = Router::new()
        .route("/stats", get(sales_stats))
        .route("/{id}/pay", put(mark_paid))
        .route("/{id}/deliver", put(mark_delivered))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new().nest("/api/orders", authed.merge(admin))
}

#[derive(Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub order_items: Vec<OrderItem>,
}

#[derive(Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    // Kept as strings so a non-numeric value falls back to the default
    // instead of failing extraction
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Serialize)]
pub struct OrdersPage {
    pub orders: Vec<Order>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_orders: i64,
}

/// GET /api/orders?status=&page=&limit=
///
/// Admins see every order; everyone else sees their own.
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Query(query): Query<OrdersQuery>,
) -> ApiResult<OrdersPage> {
    let per_page =
        positive_param(query.limit.as_deref(), DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let page = positive_param(query.page.as_deref(), 1);
    let offset = (page - 1) * per_page;

    let status = query.status.filter(|s| !s.is_empty());
    if let Some(s) = status.as_deref()
        && OrderStatus::from_db(s).is_none()
    {
        return Err(AppError::validation(format!("Unknown order status: {s}")));
    }
    let user_filter = if identity.role.is_admin() {
        None
    } else {
        Some(identity.user_id)
    };

    let total = db::orders::count(&state.pool, status.as_deref(), user_filter)
        .await
        .map_err(internal)?;
    let orders = db::orders::list(
        &state.pool,
        status.as_deref(),
        user_filter,
        per_page,
        offset,
    )
    .await
    .map_err(internal)?;

    Ok(Json(OrdersPage {
        orders,
        current_page: page,
        total_pages: total_pages(total, per_page),
        total_orders: total,
    }))
}

/// GET /api/orders/mine
pub async fn my_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Vec<OrderWithItems>> {
    let orders = db::orders::list_for_user(&state.pool, identity.user_id)
        .await
        .map_err(internal)?;

    let mut result = Vec::with_capacity(orders.len());
    for order in orders {
        let order_items = db::orders::items_for_order(&state.pool, order.id)
            .await
            .map_err(internal)?;
        result.push(OrderWithItems { order, order_items });
    }

    Ok(Json(result))
}

/// GET /api/orders/{id}
///
/// An order is visible only to its owner or an admin.
pub async fn get_order(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<OrderWithItems> {
    let order = db::orders::find_by_id(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    if order.user_id != Some(identity.user_id) && !identity.role.is_admin() {
        return Err(AppError::permission_denied(
            "Not authorized to view this order",
        ));
    }

    let order_items = db::orders::items_for_order(&state.pool, order.id)
        .await
        .map_err(internal)?;

    Ok(Json(OrderWithItems { order, order_items }))
}

fn publish_change(state: &AppState, order: &Order) {
    state.admin_hub.publish(AdminEvent::OrderChanged {
        order_id: order.id,
        status: order.status.clone(),
        payment_status: order.payment_status.clone(),
        total_amount: order.total_amount,
        customer_email: order.customer_email.clone(),
    });
}

/// PUT /api/orders/{id}/pay (admin)
pub async fn mark_paid(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Order> {
    let order = db::orders::mark_paid(&state.pool, id, now_millis())
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    tracing::info!(order_id = order.id, "Order marked as paid");
    publish_change(&state, &order);
    Ok(Json(order))
}

/// PUT /api/orders/{id}/deliver (admin)
pub async fn mark_delivered(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Order> {
    let order = db::orders::mark_delivered(&state.pool, id, now_millis())
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    tracing::info!(order_id = order.id, "Order marked as delivered");
    publish_change(&state, &order);
    Ok(Json(order))
}

/// GET /api/orders/stats (admin)
pub async fn sales_stats(State(state): State<AppState>) -> ApiResult<SalesStats> {
    let stats = db::orders::sales_stats(&state.pool)
        .await
        .map_err(internal)?;
    Ok(Json(stats))
}
