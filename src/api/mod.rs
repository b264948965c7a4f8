//! API routes
//!
//! Each domain module exposes a `router(state)` that nests its own paths and
//! applies its own auth layers; [`create_router`] merges them.

pub mod admin_ws;
pub mod analytics;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod products;
pub mod users;
pub mod webhook;

use axum::Router;
use axum::routing::get;

use crate::error::{AppError, ErrorCode};
use crate::state::AppState;

/// Result type for JSON handlers
pub type ApiResult<T> = Result<axum::Json<T>, AppError>;

/// Map an infrastructure error to an opaque internal error, logging the cause
pub(crate) fn internal<E: std::fmt::Display>(err: E) -> AppError {
    tracing::error!("Internal error: {err}");
    AppError::new(ErrorCode::InternalError)
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_check))
        .merge(auth::router())
        .merge(products::router(&state))
        .merge(cart::router(&state))
        .merge(checkout::router(&state))
        .merge(orders::router(&state))
        .merge(users::router(&state))
        .merge(analytics::router(&state))
        .merge(admin_ws::router())
        .with_state(state)
}
