//! Authentication endpoints: register, login

use axum::routing::post;
use axum::{Json, Router, extract::State};
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::auth::user_auth::create_token;
use crate::db;
use crate::error::{AppError, ErrorCode};
use crate::state::AppState;
use crate::util::{hash_password, now_millis, verify_password};

use super::{ApiResult, internal};

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/api/auth",
        Router::new()
            .route("/register", post(register))
            .route("/login", post(login)),
    )
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();

    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    if !email.contains('@') {
        return Err(AppError::validation("Invalid email address"));
    }
    if req.password.len() < 8 {
        return Err(AppError::new(ErrorCode::PasswordTooShort));
    }

    let hashed = hash_password(&req.password).map_err(internal)?;

    let user = match db::users::create(
        &state.pool,
        name,
        &email,
        &hashed,
        Role::Customer.as_db(),
        now_millis(),
    )
    .await
    {
        Ok(user) => user,
        Err(e) if db::is_unique_violation(&e) => {
            return Err(AppError::new(ErrorCode::EmailExists));
        }
        Err(e) => return Err(internal(e)),
    };

    let role = Role::from_db(&user.role).unwrap_or(Role::Customer);
    let token = create_token(user.id, &user.email, role, &state.jwt_secret).map_err(internal)?;

    tracing::info!(user_id = user.id, "User registered");

    Ok(Json(AuthResponse {
        token,
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
    }))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/login
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let email = req.email.trim().to_lowercase();

    let user = db::users::find_by_email(&state.pool, &email)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::InvalidCredentials))?;

    if !verify_password(&req.password, &user.hashed_password) {
        return Err(AppError::new(ErrorCode::InvalidCredentials));
    }

    let role = Role::from_db(&user.role).unwrap_or(Role::Customer);
    let token = create_token(user.id, &user.email, role, &state.jwt_secret).map_err(internal)?;

    Ok(Json(AuthResponse {
        token,
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
    }))
}
