//! User JWT authentication

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};
use crate::state::AppState;

const JWT_EXPIRY_HOURS: i64 = 24;

/// Account role stored on the user row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_db(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(Role::Customer),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// JWT claims for user authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct UserClaims {
    /// User id (stringified)
    pub sub: String,
    /// User email
    pub email: String,
    /// Account role
    pub role: Role,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated user identity extracted from a JWT
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct UserIdentity {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

/// Create a JWT token for a user
pub fn create_token(
    user_id: i64,
    email: &str,
    role: Role,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = UserClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role,
        exp: (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decode and validate a token, returning its claims
pub fn verify_token(token: &str, secret: &str) -> Result<UserClaims, jsonwebtoken::errors::Error> {
    let data = jsonwebtoken::decode::<UserClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

fn identity_from_claims(claims: UserClaims) -> Result<UserIdentity, AppError> {
    let user_id = claims
        .sub
        .parse()
        .map_err(|_| AppError::new(ErrorCode::TokenInvalid))?;
    Ok(UserIdentity {
        user_id,
        email: claims.email,
        role: claims.role,
    })
}

/// Middleware that extracts and verifies the user JWT from the Authorization
/// header, inserting a [`UserIdentity`] extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::new(ErrorCode::NotAuthenticated))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::new(ErrorCode::TokenInvalid))?;

    let claims = verify_token(token, &state.jwt_secret).map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        AppError::new(ErrorCode::TokenExpired)
    })?;

    let identity = identity_from_claims(claims)?;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Middleware gating a route tree to admin accounts; must run after
/// [`auth_middleware`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let identity = request
        .extensions()
        .get::<UserIdentity>()
        .ok_or_else(|| AppError::new(ErrorCode::NotAuthenticated))?;

    if !identity.role.is_admin() {
        return Err(AppError::new(ErrorCode::AdminRequired));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-jwt-secret";

    #[test]
    fn test_token_roundtrip() {
        let token = create_token(42, "admin@example.com", Role::Admin, SECRET).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "admin@example.com");
        assert_eq!(claims.role, Role::Admin);

        let identity = identity_from_claims(claims).unwrap();
        assert_eq!(identity.user_id, 42);
        assert!(identity.role.is_admin());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token(1, "a@b.com", Role::Customer, SECRET).unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(verify_token("not.a.token", SECRET).is_err());
    }

    #[test]
    fn test_role_db_roundtrip() {
        assert_eq!(Role::from_db("customer"), Some(Role::Customer));
        assert_eq!(Role::from_db("admin"), Some(Role::Admin));
        assert_eq!(Role::from_db("superuser"), None);
        assert_eq!(Role::Admin.as_db(), "admin");
        assert!(!Role::Customer.is_admin());
    }
}
