//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration, loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Allowed CORS origin (the storefront frontend)
    pub frontend_url: String,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// JWT secret for user authentication
    pub jwt_secret: String,
}

impl Config {
    /// Require an env var: a missing or empty value is a fatal configuration
    /// error at startup, never a per-request one.
    fn require(name: &str) -> Result<String, BoxError> {
        let val = std::env::var(name).map_err(|_| format!("{name} must be set"))?;
        if val.is_empty() {
            return Err(format!("{name} must not be empty").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Ok(Self {
            database_url: Self::require("DATABASE_URL")?,
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            stripe_secret_key: Self::require("STRIPE_SECRET_KEY")?,
            stripe_webhook_secret: Self::require("STRIPE_WEBHOOK_SECRET")?,
            jwt_secret: Self::require("JWT_SECRET")?,
        })
    }
}
