//! Shared application state

use sqlx::PgPool;

use crate::config::Config;
use crate::live::AdminHub;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Stripe credentials, grouped so handlers take one field
#[derive(Clone)]
pub struct StripeKeys {
    /// Secret API key
    pub secret_key: String,
    /// Webhook signing secret
    pub webhook_secret: String,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Stripe credentials
    pub stripe: StripeKeys,
    /// JWT secret for user authentication
    pub jwt_secret: String,
    /// Admin order-notification hub
    pub admin_hub: AdminHub,
}

impl AppState {
    /// Create a new AppState: connect the pool and run embedded migrations
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self {
            pool,
            stripe: StripeKeys {
                secret_key: config.stripe_secret_key.clone(),
                webhook_secret: config.stripe_webhook_secret.clone(),
            },
            jwt_secret: config.jwt_secret.clone(),
            admin_hub: AdminHub::new(),
        })
    }
}
