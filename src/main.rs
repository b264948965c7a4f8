//! reefstore — e-commerce storefront backend
//!
//! Long-running service that:
//! - Serves the storefront REST API (catalog, carts, orders, users)
//! - Orchestrates Stripe payment intents and order materialization
//! - Ingests signature-verified Stripe webhooks
//! - Pushes order-change events to connected admin sessions

mod api;
mod auth;
mod config;
mod db;
mod error;
mod live;
mod state;
mod stripe;
mod util;

use config::Config;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reefstore=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting reefstore (env: {})", config.environment);

    // Initialize application state (pool + migrations)
    let state = AppState::new(&config).await?;

    let cors = build_cors(&config)?;
    let app = api::create_router(state)
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("reefstore listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Allow the configured storefront origin with credentials
fn build_cors(config: &Config) -> Result<tower_http::cors::CorsLayer, BoxError> {
    use axum::http::{HeaderValue, Method, header};

    let origin: HeaderValue = config
        .frontend_url
        .parse()
        .map_err(|_| format!("Invalid FRONTEND_URL: {}", config.frontend_url))?;

    Ok(tower_http::cors::CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true))
}
