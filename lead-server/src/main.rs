//! SmartConvert Lead Scoring Server
//!
//! CRM backend that scores bank-marketing leads for a term-deposit campaign.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  SMARTCONVERT LEAD SCORING                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────┐  ┌─────────────────────────┐ │
//! │  │  API      │  │  CSV      │  │  Scoring Service        │ │
//! │  │  Gateway  │  │  Ingest   │  │  (leadscore-core:       │ │
//! │  │  (Axum)   │  │           │  │   XGBoost + TreeSHAP)   │ │
//! │  └─────┬─────┘  └─────┬─────┘  └────────────┬────────────┘ │
//! │        └──────────────┼──────────────────────┘              │
//! │                       ▼                                     │
//! │                ┌─────────────┐                             │
//! │                │ PostgreSQL  │                             │
//! │                └─────────────┘                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod error;
mod handlers;
mod ingest;
mod models;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post, put},
    Router,
};
use leadscore_core::{ArtifactStore, ScoringService};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "leadscore_server=debug,leadscore_core=info,tower_http=debug".into());
    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("SmartConvert Lead Scoring Server starting...");
    tracing::info!("Database: {}", config.database_url.split('@').last().unwrap_or("***"));

    // Initialize database pool
    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to create database pool")?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    // Load model artifacts; the server still starts without them
    let scoring = Arc::new(ScoringService::load(ArtifactStore::new(&config.artifacts_dir)));
    if !scoring.is_ready() {
        tracing::warn!(
            "Scoring unavailable until artifacts in {} are fixed and reloaded",
            config.artifacts_dir
        );
    }

    // Build application state
    let state = AppState {
        pool,
        config: config.clone(),
        scoring,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Shared application state
#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub config: config::Config,
    pub scoring: Arc<ScoringService>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let model_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/model/status", get(handlers::model::status))
        .route("/api/v1/model/reload", post(handlers::model::reload));

    let lead_routes = Router::new()
        .route("/api/v1/customers", get(handlers::leads::list))
        .route("/api/v1/customers/predict", post(handlers::leads::predict))
        .route("/api/v1/customers/:id", get(handlers::leads::get))
        .route("/api/v1/customers/:id/status", put(handlers::leads::update_status))
        .route(
            "/api/v1/customers/upload",
            post(handlers::leads::upload)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        );

    // Combine all routes
    Router::new()
        .merge(model_routes)
        .merge(lead_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
