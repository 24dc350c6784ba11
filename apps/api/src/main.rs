mod auth;
mod catalog;
mod config;
mod db;
mod dev_samples;
mod errors;
mod extract;
mod models;
mod pagination;
mod recommend;
mod routes;
mod scores;
mod state;
mod users;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::recommend::{BandedRanker, Ranker};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Admission API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&db).await?;

    // Initialize ranker (BandedRanker by default; swap via AppState.ranker)
    let ranker = Arc::new(BandedRanker::new(config.ranking.clone())?);
    info!(
        "Ranker initialized (backend: {}, score domain {}..={})",
        ranker.backend(),
        config.ranking.score_min,
        config.ranking.score_max
    );

    if config.enable_dev_samples {
        warn!("Dev sample endpoint enabled at /api/v1/dev-samples");
    }

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        ranker,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
