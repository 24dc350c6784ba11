use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::config::{Config, JwtConfig};
use crate::recommend::Ranker;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Pluggable ranking backend. Default: `BandedRanker` built from `config.ranking`.
    pub ranker: Arc<dyn Ranker>,
}

impl FromRef<AppState> for JwtConfig {
    fn from_ref(state: &AppState) -> Self {
        state.config.jwt.clone()
    }
}
