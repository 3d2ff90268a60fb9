use std::sync::Arc;

use axum::Router;
use db::DBService;
use services::services::config::KernelConfig;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod error;
pub mod routes;

/// Shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: DBService,
    pub config: Arc<KernelConfig>,
}

impl AppState {
    pub fn new(db: DBService, config: KernelConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
