use axum::Router;

use crate::AppState;

pub mod audit;
pub mod estimates;
pub mod health;
pub mod projects;
pub mod stats;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(projects::router())
        .merge(estimates::router())
        .merge(stats::router())
        .merge(audit::router())
}
