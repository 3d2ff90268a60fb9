use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use services::services::stats::{self, ConstructionOverview, ProductionStats, ProjectStats};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

/// GET /api/stats/projects
pub async fn project_stats(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<ProjectStats>>, ApiError> {
    let stats = stats::project_stats(&state.db).await?;
    Ok(ResponseJson(ApiResponse::success(stats)))
}

/// GET /api/stats/production
/// Process progress and material procurement counts
pub async fn production_stats(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<ProductionStats>>, ApiError> {
    let stats = stats::production_stats(&state.db).await?;
    Ok(ResponseJson(ApiResponse::success(stats)))
}

/// GET /api/stats/construction
pub async fn construction_stats(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<ConstructionOverview>>, ApiError> {
    let stats = stats::construction_stats(&state.db).await?;
    Ok(ResponseJson(ApiResponse::success(stats)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats/projects", get(project_stats))
        .route("/stats/production", get(production_stats))
        .route("/stats/construction", get(construction_stats))
}
