use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use chrono::Utc;
use db::models::project::{CreateProject, Project, UpdateProject};
use services::services::projects::{self, ProjectQuery, TransitionRequest};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// GET /api/projects
/// List projects, optionally filtered by status or phase
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Project>>>, ApiError> {
    let projects = projects::list_projects(&state.db, &query).await?;
    Ok(ResponseJson(ApiResponse::success(projects)))
}

/// POST /api/projects
/// Register a new inquiry
pub async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<CreateProject>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    let project = projects::create_project(&state.db, &state.config, payload, Utc::now()).await?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

/// GET /api/projects/{project_id}
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    let project = projects::get_project(&state.db, project_id).await?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

/// PUT /api/projects/{project_id}
/// Edit descriptive fields; `null` clears an optional one
pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<UpdateProject>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    let project = projects::update_project(&state.db, project_id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

/// DELETE /api/projects/{project_id}
pub async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    projects::delete_project(&state.db, &state.config, project_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// POST /api/projects/{project_id}/transition
/// Move a project along its lifecycle; `overrideReason` bypasses the transition table
pub async fn transition_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    let project = projects::transition_project(&state.db, project_id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{project_id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/projects/{project_id}/transition", post(transition_project))
}
