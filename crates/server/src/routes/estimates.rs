use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use chrono::Utc;
use db::models::estimate::{CreateEstimate, Estimate};
use services::services::{estimates, projects::require_project};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// GET /api/projects/{project_id}/estimates
/// Estimates of a project, newest version first
pub async fn list_estimates(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Estimate>>>, ApiError> {
    require_project(&state.db, project_id).await?;
    let estimates = estimates::list_estimates(&state.db, project_id).await?;
    Ok(ResponseJson(ApiResponse::success(estimates)))
}

/// POST /api/projects/{project_id}/estimates
/// Totals are computed server-side from the items and the configured tax rate
pub async fn create_estimate(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<CreateEstimate>,
) -> Result<ResponseJson<ApiResponse<Estimate>>, ApiError> {
    let estimate =
        estimates::create_estimate(&state.db, &state.config, project_id, payload, Utc::now())
            .await?;
    Ok(ResponseJson(ApiResponse::success(estimate)))
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/projects/{project_id}/estimates",
        get(list_estimates).post(create_estimate),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use services::services::config::KernelConfig;

    use crate::routes::test_support::{TestApp, create_test_project};

    #[tokio::test]
    async fn test_estimate_totals_computed() {
        let app = TestApp::new();
        let project = create_test_project(&app).await;
        let uri = format!("/api/projects/{}/estimates", project["id"].as_str().unwrap());

        let (status, body) = app
            .send(
                "POST",
                &uri,
                json!({
                    "items": [
                        {"description": "Membrane", "quantity": 2, "unit": "m²", "unitPrice": 1000},
                        {"description": "Installation", "quantity": 1, "unit": "式", "unitPrice": 500}
                    ]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["subtotal"], 2500);
        assert_eq!(body["data"]["tax"], 250);
        assert_eq!(body["data"]["total"], 2750);
        assert_eq!(body["data"]["version"], 1);

        let (status, body) = app.get(&uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_estimates_of_missing_project() {
        let app = TestApp::new();
        let uri = format!("/api/projects/{}/estimates", uuid::Uuid::new_v4());
        let (status, _) = app.get(&uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_configured_tax_rate_applies() {
        let app = TestApp::with_config(KernelConfig {
            tax_rate_bp: 800,
            ..Default::default()
        });
        let project = create_test_project(&app).await;
        let uri = format!("/api/projects/{}/estimates", project["id"].as_str().unwrap());
        let (status, body) = app
            .send(
                "POST",
                &uri,
                json!({"items": [{"description": "Frame", "quantity": 1, "unit": "式", "unitPrice": 10_005}]}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["tax"], 800);
        assert_eq!(body["data"]["total"], 10_805);
    }
}
