use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use services::services::audit::{AuditReport, audit_store};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

/// GET /api/audit
/// Report records that break the consistency rules; nothing is modified
pub async fn run_audit(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<AuditReport>>, ApiError> {
    let report = audit_store(&state.db, &state.config).await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/audit", get(run_audit))
}
