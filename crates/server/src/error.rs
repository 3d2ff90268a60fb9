use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use serde_json::Value;
use services::services::error::KernelError;
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Kernel(#[from] KernelError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Kernel(err) => match err {
                KernelError::InvalidTransition(_) | KernelError::HasChildren { .. } => {
                    StatusCode::CONFLICT
                }
                KernelError::InvariantViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                KernelError::NotFound { .. } => StatusCode::NOT_FOUND,
                KernelError::ProjectNumbersExhausted { .. } => StatusCode::CONFLICT,
                KernelError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
                KernelError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = %status, error = %self, "Request failed");
        }
        let message = self.to_string();
        let body = match self {
            // hand the violation list back so the form can mark every field
            ApiError::Kernel(KernelError::InvariantViolation(violations)) => {
                let data = serde_json::to_value(&violations).unwrap_or(Value::Null);
                ApiResponse::error_with_data(message, data)
            }
            _ => ApiResponse::<Value>::error(message),
        };
        (status, ResponseJson(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use db::{
        models::project::ProjectStatus,
        store::{Collection, StoreError},
    };
    use services::services::{
        consistency::{Rule, Violations},
        lifecycle::InvalidTransition,
    };
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                KernelError::from(InvalidTransition {
                    from: ProjectStatus::Inquiry,
                    to: ProjectStatus::Completed,
                }),
                StatusCode::CONFLICT,
            ),
            (
                KernelError::InvariantViolation(Violations::new()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                KernelError::not_found(Collection::Projects, Uuid::new_v4()),
                StatusCode::NOT_FOUND,
            ),
            (
                KernelError::HasChildren {
                    id: Uuid::new_v4(),
                    count: 2,
                },
                StatusCode::CONFLICT,
            ),
            (
                KernelError::from(StoreError::Corrupt("row".to_string())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_violations_become_response_data() {
        let mut violations = Violations::new();
        violations.push("contractDate", Rule::ContractDateMatchesStatus, "required");
        let response = ApiError::from(KernelError::InvariantViolation(violations)).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
