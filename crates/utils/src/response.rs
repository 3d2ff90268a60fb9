use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Envelope every JSON endpoint answers with.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Failure that still carries a payload, e.g. the list of violated rules
    pub fn error_with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: false,
            data: Some(data),
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}
