use db::store::{Collection, StoreError};
use thiserror::Error;
use uuid::Uuid;

use super::{config::ConfigError, consistency::Violations, lifecycle::InvalidTransition};

#[derive(Debug, Error)]
pub enum KernelError {
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("invariant violation: {0}")]
    InvariantViolation(Violations),
    #[error("{collection} record {id} not found")]
    NotFound { collection: Collection, id: Uuid },
    #[error("project {id} still has {count} child records")]
    HasChildren { id: Uuid, count: usize },
    #[error("no project numbers left for {prefix}-{year}")]
    ProjectNumbersExhausted { prefix: String, year: i32 },
    #[error("store error: {0}")]
    Store(StoreError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<StoreError> for KernelError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => KernelError::NotFound { collection, id },
            other => KernelError::Store(other),
        }
    }
}

impl From<Violations> for KernelError {
    fn from(violations: Violations) -> Self {
        KernelError::InvariantViolation(violations)
    }
}

impl KernelError {
    pub fn not_found(collection: Collection, id: Uuid) -> Self {
        KernelError::NotFound { collection, id }
    }
}
