//! Document-store collaborator: collections of JSON records addressed by id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Collection names as they appear in the store
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
    EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Collection {
    Projects,
    Customers,
    Estimates,
    Drawings,
    ProductionProcesses,
    Materials,
    ConstructionSchedules,
    Inspections,
}

impl Collection {
    /// Collections whose records point at a project through `projectId`
    pub const PROJECT_CHILDREN: [Collection; 6] = [
        Collection::Estimates,
        Collection::Drawings,
        Collection::ProductionProcesses,
        Collection::Materials,
        Collection::ConstructionSchedules,
        Collection::Inspections,
    ];
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("json error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{collection} document {id} not found")]
    NotFound { collection: Collection, id: Uuid },
    #[error("record does not serialize to a JSON object")]
    NotAnObject,
    #[error("stored document is corrupt: {0}")]
    Corrupt(String),
}

/// A record as held by the store, with the store-managed identity split out
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub fields: Map<String, Value>,
}

/// Conjunction of top-level field equalities, optionally capped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub equals: Vec<(String, Value)>,
    pub limit: Option<usize>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.push((field.into(), value.into()));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        self.equals
            .iter()
            .all(|(field, expected)| fields.get(field).unwrap_or(&Value::Null) == expected)
    }
}

/// Persistence contract the kernel is written against.
///
/// Implementations assign ids and timestamps; they never validate record contents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(
        &self,
        collection: Collection,
        fields: Map<String, Value>,
    ) -> Result<Uuid, StoreError>;

    async fn get(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<StoredDocument>, StoreError>;

    /// Newest `updatedAt` first
    async fn list(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<StoredDocument>, StoreError>;

    /// Merge `patch` into the top-level fields and refresh `updatedAt`
    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Map<String, Value>,
    ) -> Result<(), StoreError>;

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<(), StoreError>;
}
