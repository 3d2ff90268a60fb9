use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

pub mod models;
pub mod store;

use models::{Entity, ProjectChild, from_document, to_fields};
use store::{DocumentStore, Filter, InMemoryStore, SqliteStore, StoreError};

/// Handle to the document store, passed explicitly to every operation that persists.
#[derive(Clone)]
pub struct DBService {
    pub store: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for DBService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBService").finish_non_exhaustive()
    }
}

impl DBService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    /// `sqlite::memory:` or `sqlite://path/to/file.db?mode=rwc`
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let store = SqliteStore::connect(database_url).await?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Persist a new record; its `id` and timestamps are replaced by the store's
    pub async fn insert<T: Entity>(&self, record: &T) -> Result<T, StoreError> {
        let id = self.store.create(T::COLLECTION, to_fields(record)?).await?;
        self.find_by_id(id).await?.ok_or(StoreError::NotFound {
            collection: T::COLLECTION,
            id,
        })
    }

    pub async fn find_by_id<T: Entity>(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        debug!(collection = %T::COLLECTION, id = %id, "Loading record");
        self.store
            .get(T::COLLECTION, id)
            .await?
            .map(from_document)
            .transpose()
    }

    pub async fn find_all<T: Entity>(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        self.store
            .list(T::COLLECTION, filter)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    pub async fn find_by_project<T: ProjectChild>(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<T>, StoreError> {
        self.find_all(&Filter::new().eq("projectId", project_id.to_string()))
            .await
    }

    /// Overwrite every record field with the given version and return what was stored
    pub async fn replace<T: Entity>(&self, record: &T) -> Result<T, StoreError> {
        let id = record.id();
        self.store
            .update(T::COLLECTION, id, to_fields(record)?)
            .await?;
        self.find_by_id(id).await?.ok_or(StoreError::NotFound {
            collection: T::COLLECTION,
            id,
        })
    }

    pub async fn delete<T: Entity>(&self, id: Uuid) -> Result<(), StoreError> {
        self.store.delete(T::COLLECTION, id).await
    }
}
