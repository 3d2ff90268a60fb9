use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Collection, DocumentStore, Filter, StoreError, StoredDocument};

/// Process-local store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<StoredDocument>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn create(
        &self,
        collection: Collection,
        fields: Map<String, Value>,
    ) -> Result<Uuid, StoreError> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(StoredDocument {
                id,
                created_at: now,
                updated_at: now,
                fields,
            });
        Ok(id)
    }

    async fn get(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<StoredDocument>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id).cloned()))
    }

    async fn list(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let guard = self.collections.read().await;
        let mut docs: Vec<StoredDocument> = guard
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter.matches(&doc.fields))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        if let Some(limit) = filter.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut guard = self.collections.write().await;
        let doc = guard
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
            .ok_or(StoreError::NotFound { collection, id })?;
        doc.fields.extend(patch);
        doc.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<(), StoreError> {
        let mut guard = self.collections.write().await;
        let docs = guard
            .get_mut(&collection)
            .ok_or(StoreError::NotFound { collection, id })?;
        let position = docs
            .iter()
            .position(|doc| doc.id == id)
            .ok_or(StoreError::NotFound { collection, id })?;
        docs.remove(position);
        Ok(())
    }
}
