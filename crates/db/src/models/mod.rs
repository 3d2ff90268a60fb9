use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::store::{Collection, StoreError, StoredDocument};

pub mod construction_schedule;
pub mod customer;
pub mod drawing;
pub mod estimate;
pub mod inspection;
pub mod material;
pub mod production_process;
pub mod project;

/// Fields owned by the store rather than by the record
const STORE_FIELDS: [&str; 3] = ["id", "createdAt", "updatedAt"];

/// A record type persisted in one collection
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;

    fn id(&self) -> Uuid;
}

/// A record that belongs to a project through `projectId`
pub trait ProjectChild: Entity {
    fn project_id(&self) -> Uuid;
}

/// Serialize a record into the field map handed to the store, minus store-owned fields
pub fn to_fields<T: Serialize>(record: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(mut map) => {
            for field in STORE_FIELDS {
                map.remove(field);
            }
            Ok(map)
        }
        _ => Err(StoreError::NotAnObject),
    }
}

/// Rebuild a typed record from a stored document
pub fn from_document<T: DeserializeOwned>(doc: StoredDocument) -> Result<T, StoreError> {
    let mut fields = doc.fields;
    fields.insert("id".to_string(), Value::String(doc.id.to_string()));
    fields.insert("createdAt".to_string(), serde_json::to_value(doc.created_at)?);
    fields.insert("updatedAt".to_string(), serde_json::to_value(doc.updated_at)?);
    Ok(serde_json::from_value(Value::Object(fields))?)
}
