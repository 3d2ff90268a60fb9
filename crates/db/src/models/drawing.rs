use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::{Entity, ProjectChild};
use crate::store::Collection;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DrawingType {
    Plan,
    Elevation,
    Detail,
    Structural,
    Other,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DrawingStatus {
    #[default]
    Draft,
    Review,
    Approved,
    Revision,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Drawing {
    pub id: Uuid,
    pub project_id: Uuid,
    pub drawing_number: String,
    pub name: String,
    #[serde(rename = "type")]
    pub drawing_type: DrawingType,
    pub version: i32,
    pub file_url: String, // opaque, storage lives elsewhere
    pub status: DrawingStatus,

    pub created_by: String,
    pub reviewed_by: Option<String>,
    pub approved_by: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Drawing {
    const COLLECTION: Collection = Collection::Drawings;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl ProjectChild for Drawing {
    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateDrawing {
    pub drawing_number: String,
    pub name: String,
    #[serde(rename = "type")]
    pub drawing_type: DrawingType,
    pub file_url: String,
    pub created_by: String,
}
