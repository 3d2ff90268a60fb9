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
pub enum InspectionType {
    Material,
    Production,
    Installation,
    Final,
}

/// Overall verdict of an inspection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InspectionResult {
    Pass,
    Fail,
    Conditional,
}

/// Verdict of a single check item; `na` means the check did not apply
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ItemResult {
    Pass,
    Fail,
    Na,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct InspectionItem {
    pub id: Uuid,
    pub item: String,
    pub standard: String,
    pub result: ItemResult,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    pub id: Uuid,
    pub project_id: Uuid,
    #[serde(rename = "type")]
    pub inspection_type: InspectionType,

    pub date: DateTime<Utc>,
    pub inspector: String,
    pub result: InspectionResult,

    pub check_items: Vec<InspectionItem>,
    #[serde(default)]
    pub photos: Vec<String>, // opaque URLs
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Inspection {
    const COLLECTION: Collection = Collection::Inspections;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl ProjectChild for Inspection {
    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateInspectionItem {
    pub item: String,
    pub standard: String,
    pub result: ItemResult,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateInspection {
    #[serde(rename = "type")]
    pub inspection_type: InspectionType,
    pub date: DateTime<Utc>,
    pub inspector: String,
    pub result: InspectionResult,
    pub check_items: Vec<CreateInspectionItem>,
    #[serde(default)]
    pub photos: Vec<String>,
    pub notes: Option<String>,
}
