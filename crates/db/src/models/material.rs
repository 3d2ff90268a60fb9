use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::{Entity, ProjectChild};
use crate::store::Collection;

/// Procurement stage; normal flow only moves forward
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    TS,
    EnumString,
    Display,
    Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MaterialStatus {
    #[default]
    Pending,
    Ordered,
    Received,
    Used,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub specification: String,
    pub quantity: f64,
    pub unit: String,

    pub status: MaterialStatus,
    pub ordered_date: Option<DateTime<Utc>>,
    pub expected_date: Option<DateTime<Utc>>,
    pub received_date: Option<DateTime<Utc>>,

    pub supplier: Option<String>,
    #[ts(type = "number | null")]
    pub cost: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Material {
    const COLLECTION: Collection = Collection::Materials;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl ProjectChild for Material {
    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaterial {
    pub name: String,
    pub specification: String,
    pub quantity: f64,
    pub unit: String,
    pub expected_date: Option<DateTime<Utc>>,
    pub supplier: Option<String>,
    #[ts(type = "number | null")]
    pub cost: Option<i64>,
}
