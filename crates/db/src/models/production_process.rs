use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::{Entity, ProjectChild};
use crate::store::Collection;

/// Shared by production processes and construction schedules
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Delayed,
}

/// A manufacturing step (cutting, sewing, fitting, ...) executed in `sequence` order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ProductionProcess {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub sequence: i32,

    pub planned_start_date: DateTime<Utc>,
    pub planned_end_date: DateTime<Utc>,
    pub actual_start_date: Option<DateTime<Utc>>,
    pub actual_end_date: Option<DateTime<Utc>>,

    pub status: WorkStatus,
    pub progress: i32, // percent

    pub assigned_to: Option<String>,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for ProductionProcess {
    const COLLECTION: Collection = Collection::ProductionProcesses;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl ProjectChild for ProductionProcess {
    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductionProcess {
    pub name: String,
    pub sequence: i32,
    pub planned_start_date: DateTime<Utc>,
    pub planned_end_date: DateTime<Utc>,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
}

/// Progress report from the shop floor
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductionProcess {
    pub status: Option<WorkStatus>,
    pub progress: Option<i32>,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
}
