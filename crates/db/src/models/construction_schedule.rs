use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::{Entity, ProjectChild, production_process::WorkStatus};
use crate::store::Collection;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConstructionTaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// One on-site work item (foundation, frame erection, membrane tensioning, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ConstructionTask {
    pub id: Uuid,
    pub name: String,
    pub sequence: i32,

    pub planned_start_date: DateTime<Utc>,
    pub planned_end_date: DateTime<Utc>,
    pub actual_start_date: Option<DateTime<Utc>>,
    pub actual_end_date: Option<DateTime<Utc>>,

    pub status: ConstructionTaskStatus,
    pub assigned_team: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ConstructionSchedule {
    pub id: Uuid,
    pub project_id: Uuid,

    pub tasks: Vec<ConstructionTask>,

    pub planned_start_date: DateTime<Utc>,
    pub planned_end_date: DateTime<Utc>,
    pub actual_start_date: Option<DateTime<Utc>>,
    pub actual_end_date: Option<DateTime<Utc>>,

    pub status: WorkStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for ConstructionSchedule {
    const COLLECTION: Collection = Collection::ConstructionSchedules;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl ProjectChild for ConstructionSchedule {
    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

impl ConstructionSchedule {
    pub fn completed_tasks(&self) -> usize {
        self.tasks
            .iter()
            .filter(|task| task.status == ConstructionTaskStatus::Completed)
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateConstructionTask {
    pub name: String,
    pub sequence: i32,
    pub planned_start_date: DateTime<Utc>,
    pub planned_end_date: DateTime<Utc>,
    pub assigned_team: Option<String>,
    pub notes: Option<String>,
}

impl CreateConstructionTask {
    pub fn into_task(self) -> ConstructionTask {
        ConstructionTask {
            id: Uuid::new_v4(),
            name: self.name,
            sequence: self.sequence,
            planned_start_date: self.planned_start_date,
            planned_end_date: self.planned_end_date,
            actual_start_date: None,
            actual_end_date: None,
            status: ConstructionTaskStatus::Pending,
            assigned_team: self.assigned_team,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateConstructionSchedule {
    pub tasks: Vec<CreateConstructionTask>,
    pub planned_start_date: DateTime<Utc>,
    pub planned_end_date: DateTime<Utc>,
}
