//! Dashboard statistics. Every function here is pure and total: empty input yields
//! zeroes and empty maps, never an error.

use std::collections::BTreeMap;

use db::{
    DBService,
    models::{
        construction_schedule::ConstructionSchedule,
        inspection::{Inspection, InspectionResult},
        material::{Material, MaterialStatus},
        production_process::{ProductionProcess, WorkStatus},
        project::{Project, ProjectPhase, ProjectStatus},
    },
    store::Filter,
};
use serde::Serialize;
use ts_rs::TS;

use super::error::KernelError;

/// Anything that reports a completion percentage and a work status
pub trait Progress {
    fn progress(&self) -> i64;
    fn work_status(&self) -> WorkStatus;
}

impl Progress for ProductionProcess {
    fn progress(&self) -> i64 {
        i64::from(self.progress)
    }

    fn work_status(&self) -> WorkStatus {
        self.status
    }
}

impl Progress for ConstructionSchedule {
    /// Share of completed tasks, rounded half up
    fn progress(&self) -> i64 {
        let total = self.tasks.len() as i64;
        if total == 0 {
            return 0;
        }
        round_ratio(100 * self.completed_tasks() as i64, total)
    }

    fn work_status(&self) -> WorkStatus {
        self.status
    }
}

/// `numerator / denominator` rounded half up; both must be non-negative
fn round_ratio(numerator: i64, denominator: i64) -> i64 {
    (2 * numerator + denominator) / (2 * denominator)
}

pub fn count_by_status(projects: &[Project]) -> BTreeMap<ProjectStatus, usize> {
    let mut counts = BTreeMap::new();
    for project in projects {
        *counts.entry(project.status).or_default() += 1;
    }
    counts
}

pub fn count_by_phase(projects: &[Project]) -> BTreeMap<ProjectPhase, usize> {
    let mut counts = BTreeMap::new();
    for project in projects {
        *counts.entry(project.current_phase).or_default() += 1;
    }
    counts
}

/// Projects that are neither completed nor cancelled
pub fn active_count(projects: &[Project]) -> usize {
    projects
        .iter()
        .filter(|p| !matches!(p.status, ProjectStatus::Completed | ProjectStatus::Cancelled))
        .count()
}

/// Mean progress of a group, rounded; 0 for an empty group
pub fn overall_progress<T: Progress>(group: &[T]) -> i64 {
    if group.is_empty() {
        return 0;
    }
    let sum: i64 = group.iter().map(|item| item.progress().clamp(0, 100)).sum();
    round_ratio(sum, group.len() as i64)
}

pub fn has_delay<T: Progress>(group: &[T]) -> bool {
    group.iter().any(|item| item.work_status() == WorkStatus::Delayed)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total: usize,
    pub active: usize,
    pub by_status: BTreeMap<ProjectStatus, usize>,
    pub by_phase: BTreeMap<ProjectPhase, usize>,
}

impl ProjectStats {
    pub fn from_projects(projects: &[Project]) -> Self {
        Self {
            total: projects.len(),
            active: active_count(projects),
            by_status: count_by_status(projects),
            by_phase: count_by_phase(projects),
        }
    }
}

/// Tally of work items by status plus their average progress
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct WorkStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub delayed: usize,
    #[ts(type = "number")]
    pub average_progress: i64,
    pub has_delay: bool,
}

impl WorkStats {
    pub fn from_group<T: Progress>(group: &[T]) -> Self {
        let count = |status: WorkStatus| group.iter().filter(|i| i.work_status() == status).count();
        Self {
            total: group.len(),
            pending: count(WorkStatus::Pending),
            in_progress: count(WorkStatus::InProgress),
            completed: count(WorkStatus::Completed),
            delayed: count(WorkStatus::Delayed),
            average_progress: overall_progress(group),
            has_delay: has_delay(group),
        }
    }
}

pub type ConstructionStats = WorkStats;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct MaterialStats {
    pub total: usize,
    pub pending: usize,
    pub ordered: usize,
    pub received: usize,
    pub used: usize,
}

impl MaterialStats {
    pub fn from_materials(materials: &[Material]) -> Self {
        let count = |status: MaterialStatus| materials.iter().filter(|m| m.status == status).count();
        Self {
            total: materials.len(),
            pending: count(MaterialStatus::Pending),
            ordered: count(MaterialStatus::Ordered),
            received: count(MaterialStatus::Received),
            used: count(MaterialStatus::Used),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ProductionStats {
    pub processes: WorkStats,
    pub materials: MaterialStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct InspectionStats {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub conditional: usize,
}

impl InspectionStats {
    pub fn from_inspections(inspections: &[Inspection]) -> Self {
        let count =
            |result: InspectionResult| inspections.iter().filter(|i| i.result == result).count();
        Self {
            total: inspections.len(),
            passed: count(InspectionResult::Pass),
            failed: count(InspectionResult::Fail),
            conditional: count(InspectionResult::Conditional),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ConstructionOverview {
    pub schedules: ConstructionStats,
    pub inspections: InspectionStats,
}

pub async fn project_stats(db: &DBService) -> Result<ProjectStats, KernelError> {
    let projects: Vec<Project> = db.find_all(&Filter::new()).await?;
    Ok(ProjectStats::from_projects(&projects))
}

pub async fn production_stats(db: &DBService) -> Result<ProductionStats, KernelError> {
    let processes: Vec<ProductionProcess> = db.find_all(&Filter::new()).await?;
    let materials: Vec<Material> = db.find_all(&Filter::new()).await?;
    Ok(ProductionStats {
        processes: WorkStats::from_group(&processes),
        materials: MaterialStats::from_materials(&materials),
    })
}

pub async fn construction_stats(db: &DBService) -> Result<ConstructionOverview, KernelError> {
    let schedules: Vec<ConstructionSchedule> = db.find_all(&Filter::new()).await?;
    let inspections: Vec<Inspection> = db.find_all(&Filter::new()).await?;
    Ok(ConstructionOverview {
        schedules: WorkStats::from_group(&schedules),
        inspections: InspectionStats::from_inspections(&inspections),
    })
}
