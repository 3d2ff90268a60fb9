//! On-site schedules and inspection records.

use chrono::{DateTime, Utc};
use db::{
    DBService,
    models::{
        construction_schedule::{
            ConstructionSchedule, ConstructionTask, ConstructionTaskStatus,
            CreateConstructionSchedule,
        },
        inspection::{CreateInspection, Inspection, InspectionItem},
        production_process::WorkStatus,
    },
    store::Collection,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    consistency::{Rule, Violations, derive_schedule_status, validate_inspection, validate_schedule},
    error::KernelError,
    projects::require_project,
};

pub async fn list_schedules(
    db: &DBService,
    project_id: Uuid,
) -> Result<Vec<ConstructionSchedule>, KernelError> {
    Ok(db.find_by_project(project_id).await?)
}

pub async fn create_schedule(
    db: &DBService,
    project_id: Uuid,
    data: CreateConstructionSchedule,
    now: DateTime<Utc>,
) -> Result<ConstructionSchedule, KernelError> {
    require_project(db, project_id).await?;
    let mut tasks: Vec<ConstructionTask> = data.tasks.into_iter().map(|t| t.into_task()).collect();
    tasks.sort_by_key(|t| t.sequence);
    let schedule = ConstructionSchedule {
        id: Uuid::nil(),
        project_id,
        status: derive_schedule_status(&tasks),
        tasks,
        planned_start_date: data.planned_start_date,
        planned_end_date: data.planned_end_date,
        actual_start_date: None,
        actual_end_date: None,
        created_at: now,
        updated_at: now,
    };
    validate_schedule(&schedule)?;
    let stored = db.insert(&schedule).await?;
    info!(
        project_id = %project_id,
        schedule_id = %stored.id,
        tasks = stored.tasks.len(),
        "Construction schedule created"
    );
    Ok(stored)
}

async fn require_schedule(db: &DBService, id: Uuid) -> Result<ConstructionSchedule, KernelError> {
    db.find_by_id(id)
        .await?
        .ok_or_else(|| KernelError::not_found(Collection::ConstructionSchedules, id))
}

/// Status after the tasks changed; a manual delay flag survives until everything is done
fn next_schedule_status(current: WorkStatus, tasks: &[ConstructionTask]) -> WorkStatus {
    let derived = derive_schedule_status(tasks);
    if current == WorkStatus::Delayed && derived != WorkStatus::Completed {
        WorkStatus::Delayed
    } else {
        derived
    }
}

fn stamp_schedule_dates(schedule: &mut ConstructionSchedule, now: DateTime<Utc>) {
    if schedule.status != WorkStatus::Pending && schedule.actual_start_date.is_none() {
        schedule.actual_start_date = Some(now);
    }
    schedule.actual_end_date = if schedule.status == WorkStatus::Completed {
        schedule.actual_end_date.or(Some(now))
    } else {
        None
    };
}

/// Replace the task list and re-derive the schedule status
pub async fn update_schedule_tasks(
    db: &DBService,
    id: Uuid,
    mut tasks: Vec<ConstructionTask>,
    now: DateTime<Utc>,
) -> Result<ConstructionSchedule, KernelError> {
    let mut schedule = require_schedule(db, id).await?;
    tasks.sort_by_key(|t| t.sequence);
    schedule.status = next_schedule_status(schedule.status, &tasks);
    schedule.tasks = tasks;
    stamp_schedule_dates(&mut schedule, now);
    validate_schedule(&schedule)?;
    let stored = db.replace(&schedule).await?;
    info!(schedule_id = %id, status = %stored.status, "Construction schedule updated");
    Ok(stored)
}

pub async fn set_task_status(
    db: &DBService,
    schedule_id: Uuid,
    task_id: Uuid,
    status: ConstructionTaskStatus,
    now: DateTime<Utc>,
) -> Result<ConstructionSchedule, KernelError> {
    let schedule = require_schedule(db, schedule_id).await?;
    let mut tasks = schedule.tasks;
    let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) else {
        let mut v = Violations::new();
        v.push("tasks", Rule::Required, format!("schedule has no task {task_id}"));
        return Err(v.into());
    };
    task.status = status;
    if status != ConstructionTaskStatus::Pending && task.actual_start_date.is_none() {
        task.actual_start_date = Some(now);
    }
    task.actual_end_date = if status == ConstructionTaskStatus::Completed {
        task.actual_end_date.or(Some(now))
    } else {
        None
    };
    update_schedule_tasks(db, schedule_id, tasks, now).await
}

/// Raise or clear the manual delay flag
pub async fn set_schedule_delayed(
    db: &DBService,
    id: Uuid,
    delayed: bool,
) -> Result<ConstructionSchedule, KernelError> {
    let mut schedule = require_schedule(db, id).await?;
    schedule.status = if delayed {
        WorkStatus::Delayed
    } else {
        derive_schedule_status(&schedule.tasks)
    };
    validate_schedule(&schedule)?;
    let stored = db.replace(&schedule).await?;
    if delayed {
        warn!(schedule_id = %id, project_id = %stored.project_id, "Construction schedule delayed");
    } else {
        info!(schedule_id = %id, status = %stored.status, "Construction delay cleared");
    }
    Ok(stored)
}

pub async fn list_inspections(db: &DBService, project_id: Uuid) -> Result<Vec<Inspection>, KernelError> {
    Ok(db.find_by_project(project_id).await?)
}

pub async fn create_inspection(
    db: &DBService,
    project_id: Uuid,
    data: CreateInspection,
    now: DateTime<Utc>,
) -> Result<Inspection, KernelError> {
    require_project(db, project_id).await?;
    let inspection = Inspection {
        id: Uuid::nil(),
        project_id,
        inspection_type: data.inspection_type,
        date: data.date,
        inspector: data.inspector,
        result: data.result,
        check_items: data
            .check_items
            .into_iter()
            .map(|item| InspectionItem {
                id: Uuid::new_v4(),
                item: item.item,
                standard: item.standard,
                result: item.result,
                notes: item.notes,
            })
            .collect(),
        photos: data.photos,
        notes: data.notes,
        created_at: now,
        updated_at: now,
    };
    validate_inspection(&inspection)?;
    let stored = db.insert(&inspection).await?;
    info!(
        project_id = %project_id,
        inspection_id = %stored.id,
        kind = %stored.inspection_type,
        result = %stored.result,
        "Inspection recorded"
    );
    Ok(stored)
}
