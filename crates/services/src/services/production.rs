//! Shop-floor processes and material procurement.

use chrono::{DateTime, Utc};
use db::{
    DBService,
    models::{
        material::{CreateMaterial, Material, MaterialStatus},
        production_process::{
            CreateProductionProcess, ProductionProcess, UpdateProductionProcess, WorkStatus,
        },
    },
    store::Collection,
};
use tracing::info;
use uuid::Uuid;

use super::{
    consistency::{
        Rule, Violations, validate_material, validate_material_transition,
        validate_production_process,
    },
    error::KernelError,
    projects::require_project,
};

/// Processes of a project in execution order
pub async fn list_processes(
    db: &DBService,
    project_id: Uuid,
) -> Result<Vec<ProductionProcess>, KernelError> {
    let mut processes: Vec<ProductionProcess> = db.find_by_project(project_id).await?;
    processes.sort_by_key(|p| p.sequence);
    Ok(processes)
}

pub async fn create_process(
    db: &DBService,
    project_id: Uuid,
    data: CreateProductionProcess,
    now: DateTime<Utc>,
) -> Result<ProductionProcess, KernelError> {
    require_project(db, project_id).await?;
    let process = ProductionProcess {
        id: Uuid::nil(),
        project_id,
        name: data.name,
        sequence: data.sequence,
        planned_start_date: data.planned_start_date,
        planned_end_date: data.planned_end_date,
        actual_start_date: None,
        actual_end_date: None,
        status: WorkStatus::Pending,
        progress: 0,
        assigned_to: data.assigned_to,
        notes: data.notes,
        created_at: now,
        updated_at: now,
    };

    let mut violations = match validate_production_process(&process) {
        Ok(()) => Violations::new(),
        Err(violations) => violations,
    };
    let existing = list_processes(db, project_id).await?;
    if existing.iter().any(|p| p.sequence == process.sequence) {
        violations.push(
            "sequence",
            Rule::UniqueSequence,
            format!("sequence {} is already used in this project", process.sequence),
        );
    }
    violations.into_result()?;

    let stored = db.insert(&process).await?;
    info!(
        project_id = %project_id,
        process_id = %stored.id,
        sequence = stored.sequence,
        "Production process created"
    );
    Ok(stored)
}

/// Apply a progress report, keeping status and progress consistent with each other
pub fn apply_progress(
    current: &ProductionProcess,
    update: UpdateProductionProcess,
    now: DateTime<Utc>,
) -> ProductionProcess {
    let status = match (update.status, update.progress) {
        (Some(status), _) => status,
        (None, Some(100)) => WorkStatus::Completed,
        (None, Some(0)) if current.status == WorkStatus::Pending => WorkStatus::Pending,
        (None, Some(_)) if current.status == WorkStatus::Delayed => WorkStatus::Delayed,
        (None, Some(_)) => WorkStatus::InProgress,
        (None, None) => current.status,
    };
    let progress = match (update.progress, status) {
        (Some(progress), _) => progress,
        (None, WorkStatus::Completed) => 100,
        (None, WorkStatus::Pending) => 0,
        (None, _) => current.progress,
    };

    let mut next = current.clone();
    next.status = status;
    next.progress = progress;
    next.assigned_to = update.assigned_to.or(next.assigned_to);
    next.notes = update.notes.or(next.notes);
    if status != WorkStatus::Pending && next.actual_start_date.is_none() {
        next.actual_start_date = Some(now);
    }
    next.actual_end_date = if status == WorkStatus::Completed {
        next.actual_end_date.or(Some(now))
    } else {
        None
    };
    next
}

pub async fn update_process_progress(
    db: &DBService,
    id: Uuid,
    update: UpdateProductionProcess,
    now: DateTime<Utc>,
) -> Result<ProductionProcess, KernelError> {
    let current: ProductionProcess = db
        .find_by_id(id)
        .await?
        .ok_or_else(|| KernelError::not_found(Collection::ProductionProcesses, id))?;
    let next = apply_progress(&current, update, now);
    validate_production_process(&next)?;
    let stored = db.replace(&next).await?;
    info!(
        process_id = %id,
        status = %stored.status,
        progress = stored.progress,
        "Production progress updated"
    );
    Ok(stored)
}

pub async fn list_materials(db: &DBService, project_id: Uuid) -> Result<Vec<Material>, KernelError> {
    Ok(db.find_by_project(project_id).await?)
}

pub async fn create_material(
    db: &DBService,
    project_id: Uuid,
    data: CreateMaterial,
    now: DateTime<Utc>,
) -> Result<Material, KernelError> {
    require_project(db, project_id).await?;
    let material = Material {
        id: Uuid::nil(),
        project_id,
        name: data.name,
        specification: data.specification,
        quantity: data.quantity,
        unit: data.unit,
        status: MaterialStatus::Pending,
        ordered_date: None,
        expected_date: data.expected_date,
        received_date: None,
        supplier: data.supplier,
        cost: data.cost,
        created_at: now,
        updated_at: now,
    };
    validate_material(&material)?;
    let stored = db.insert(&material).await?;
    info!(project_id = %project_id, material_id = %stored.id, "Material registered");
    Ok(stored)
}

/// Move a material forward in procurement, stamping order and receipt dates on the way
pub async fn advance_material(
    db: &DBService,
    id: Uuid,
    to: MaterialStatus,
    now: DateTime<Utc>,
) -> Result<Material, KernelError> {
    let mut material: Material = db
        .find_by_id(id)
        .await?
        .ok_or_else(|| KernelError::not_found(Collection::Materials, id))?;
    let from = material.status;
    validate_material_transition(from, to)?;
    if from == to {
        return Ok(material);
    }

    material.status = to;
    if to >= MaterialStatus::Ordered && material.ordered_date.is_none() {
        material.ordered_date = Some(now);
    }
    if to >= MaterialStatus::Received && material.received_date.is_none() {
        material.received_date = Some(now);
    }
    validate_material(&material)?;
    let stored = db.replace(&material).await?;
    info!(material_id = %id, from = %from, to = %to, "Material status advanced");
    Ok(stored)
}
