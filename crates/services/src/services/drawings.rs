use chrono::{DateTime, Utc};
use db::{
    DBService,
    models::drawing::{CreateDrawing, Drawing, DrawingStatus},
    store::Collection,
};
use tracing::info;
use uuid::Uuid;

use super::{consistency::validate_drawing, error::KernelError, projects::require_project};

pub async fn create_drawing(
    db: &DBService,
    project_id: Uuid,
    data: CreateDrawing,
    now: DateTime<Utc>,
) -> Result<Drawing, KernelError> {
    require_project(db, project_id).await?;
    let drawing = Drawing {
        id: Uuid::nil(),
        project_id,
        drawing_number: data.drawing_number,
        name: data.name,
        drawing_type: data.drawing_type,
        version: 1,
        file_url: data.file_url,
        status: DrawingStatus::Draft,
        created_by: data.created_by,
        reviewed_by: None,
        approved_by: None,
        created_at: now,
        updated_at: now,
    };
    validate_drawing(&drawing)?;
    let stored = db.insert(&drawing).await?;
    info!(project_id = %project_id, drawing_id = %stored.id, number = %stored.drawing_number, "Drawing created");
    Ok(stored)
}

async fn require_drawing(db: &DBService, id: Uuid) -> Result<Drawing, KernelError> {
    db.find_by_id(id)
        .await?
        .ok_or_else(|| KernelError::not_found(Collection::Drawings, id))
}

/// Upload a new revision: bumps the version and clears earlier sign-offs
pub async fn revise_drawing(
    db: &DBService,
    id: Uuid,
    file_url: String,
) -> Result<Drawing, KernelError> {
    let mut drawing = require_drawing(db, id).await?;
    drawing.version += 1;
    drawing.file_url = file_url;
    drawing.status = DrawingStatus::Revision;
    drawing.reviewed_by = None;
    drawing.approved_by = None;
    validate_drawing(&drawing)?;
    let stored = db.replace(&drawing).await?;
    info!(drawing_id = %id, version = stored.version, "Drawing revised");
    Ok(stored)
}

/// Move a drawing through review; `by` is recorded as reviewer or approver
pub async fn set_drawing_status(
    db: &DBService,
    id: Uuid,
    status: DrawingStatus,
    by: Option<String>,
) -> Result<Drawing, KernelError> {
    let mut drawing = require_drawing(db, id).await?;
    match status {
        DrawingStatus::Review => drawing.reviewed_by = by.or(drawing.reviewed_by),
        DrawingStatus::Approved => drawing.approved_by = by.or(drawing.approved_by),
        DrawingStatus::Draft | DrawingStatus::Revision => {}
    }
    drawing.status = status;
    validate_drawing(&drawing)?;
    let stored = db.replace(&drawing).await?;
    info!(drawing_id = %id, status = %status, "Drawing status changed");
    Ok(stored)
}
