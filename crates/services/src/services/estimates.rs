use chrono::{DateTime, Duration, Utc};
use db::{
    DBService,
    models::estimate::{CreateEstimate, Estimate, EstimateItem, EstimateStatus},
    store::Collection,
};
use serde::Serialize;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    config::KernelConfig,
    consistency::{Rule, Violations, validate_estimate},
    error::KernelError,
    projects::require_project,
};

/// Days an estimate stays valid unless the caller says otherwise
pub const VALIDITY_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
pub struct EstimateTotals {
    #[ts(type = "number")]
    pub subtotal: i64,
    #[ts(type = "number")]
    pub tax: i64,
    #[ts(type = "number")]
    pub total: i64,
}

impl EstimateTotals {
    /// Totals recomputed from quantity and unit price; `None` if any step overflows
    pub fn compute(items: &[EstimateItem], tax_rate_bp: u32) -> Option<Self> {
        let subtotal = items.iter().try_fold(0i64, |sum, item| {
            sum.checked_add(item.quantity.checked_mul(item.unit_price)?)
        })?;
        let tax = tax_for(subtotal, tax_rate_bp)?;
        Some(Self {
            subtotal,
            tax,
            total: subtotal.checked_add(tax)?,
        })
    }
}

/// `floor(subtotal × rate)` with the rate in basis points
pub fn tax_for(subtotal: i64, tax_rate_bp: u32) -> Option<i64> {
    let tax = (i128::from(subtotal) * i128::from(tax_rate_bp)).div_euclid(10_000);
    i64::try_from(tax).ok()
}

/// Assemble a draft estimate; amounts and totals are always computed, never taken from input
pub fn build_estimate(
    project_id: Uuid,
    project_number: &str,
    version: i32,
    data: CreateEstimate,
    tax_rate_bp: u32,
    now: DateTime<Utc>,
) -> Result<Estimate, Violations> {
    let mut violations = Violations::new();
    let mut items = Vec::with_capacity(data.items.len());
    for (i, item) in data.items.into_iter().enumerate() {
        match item.into_item() {
            Some(item) => items.push(item),
            None => violations.push(
                format!("items[{i}].amount"),
                Rule::Range,
                "quantity × unitPrice is too large",
            ),
        }
    }
    violations.into_result()?;

    let Some(totals) = EstimateTotals::compute(&items, tax_rate_bp) else {
        let mut violations = Violations::new();
        violations.push("subtotal", Rule::Range, "estimate total is too large");
        return Err(violations);
    };
    let estimate_number = data
        .estimate_number
        .filter(|number| !number.trim().is_empty())
        .unwrap_or_else(|| format!("EST-{project_number}-v{version}"));
    Ok(Estimate {
        id: Uuid::nil(),
        project_id,
        estimate_number,
        version,
        items,
        subtotal: totals.subtotal,
        tax: totals.tax,
        total: totals.total,
        valid_until: data
            .valid_until
            .unwrap_or(now + Duration::days(VALIDITY_DAYS)),
        notes: data.notes,
        status: EstimateStatus::Draft,
        created_at: now,
        updated_at: now,
    })
}

/// Estimates of a project, newest version first
pub async fn list_estimates(db: &DBService, project_id: Uuid) -> Result<Vec<Estimate>, KernelError> {
    let mut estimates: Vec<Estimate> = db.find_by_project(project_id).await?;
    estimates.sort_by(|a, b| b.version.cmp(&a.version));
    Ok(estimates)
}

pub async fn create_estimate(
    db: &DBService,
    config: &KernelConfig,
    project_id: Uuid,
    data: CreateEstimate,
    now: DateTime<Utc>,
) -> Result<Estimate, KernelError> {
    let project = require_project(db, project_id).await?;
    let existing = list_estimates(db, project_id).await?;
    let version = existing.iter().map(|e| e.version).max().unwrap_or(0) + 1;

    let estimate = build_estimate(
        project_id,
        &project.project_number,
        version,
        data,
        config.tax_rate_bp,
        now,
    )?;
    validate_estimate(&estimate, config.tax_rate_bp)?;

    let stored = db.insert(&estimate).await?;
    info!(
        project_id = %project_id,
        estimate_id = %stored.id,
        version = stored.version,
        total = stored.total,
        "Estimate created"
    );
    Ok(stored)
}

pub async fn set_estimate_status(
    db: &DBService,
    id: Uuid,
    status: EstimateStatus,
) -> Result<Estimate, KernelError> {
    let mut estimate: Estimate = db
        .find_by_id(id)
        .await?
        .ok_or_else(|| KernelError::not_found(Collection::Estimates, id))?;
    if estimate.status == status {
        return Ok(estimate);
    }
    let from = estimate.status;
    estimate.status = status;
    let stored = db.replace(&estimate).await?;
    info!(estimate_id = %id, from = %from, to = %status, "Estimate status changed");
    Ok(stored)
}
