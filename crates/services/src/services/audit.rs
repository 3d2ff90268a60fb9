//! Read-only consistency audit over everything already in the store.
//!
//! Records written before the rules were enforced are reported, never rewritten.

use std::collections::HashSet;

use db::{
    DBService,
    models::{
        Entity, ProjectChild,
        construction_schedule::ConstructionSchedule,
        customer::Customer,
        drawing::Drawing,
        estimate::Estimate,
        from_document,
        inspection::Inspection,
        material::Material,
        production_process::ProductionProcess,
        project::Project,
    },
    store::{Collection, Filter},
};
use serde::Serialize;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    config::KernelConfig,
    consistency::{
        Rule, Violations, validate_customer, validate_drawing, validate_estimate,
        validate_estimate_versions, validate_inspection, validate_material,
        validate_process_sequences, validate_production_process, validate_project,
        validate_project_numbers, validate_schedule,
    },
    error::KernelError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub collection: Collection,
    /// `None` when the finding spans several records of the collection
    pub record_id: Option<Uuid>,
    pub violations: Violations,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub checked: usize,
    pub findings: Vec<Finding>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.is_clean() {
            format!("Store OK - {} records checked", self.checked)
        } else {
            let violations: usize = self.findings.iter().map(|f| f.violations.len()).sum();
            format!(
                "{} findings ({violations} violations) in {} records checked",
                self.findings.len(),
                self.checked
            )
        }
    }

    fn record(&mut self, collection: Collection, record_id: Option<Uuid>, violations: Violations) {
        warn!(
            collection = %collection,
            record_id = ?record_id,
            violations = %violations,
            "Audit finding"
        );
        self.findings.push(Finding {
            collection,
            record_id,
            violations,
        });
    }
}

async fn audit_collection<T, F>(
    db: &DBService,
    report: &mut AuditReport,
    validate: F,
) -> Result<Vec<T>, KernelError>
where
    T: Entity,
    F: Fn(&T) -> Result<(), Violations>,
{
    let documents = db.store.list(T::COLLECTION, &Filter::new()).await?;
    let mut records = Vec::with_capacity(documents.len());
    for document in documents {
        report.checked += 1;
        let id = document.id;
        match from_document::<T>(document) {
            Ok(record) => {
                if let Err(violations) = validate(&record) {
                    report.record(T::COLLECTION, Some(id), violations);
                }
                records.push(record);
            }
            Err(err) => {
                let mut violations = Violations::new();
                violations.push("document", Rule::Malformed, err.to_string());
                report.record(T::COLLECTION, Some(id), violations);
            }
        }
    }
    Ok(records)
}

fn check_orphans<T: ProjectChild>(
    records: &[T],
    projects: &HashSet<Uuid>,
    report: &mut AuditReport,
) {
    for record in records {
        if !projects.contains(&record.project_id()) {
            let mut violations = Violations::new();
            violations.push(
                "projectId",
                Rule::OrphanedRecord,
                format!("project {} does not exist", record.project_id()),
            );
            report.record(T::COLLECTION, Some(record.id()), violations);
        }
    }
}

fn check_customer_refs(projects: &[Project], customers: &HashSet<Uuid>, report: &mut AuditReport) {
    for project in projects {
        if let Some(customer_id) = project.customer_id {
            if !customers.contains(&customer_id) {
                let mut violations = Violations::new();
                violations.push(
                    "customerId",
                    Rule::OrphanedRecord,
                    format!("customer {customer_id} does not exist"),
                );
                report.record(Collection::Projects, Some(project.id), violations);
            }
        }
    }
}

/// Run every consistency rule over every stored record without modifying anything
pub async fn audit_store(db: &DBService, config: &KernelConfig) -> Result<AuditReport, KernelError> {
    let mut report = AuditReport::default();

    let projects: Vec<Project> = audit_collection(db, &mut report, validate_project).await?;
    let project_ids: HashSet<Uuid> = projects.iter().map(|p| p.id).collect();
    if let Err(violations) = validate_project_numbers(&projects) {
        report.record(Collection::Projects, None, violations);
    }

    let customers: Vec<Customer> = audit_collection(db, &mut report, validate_customer).await?;
    let customer_ids: HashSet<Uuid> = customers.iter().map(|c| c.id).collect();
    check_customer_refs(&projects, &customer_ids, &mut report);

    let estimates: Vec<Estimate> = audit_collection(db, &mut report, |estimate| {
        validate_estimate(estimate, config.tax_rate_bp)
    })
    .await?;
    if let Err(violations) = validate_estimate_versions(&estimates) {
        report.record(Collection::Estimates, None, violations);
    }
    check_orphans(&estimates, &project_ids, &mut report);

    let drawings: Vec<Drawing> = audit_collection(db, &mut report, validate_drawing).await?;
    check_orphans(&drawings, &project_ids, &mut report);

    let processes: Vec<ProductionProcess> =
        audit_collection(db, &mut report, validate_production_process).await?;
    if let Err(violations) = validate_process_sequences(&processes) {
        report.record(Collection::ProductionProcesses, None, violations);
    }
    check_orphans(&processes, &project_ids, &mut report);

    let materials: Vec<Material> = audit_collection(db, &mut report, validate_material).await?;
    check_orphans(&materials, &project_ids, &mut report);

    let schedules: Vec<ConstructionSchedule> =
        audit_collection(db, &mut report, validate_schedule).await?;
    check_orphans(&schedules, &project_ids, &mut report);

    let inspections: Vec<Inspection> =
        audit_collection(db, &mut report, validate_inspection).await?;
    check_orphans(&inspections, &project_ids, &mut report);

    info!(
        checked = report.checked,
        findings = report.findings.len(),
        "{}",
        report.summary()
    );
    Ok(report)
}
