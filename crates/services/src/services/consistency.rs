//! Per-entity consistency rules.
//!
//! Every validator is pure and collects all violations instead of stopping at the first,
//! so a form can highlight every offending field in one round trip. Callers must not
//! persist a record that produced any violation.

use std::{collections::HashMap, fmt};

use chrono::{DateTime, Utc};
use db::models::{
    construction_schedule::{ConstructionSchedule, ConstructionTask, ConstructionTaskStatus},
    customer::Customer,
    drawing::{Drawing, DrawingStatus},
    estimate::Estimate,
    inspection::{Inspection, InspectionResult, ItemResult},
    material::{Material, MaterialStatus},
    production_process::{ProductionProcess, WorkStatus},
    project::{Project, ProjectNumber, ProjectStatus},
};
use serde::Serialize;
use strum_macros::Display;
use ts_rs::TS;

use super::{
    estimates::EstimateTotals,
    lifecycle::{PhaseTarget, is_contracted_or_later, phase_for},
};

/// Identifier of the rule a violation broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Rule {
    ContractDateMatchesStatus,
    CompletionDateMatchesStatus,
    ContractBeforeDelivery,
    PhaseMatchesStatus,
    ProjectNumberFormat,
    Immutable,
    Required,
    NonNegative,
    Positive,
    Range,
    TotalsMatchItems,
    ProgressMatchesStatus,
    UniqueSequence,
    UniqueVersion,
    UniqueProjectNumber,
    DateOrder,
    ForwardOnly,
    ScheduleStatusMatchesTasks,
    ResultMatchesItems,
    ApprovalRequiresApprover,
    Email,
    /// Reference to a project or customer that does not exist
    OrphanedRecord,
    /// Stored document could not be read back as its record type
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct Violation {
    pub field: String,
    pub rule: Rule,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, rule: Rule, message: impl Into<String>) {
        self.0.push(Violation {
            field: field.into(),
            rule,
            message: message.into(),
        });
    }

    pub fn extend(&mut self, other: Violations) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    /// True if any violation names `field`
    pub fn references(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    pub fn has_rule(&self, rule: Rule) -> bool {
        self.0.iter().any(|v| v.rule == rule)
    }

    pub fn into_result(self) -> Result<(), Violations> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    fn required(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, Rule::Required, format!("{field} is required"));
        }
    }

    fn non_negative(&mut self, field: &str, value: Option<i64>) {
        if let Some(value) = value.filter(|v| *v < 0) {
            self.push(field, Rule::NonNegative, format!("{field} must not be negative, got {value}"));
        }
    }

    fn date_order(
        &mut self,
        field: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                self.push(field, Rule::DateOrder, format!("{field} is before the start date"));
            }
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|v| format!("{} ({}): {}", v.field, v.rule, v.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn check_project(project: &Project, v: &mut Violations) {
    v.required("name", &project.name);
    v.required("location", &project.location);
    v.required("structureType", &project.structure_type);

    if let Err(err) = ProjectNumber::parse(&project.project_number) {
        v.push("projectNumber", Rule::ProjectNumberFormat, err.to_string());
    }

    v.non_negative("estimatedAmount", project.estimated_amount);
    v.non_negative("contractAmount", project.contract_amount);
    if project.estimated_area.is_some_and(|area| !(area >= 0.0)) {
        v.push("estimatedArea", Rule::NonNegative, "estimatedArea must not be negative");
    }

    let contracted = is_contracted_or_later(project.status);
    match (project.contract_date.is_some(), contracted) {
        (false, true) => v.push(
            "contractDate",
            Rule::ContractDateMatchesStatus,
            format!("contractDate is required once status is {}", project.status),
        ),
        (true, false) => v.push(
            "contractDate",
            Rule::ContractDateMatchesStatus,
            format!("contractDate must be empty while status is {}", project.status),
        ),
        _ => {}
    }

    let completed = project.status == ProjectStatus::Completed;
    match (project.completion_date.is_some(), completed) {
        (false, true) => v.push(
            "completionDate",
            Rule::CompletionDateMatchesStatus,
            "completionDate is required for a completed project",
        ),
        (true, false) => v.push(
            "completionDate",
            Rule::CompletionDateMatchesStatus,
            format!("completionDate must be empty while status is {}", project.status),
        ),
        _ => {}
    }

    let delivery_first = match (project.contract_date, project.delivery_date) {
        (Some(contract), Some(delivery)) => contract > delivery,
        _ => false,
    };
    if delivery_first {
        v.push(
            "deliveryDate",
            Rule::ContractBeforeDelivery,
            "deliveryDate must not precede contractDate",
        );
    }

    // cancelled keeps whichever phase it was cancelled in
    if let PhaseTarget::Enter(expected) = phase_for(project.status) {
        if expected != project.current_phase {
            v.push(
                "currentPhase",
                Rule::PhaseMatchesStatus,
                format!(
                    "status {} belongs to phase {expected}, not {}",
                    project.status, project.current_phase
                ),
            );
        }
    }
}

pub fn validate_project(project: &Project) -> Result<(), Violations> {
    let mut v = Violations::new();
    check_project(project, &mut v);
    v.into_result()
}

/// Validate the replacement of `before` by `after`
pub fn validate_project_update(before: &Project, after: &Project) -> Result<(), Violations> {
    let mut v = Violations::new();
    check_project(after, &mut v);
    if before.project_number != after.project_number {
        v.push(
            "projectNumber",
            Rule::Immutable,
            format!("projectNumber cannot change from {}", before.project_number),
        );
    }
    if before.inquiry_date != after.inquiry_date {
        v.push("inquiryDate", Rule::Immutable, "inquiryDate cannot change");
    }
    v.into_result()
}

/// `projectNumber` is unique across all projects
pub fn validate_project_numbers(projects: &[Project]) -> Result<(), Violations> {
    let mut v = Violations::new();
    for (number, count) in tally(projects.iter().map(|p| p.project_number.as_str())) {
        if count > 1 {
            v.push(
                "projectNumber",
                Rule::UniqueProjectNumber,
                format!("project number {number} used by {count} projects"),
            );
        }
    }
    v.into_result()
}

pub fn validate_customer(customer: &Customer) -> Result<(), Violations> {
    let mut v = Violations::new();
    v.required("companyName", &customer.company_name);
    v.required("contactName", &customer.contact_name);
    let email = customer.email.trim();
    if !email.is_empty() && !email.contains('@') {
        v.push("email", Rule::Email, format!("{email:?} is not an email address"));
    }
    v.into_result()
}

pub fn validate_estimate(estimate: &Estimate, tax_rate_bp: u32) -> Result<(), Violations> {
    let mut v = Violations::new();
    v.required("estimateNumber", &estimate.estimate_number);
    if estimate.version < 1 {
        v.push("version", Rule::Positive, "version starts at 1");
    }
    if estimate.items.is_empty() {
        v.push("items", Rule::Required, "an estimate needs at least one item");
    }
    for (i, item) in estimate.items.iter().enumerate() {
        v.required(&format!("items[{i}].description"), &item.description);
        if item.quantity < 1 {
            v.push(
                format!("items[{i}].quantity"),
                Rule::Positive,
                format!("quantity must be at least 1, got {}", item.quantity),
            );
        }
        v.non_negative(&format!("items[{i}].unitPrice"), Some(item.unit_price));
        match item.quantity.checked_mul(item.unit_price) {
            None => v.push(
                format!("items[{i}].amount"),
                Rule::Range,
                "quantity × unitPrice is too large",
            ),
            Some(amount) if amount != item.amount => v.push(
                format!("items[{i}].amount"),
                Rule::TotalsMatchItems,
                "amount must equal quantity × unitPrice",
            ),
            Some(_) => {}
        }
    }

    let Some(expected) = EstimateTotals::compute(&estimate.items, tax_rate_bp) else {
        v.push("subtotal", Rule::Range, "estimate total is too large");
        return v.into_result();
    };
    for (field, stored, computed) in [
        ("subtotal", estimate.subtotal, expected.subtotal),
        ("tax", estimate.tax, expected.tax),
        ("total", estimate.total, expected.total),
    ] {
        if stored != computed {
            v.push(
                field,
                Rule::TotalsMatchItems,
                format!("{field} is {stored}, items give {computed}"),
            );
        }
    }
    v.into_result()
}

/// No two estimates of one project may share a version
pub fn validate_estimate_versions(estimates: &[Estimate]) -> Result<(), Violations> {
    let mut v = Violations::new();
    for ((project_id, version), count) in
        tally(estimates.iter().map(|e| (e.project_id, e.version)))
    {
        if count > 1 {
            v.push(
                "version",
                Rule::UniqueVersion,
                format!("version {version} used {count} times in project {project_id}"),
            );
        }
    }
    v.into_result()
}

pub fn validate_drawing(drawing: &Drawing) -> Result<(), Violations> {
    let mut v = Violations::new();
    v.required("drawingNumber", &drawing.drawing_number);
    v.required("name", &drawing.name);
    v.required("createdBy", &drawing.created_by);
    if drawing.version < 1 {
        v.push("version", Rule::Positive, "version starts at 1");
    }
    let approver = drawing.approved_by.as_deref().unwrap_or_default();
    if drawing.status == DrawingStatus::Approved && approver.trim().is_empty() {
        v.push(
            "approvedBy",
            Rule::ApprovalRequiresApprover,
            "an approved drawing must name its approver",
        );
    }
    v.into_result()
}

pub fn validate_production_process(process: &ProductionProcess) -> Result<(), Violations> {
    let mut v = Violations::new();
    v.required("name", &process.name);
    if process.sequence < 1 {
        v.push("sequence", Rule::Positive, "sequence starts at 1");
    }
    if !(0..=100).contains(&process.progress) {
        v.push(
            "progress",
            Rule::Range,
            format!("progress must be within 0..=100, got {}", process.progress),
        );
    }
    match process.status {
        WorkStatus::Completed if process.progress != 100 => v.push(
            "progress",
            Rule::ProgressMatchesStatus,
            "a completed process is at 100%",
        ),
        WorkStatus::Pending if process.progress != 0 => v.push(
            "progress",
            Rule::ProgressMatchesStatus,
            "a pending process is at 0%",
        ),
        _ => {}
    }
    v.date_order(
        "plannedEndDate",
        Some(process.planned_start_date),
        Some(process.planned_end_date),
    );
    v.date_order("actualEndDate", process.actual_start_date, process.actual_end_date);
    v.into_result()
}

/// Process sequences must be unique within each project
pub fn validate_process_sequences(processes: &[ProductionProcess]) -> Result<(), Violations> {
    let mut v = Violations::new();
    for ((project_id, sequence), count) in
        tally(processes.iter().map(|p| (p.project_id, p.sequence)))
    {
        if count > 1 {
            v.push(
                "sequence",
                Rule::UniqueSequence,
                format!("sequence {sequence} used {count} times in project {project_id}"),
            );
        }
    }
    v.into_result()
}

pub fn validate_material(material: &Material) -> Result<(), Violations> {
    let mut v = Violations::new();
    v.required("name", &material.name);
    v.required("unit", &material.unit);
    if !(material.quantity >= 0.0) {
        v.push("quantity", Rule::NonNegative, "quantity must not be negative");
    }
    v.non_negative("cost", material.cost);
    v.date_order("receivedDate", material.ordered_date, material.received_date);
    v.into_result()
}

/// Procurement status only moves forward; staying put is allowed
pub fn validate_material_transition(
    from: MaterialStatus,
    to: MaterialStatus,
) -> Result<(), Violations> {
    let mut v = Violations::new();
    if to < from {
        v.push(
            "status",
            Rule::ForwardOnly,
            format!("material cannot go back from {from} to {to}"),
        );
    }
    v.into_result()
}

/// Schedule status implied by its tasks
pub fn derive_schedule_status(tasks: &[ConstructionTask]) -> WorkStatus {
    if tasks.is_empty() {
        return WorkStatus::Pending;
    }
    let all = |status: ConstructionTaskStatus| tasks.iter().all(|t| t.status == status);
    if all(ConstructionTaskStatus::Completed) {
        WorkStatus::Completed
    } else if all(ConstructionTaskStatus::Pending) {
        WorkStatus::Pending
    } else {
        WorkStatus::InProgress
    }
}

pub fn validate_schedule(schedule: &ConstructionSchedule) -> Result<(), Violations> {
    let mut v = Violations::new();
    v.date_order(
        "plannedEndDate",
        Some(schedule.planned_start_date),
        Some(schedule.planned_end_date),
    );
    v.date_order("actualEndDate", schedule.actual_start_date, schedule.actual_end_date);

    for (i, task) in schedule.tasks.iter().enumerate() {
        v.required(&format!("tasks[{i}].name"), &task.name);
        if task.sequence < 1 {
            v.push(format!("tasks[{i}].sequence"), Rule::Positive, "sequence starts at 1");
        }
        v.date_order(
            &format!("tasks[{i}].plannedEndDate"),
            Some(task.planned_start_date),
            Some(task.planned_end_date),
        );
    }
    for (sequence, count) in tally(schedule.tasks.iter().map(|t| t.sequence)) {
        if count > 1 {
            v.push(
                "tasks",
                Rule::UniqueSequence,
                format!("task sequence {sequence} used {count} times"),
            );
        }
    }

    let derived = derive_schedule_status(&schedule.tasks);
    let consistent = match schedule.status {
        // delay is a manual flag, meaningless once everything is done
        WorkStatus::Delayed => derived != WorkStatus::Completed,
        status => status == derived,
    };
    if !consistent {
        v.push(
            "status",
            Rule::ScheduleStatusMatchesTasks,
            format!("tasks imply {derived}, schedule says {}", schedule.status),
        );
    }
    v.into_result()
}

pub fn validate_inspection(inspection: &Inspection) -> Result<(), Violations> {
    let mut v = Violations::new();
    v.required("inspector", &inspection.inspector);
    for (i, item) in inspection.check_items.iter().enumerate() {
        v.required(&format!("checkItems[{i}].item"), &item.item);
    }

    let applicable: Vec<ItemResult> = inspection
        .check_items
        .iter()
        .map(|item| item.result)
        .filter(|result| *result != ItemResult::Na)
        .collect();
    let any_fail = applicable.contains(&ItemResult::Fail);
    let all_pass = !applicable.is_empty() && applicable.iter().all(|r| *r == ItemResult::Pass);
    if any_fail && inspection.result == InspectionResult::Pass {
        v.push(
            "result",
            Rule::ResultMatchesItems,
            "an inspection with a failed item cannot pass",
        );
    }
    if all_pass && inspection.result != InspectionResult::Pass {
        v.push(
            "result",
            Rule::ResultMatchesItems,
            format!("every item passed but the result is {}", inspection.result),
        );
    }
    v.into_result()
}

fn tally<K: std::hash::Hash + Eq + Ord>(keys: impl Iterator<Item = K>) -> Vec<(K, usize)> {
    let mut counts: HashMap<K, usize> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort();
    counts
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use db::models::{
        drawing::DrawingType,
        estimate::{CreateEstimateItem, EstimateStatus},
        inspection::{InspectionItem, InspectionType},
        project::ProjectPhase,
    };
    use uuid::Uuid;

    use super::*;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap()
    }

    fn project(status: ProjectStatus, phase: ProjectPhase) -> Project {
        Project {
            id: Uuid::new_v4(),
            project_number: "YS-2024-001".to_string(),
            name: "Stadium canopy".to_string(),
            customer_id: None,
            status,
            current_phase: phase,
            description: None,
            location: "Osaka".to_string(),
            structure_type: "tension membrane".to_string(),
            estimated_area: Some(1200.0),
            estimated_amount: Some(45_000_000),
            contract_amount: None,
            inquiry_date: at(1),
            contract_date: None,
            delivery_date: None,
            completion_date: None,
            sales_person_id: None,
            designer_id: None,
            production_manager_id: None,
            site_manager_id: None,
            created_at: at(1),
            updated_at: at(1),
        }
    }

    #[test]
    fn test_contracted_without_contract_date_fails() {
        let p = project(ProjectStatus::Contracted, ProjectPhase::Sales);
        let violations = validate_project(&p).unwrap_err();
        assert!(violations.references("contractDate"));
        assert!(violations.has_rule(Rule::ContractDateMatchesStatus));

        let fixed = Project {
            contract_date: Some(at(3)),
            ..p
        };
        assert!(validate_project(&fixed).is_ok());
    }

    #[test]
    fn test_project_numbers_unique() {
        let first = project(ProjectStatus::Inquiry, ProjectPhase::Sales);
        let second = project(ProjectStatus::Estimating, ProjectPhase::Sales);
        let violations = validate_project_numbers(&[first.clone(), second.clone()]).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert!(violations.has_rule(Rule::UniqueProjectNumber));

        let renumbered = Project {
            project_number: "YS-2024-002".to_string(),
            ..second
        };
        assert!(validate_project_numbers(&[first, renumbered]).is_ok());
    }

    #[test]
    fn test_phase_must_match_status() {
        let mut p = project(ProjectStatus::Designing, ProjectPhase::Sales);
        p.contract_date = Some(at(2));
        let violations = validate_project(&p).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert!(violations.references("currentPhase"));

        p.current_phase = ProjectPhase::Design;
        assert!(validate_project(&p).is_ok());
    }

    #[test]
    fn test_cancelled_accepts_any_phase_but_no_contract_date() {
        let mut p = project(ProjectStatus::Cancelled, ProjectPhase::Manufacturing);
        assert!(validate_project(&p).is_ok());
        p.contract_date = Some(at(2));
        assert!(validate_project(&p).unwrap_err().references("contractDate"));
    }

    #[test]
    fn test_completion_date_only_when_completed() {
        let mut p = project(ProjectStatus::Completed, ProjectPhase::Construction);
        p.contract_date = Some(at(2));
        assert!(validate_project(&p).unwrap_err().references("completionDate"));
        p.completion_date = Some(at(20));
        assert!(validate_project(&p).is_ok());

        let mut open = project(ProjectStatus::Inquiry, ProjectPhase::Sales);
        open.completion_date = Some(at(20));
        assert!(validate_project(&open).unwrap_err().references("completionDate"));
    }

    #[test]
    fn test_collects_every_violation() {
        let mut p = project(ProjectStatus::Installing, ProjectPhase::Sales);
        p.name = "  ".to_string();
        p.project_number = "YS-24-1".to_string();
        p.contract_amount = Some(-1);
        p.contract_date = Some(at(10));
        p.delivery_date = Some(at(5));
        let violations = validate_project(&p).unwrap_err();
        for field in [
            "name",
            "projectNumber",
            "contractAmount",
            "deliveryDate",
            "currentPhase",
        ] {
            assert!(violations.references(field), "missing {field}: {violations}");
        }
        assert_eq!(violations.len(), 5);
    }

    #[test]
    fn test_update_keeps_identity_fields() {
        let before = project(ProjectStatus::Inquiry, ProjectPhase::Sales);
        let mut after = before.clone();
        after.project_number = "YS-2024-002".to_string();
        after.inquiry_date = at(2);
        let violations = validate_project_update(&before, &after).unwrap_err();
        assert!(violations.references("projectNumber"));
        assert!(violations.references("inquiryDate"));
        assert!(violations.iter().all(|v| v.rule == Rule::Immutable));
    }

    #[test]
    fn test_customer_rules() {
        let mut customer = Customer {
            id: Uuid::new_v4(),
            company_name: "Taiyo Sports".to_string(),
            contact_name: String::new(),
            email: "sato.example.jp".to_string(),
            phone: String::new(),
            address: String::new(),
            notes: None,
            created_at: at(1),
            updated_at: at(1),
        };
        let violations = validate_customer(&customer).unwrap_err();
        assert!(violations.references("contactName"));
        assert!(violations.references("email"));

        customer.contact_name = "Sato".to_string();
        customer.email = String::new();
        assert!(validate_customer(&customer).is_ok());
    }

    fn estimate(items: Vec<CreateEstimateItem>) -> Estimate {
        let items: Vec<_> = items
            .into_iter()
            .map(|item| item.into_item().unwrap())
            .collect();
        let totals = EstimateTotals::compute(&items, 1000).unwrap();
        Estimate {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            estimate_number: "EST-001".to_string(),
            version: 1,
            items,
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
            valid_until: at(31),
            notes: None,
            status: EstimateStatus::Draft,
            created_at: at(1),
            updated_at: at(1),
        }
    }

    fn item(quantity: i64, unit: &str, unit_price: i64) -> CreateEstimateItem {
        CreateEstimateItem {
            description: "membrane".to_string(),
            quantity,
            unit: unit.to_string(),
            unit_price,
        }
    }

    #[test]
    fn test_estimate_totals_must_match_items() {
        let mut e = estimate(vec![item(2, "m²", 1000), item(1, "式", 500)]);
        assert!(validate_estimate(&e, 1000).is_ok());

        e.total += 1;
        let violations = validate_estimate(&e, 1000).unwrap_err();
        assert!(violations.references("total"));
        assert!(!violations.references("subtotal"));

        // same record is wrong under a different tax rate
        e.total -= 1;
        assert!(validate_estimate(&e, 800).unwrap_err().references("tax"));
    }

    #[test]
    fn test_estimate_item_rules() {
        let e = estimate(vec![item(0, "m²", -5)]);
        let violations = validate_estimate(&e, 1000).unwrap_err();
        assert!(violations.references("items[0].quantity"));
        assert!(violations.references("items[0].unitPrice"));

        let empty = estimate(Vec::new());
        assert!(validate_estimate(&empty, 1000).unwrap_err().references("items"));
    }

    #[test]
    fn test_estimate_overflow_is_a_range_violation() {
        let mut e = estimate(vec![item(1, "式", 1000)]);
        e.items[0].quantity = i64::MAX / 2;
        e.items[0].unit_price = 3;
        e.subtotal = i64::MAX;
        e.tax = i64::MAX / 10;
        e.total = i64::MAX;
        let violations = validate_estimate(&e, 1000).unwrap_err();
        assert!(violations.references("items[0].amount"));
        assert!(violations.references("subtotal"));
        assert!(violations.iter().all(|v| v.rule == Rule::Range));
    }

    #[test]
    fn test_estimate_versions_unique_per_project() {
        let first = estimate(vec![item(1, "式", 100)]);
        let mut second = first.clone();
        second.id = Uuid::new_v4();
        let mut other_project = first.clone();
        other_project.project_id = Uuid::new_v4();

        assert!(validate_estimate_versions(&[first.clone(), other_project]).is_ok());
        assert!(
            validate_estimate_versions(&[first, second])
                .unwrap_err()
                .has_rule(Rule::UniqueVersion)
        );
    }

    #[test]
    fn test_drawing_approval_needs_approver() {
        let mut drawing = Drawing {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            drawing_number: "D-101".to_string(),
            name: "Roof plan".to_string(),
            drawing_type: DrawingType::Plan,
            version: 1,
            file_url: "drawings/d-101.pdf".to_string(),
            status: DrawingStatus::Approved,
            created_by: "designer-1".to_string(),
            reviewed_by: None,
            approved_by: None,
            created_at: at(1),
            updated_at: at(1),
        };
        assert!(validate_drawing(&drawing).unwrap_err().references("approvedBy"));
        drawing.approved_by = Some("lead".to_string());
        assert!(validate_drawing(&drawing).is_ok());
    }

    fn process(sequence: i32, status: WorkStatus, progress: i32) -> ProductionProcess {
        ProductionProcess {
            id: Uuid::new_v4(),
            project_id: Uuid::nil(),
            name: "Cutting".to_string(),
            sequence,
            planned_start_date: at(1),
            planned_end_date: at(5),
            actual_start_date: None,
            actual_end_date: None,
            status,
            progress,
            assigned_to: None,
            notes: None,
            created_at: at(1),
            updated_at: at(1),
        }
    }

    #[test]
    fn test_process_progress_rules() {
        assert!(validate_production_process(&process(1, WorkStatus::InProgress, 40)).is_ok());
        assert!(validate_production_process(&process(1, WorkStatus::Delayed, 40)).is_ok());
        for bad in [
            process(1, WorkStatus::Completed, 90),
            process(1, WorkStatus::Pending, 10),
        ] {
            assert!(
                validate_production_process(&bad)
                    .unwrap_err()
                    .has_rule(Rule::ProgressMatchesStatus)
            );
        }
        assert!(
            validate_production_process(&process(1, WorkStatus::InProgress, 101))
                .unwrap_err()
                .has_rule(Rule::Range)
        );
        let mut backwards = process(1, WorkStatus::InProgress, 50);
        backwards.planned_end_date = backwards.planned_start_date - Duration::days(1);
        assert!(
            validate_production_process(&backwards)
                .unwrap_err()
                .references("plannedEndDate")
        );
    }

    #[test]
    fn test_process_sequences_unique() {
        let ok = [
            process(1, WorkStatus::Pending, 0),
            process(2, WorkStatus::Pending, 0),
        ];
        assert!(validate_process_sequences(&ok).is_ok());
        let dup = [
            process(1, WorkStatus::Pending, 0),
            process(1, WorkStatus::Pending, 0),
        ];
        assert!(validate_process_sequences(&dup).is_err());
    }

    #[test]
    fn test_material_moves_forward_only() {
        assert!(validate_material_transition(MaterialStatus::Pending, MaterialStatus::Ordered).is_ok());
        assert!(validate_material_transition(MaterialStatus::Ordered, MaterialStatus::Ordered).is_ok());
        assert!(validate_material_transition(MaterialStatus::Pending, MaterialStatus::Received).is_ok());
        assert!(
            validate_material_transition(MaterialStatus::Received, MaterialStatus::Ordered)
                .unwrap_err()
                .has_rule(Rule::ForwardOnly)
        );
    }

    fn task(sequence: i32, status: ConstructionTaskStatus) -> ConstructionTask {
        ConstructionTask {
            id: Uuid::new_v4(),
            name: "Frame erection".to_string(),
            sequence,
            planned_start_date: at(1),
            planned_end_date: at(3),
            actual_start_date: None,
            actual_end_date: None,
            status,
            assigned_team: None,
            notes: None,
        }
    }

    #[test]
    fn test_schedule_status_derivation() {
        use ConstructionTaskStatus as T;
        assert_eq!(derive_schedule_status(&[]), WorkStatus::Pending);
        assert_eq!(
            derive_schedule_status(&[task(1, T::Pending), task(2, T::Pending)]),
            WorkStatus::Pending
        );
        assert_eq!(
            derive_schedule_status(&[task(1, T::Completed), task(2, T::Pending)]),
            WorkStatus::InProgress
        );
        assert_eq!(
            derive_schedule_status(&[task(1, T::Completed), task(2, T::Completed)]),
            WorkStatus::Completed
        );
    }

    #[test]
    fn test_schedule_status_must_follow_tasks() {
        let mut schedule = ConstructionSchedule {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            tasks: vec![
                task(1, ConstructionTaskStatus::Completed),
                task(2, ConstructionTaskStatus::InProgress),
            ],
            planned_start_date: at(1),
            planned_end_date: at(10),
            actual_start_date: None,
            actual_end_date: None,
            status: WorkStatus::Completed,
            created_at: at(1),
            updated_at: at(1),
        };
        assert!(validate_schedule(&schedule).unwrap_err().references("status"));
        schedule.status = WorkStatus::Delayed;
        assert!(validate_schedule(&schedule).is_ok());
        schedule.status = WorkStatus::InProgress;
        assert!(validate_schedule(&schedule).is_ok());

        schedule.tasks.push(task(2, ConstructionTaskStatus::Pending));
        assert!(
            validate_schedule(&schedule)
                .unwrap_err()
                .has_rule(Rule::UniqueSequence)
        );
    }

    fn inspection(result: InspectionResult, items: &[ItemResult]) -> Inspection {
        Inspection {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            inspection_type: InspectionType::Final,
            date: at(20),
            inspector: "Tanaka".to_string(),
            result,
            check_items: items
                .iter()
                .map(|r| InspectionItem {
                    id: Uuid::new_v4(),
                    item: "tension".to_string(),
                    standard: "±5%".to_string(),
                    result: *r,
                    notes: None,
                })
                .collect(),
            photos: Vec::new(),
            notes: None,
            created_at: at(20),
            updated_at: at(20),
        }
    }

    #[test]
    fn test_inspection_result_follows_items() {
        use InspectionResult::*;
        use ItemResult as I;

        assert!(validate_inspection(&inspection(Pass, &[I::Pass, I::Na])).is_ok());
        assert!(validate_inspection(&inspection(Conditional, &[I::Pass, I::Pass])).is_err());
        assert!(validate_inspection(&inspection(Pass, &[I::Pass, I::Fail])).is_err());
        assert!(validate_inspection(&inspection(Fail, &[I::Pass, I::Fail])).is_ok());
        assert!(validate_inspection(&inspection(Conditional, &[I::Fail])).is_ok());
        // nothing applicable constrains nothing
        assert!(validate_inspection(&inspection(Conditional, &[I::Na])).is_ok());
        assert!(validate_inspection(&inspection(Fail, &[])).is_ok());
    }
}
