//! Project records: creation, edits, lifecycle transitions and deletion.

use chrono::{DateTime, Datelike, Utc};
use db::{
    DBService,
    models::project::{
        CreateProject, Project, ProjectNumber, ProjectPhase, ProjectStatus, UpdateProject,
    },
    store::{Collection, Filter},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    config::{DeletePolicy, KernelConfig},
    consistency::{Rule, Violations, validate_project, validate_project_update},
    customers::get_customer,
    error::KernelError,
    lifecycle::{LifecycleState, is_contracted_or_later},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ProjectQuery {
    pub status: Option<ProjectStatus>,
    pub phase: Option<ProjectPhase>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    pub to: ProjectStatus,
    /// Administrative correction: skips the transition table, must say why
    #[serde(default)]
    pub override_reason: Option<String>,
    /// When the change happened; defaults to now
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

impl TransitionRequest {
    pub fn to(status: ProjectStatus) -> Self {
        Self {
            to: status,
            override_reason: None,
            at: None,
        }
    }
}

/// Child records referencing one project, grouped by collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectChildren {
    pub by_collection: Vec<(Collection, Vec<Uuid>)>,
}

impl ProjectChildren {
    pub fn count(&self) -> usize {
        self.by_collection.iter().map(|(_, ids)| ids.len()).sum()
    }
}

/// Next free number for `prefix`/`year`: highest existing sequence plus one
pub fn next_project_number<'a>(
    existing: impl IntoIterator<Item = &'a str>,
    prefix: &str,
    year: i32,
) -> Result<ProjectNumber, KernelError> {
    let highest = existing
        .into_iter()
        .filter_map(|raw| ProjectNumber::parse(raw).ok())
        .filter(|number| number.prefix() == prefix && number.year() == year)
        .map(|number| number.sequence())
        .max()
        .unwrap_or(0);
    ProjectNumber::new(prefix, year, highest + 1).map_err(|_| {
        KernelError::ProjectNumbersExhausted {
            prefix: prefix.to_string(),
            year,
        }
    })
}

pub async fn require_project(db: &DBService, id: Uuid) -> Result<Project, KernelError> {
    db.find_by_id(id)
        .await?
        .ok_or_else(|| KernelError::not_found(Collection::Projects, id))
}

/// A project may only point at a customer that exists
async fn check_customer(db: &DBService, customer_id: Option<Uuid>) -> Result<(), KernelError> {
    if let Some(id) = customer_id {
        get_customer(db, id).await?;
    }
    Ok(())
}

pub async fn get_project(db: &DBService, id: Uuid) -> Result<Project, KernelError> {
    debug!(project_id = %id, "Fetching project");
    require_project(db, id).await
}

pub async fn list_projects(db: &DBService, query: &ProjectQuery) -> Result<Vec<Project>, KernelError> {
    let mut filter = Filter::new();
    if let Some(status) = query.status {
        filter = filter.eq("status", status.to_string());
    }
    if let Some(phase) = query.phase {
        filter = filter.eq("currentPhase", phase.to_string());
    }
    if let Some(limit) = query.limit {
        filter = filter.limit(limit);
    }
    Ok(db.find_all(&filter).await?)
}

pub async fn create_project(
    db: &DBService,
    config: &KernelConfig,
    data: CreateProject,
    now: DateTime<Utc>,
) -> Result<Project, KernelError> {
    check_customer(db, data.customer_id).await?;
    let existing: Vec<Project> = db.find_all(&Filter::new()).await?;
    let project_number = match data.project_number {
        Some(number) => number.trim().to_string(),
        None => next_project_number(
            existing.iter().map(|p| p.project_number.as_str()),
            &config.project_number_prefix,
            now.year(),
        )?
        .to_string(),
    };

    let project = Project {
        id: Uuid::nil(),
        project_number,
        name: data.name,
        customer_id: data.customer_id,
        status: ProjectStatus::Inquiry,
        current_phase: ProjectPhase::Sales,
        description: data.description,
        location: data.location,
        structure_type: data.structure_type,
        estimated_area: data.estimated_area,
        estimated_amount: data.estimated_amount,
        contract_amount: None,
        inquiry_date: data.inquiry_date.unwrap_or(now),
        contract_date: None,
        delivery_date: None,
        completion_date: None,
        sales_person_id: data.sales_person_id,
        designer_id: None,
        production_manager_id: None,
        site_manager_id: None,
        created_at: now,
        updated_at: now,
    };
    let mut violations = validate_project(&project).err().unwrap_or_default();
    if existing
        .iter()
        .any(|p| p.project_number == project.project_number)
    {
        violations.push(
            "projectNumber",
            Rule::UniqueProjectNumber,
            format!("project number {} is already taken", project.project_number),
        );
    }
    violations.into_result()?;

    let stored = db.insert(&project).await?;
    info!(
        project_id = %stored.id,
        project_number = %stored.project_number,
        "Project created"
    );
    Ok(stored)
}

/// Edit descriptive fields; status and phase only move through `transition_project`
pub async fn update_project(
    db: &DBService,
    id: Uuid,
    data: UpdateProject,
) -> Result<Project, KernelError> {
    let current = require_project(db, id).await?;
    let next = current.with_update(data);
    validate_project_update(&current, &next)?;
    if next.customer_id != current.customer_id {
        check_customer(db, next.customer_id).await?;
    }
    let stored = db.replace(&next).await?;
    info!(project_id = %id, "Project updated");
    Ok(stored)
}

pub async fn transition_project(
    db: &DBService,
    id: Uuid,
    request: TransitionRequest,
) -> Result<Project, KernelError> {
    let current = require_project(db, id).await?;
    let from = current.status;
    if from == request.to {
        debug!(project_id = %id, status = %from, "Transition to current status ignored");
        return Ok(current);
    }

    let state = LifecycleState::of(&current);
    let next_state = match request.override_reason.as_deref().map(str::trim) {
        Some("") => {
            let mut v = Violations::new();
            v.push(
                "overrideReason",
                Rule::Required,
                "an override must state its reason",
            );
            return Err(v.into());
        }
        Some(reason) => {
            warn!(
                project_id = %id,
                from = %from,
                to = %request.to,
                reason = %reason,
                "Administrative status override"
            );
            state.force(request.to)
        }
        None => state.advance(request.to)?,
    };

    let at = request.at.unwrap_or_else(Utc::now);
    let mut next = current.clone();
    next.status = next_state.status();
    next.current_phase = next_state.phase();
    next.contract_date = if is_contracted_or_later(next.status) {
        current.contract_date.or(Some(at))
    } else {
        None
    };
    next.completion_date = if next.status == ProjectStatus::Completed {
        current.completion_date.or(Some(at))
    } else {
        None
    };
    validate_project_update(&current, &next)?;

    let stored = db.replace(&next).await?;
    info!(
        project_id = %id,
        from = %from,
        to = %stored.status,
        phase = %stored.current_phase,
        "Project status changed"
    );
    Ok(stored)
}

pub async fn find_children(db: &DBService, id: Uuid) -> Result<ProjectChildren, KernelError> {
    let filter = Filter::new().eq("projectId", id.to_string());
    let mut children = ProjectChildren::default();
    for collection in Collection::PROJECT_CHILDREN {
        let ids: Vec<Uuid> = db
            .store
            .list(collection, &filter)
            .await?
            .into_iter()
            .map(|doc| doc.id)
            .collect();
        if !ids.is_empty() {
            children.by_collection.push((collection, ids));
        }
    }
    Ok(children)
}

pub async fn delete_project(
    db: &DBService,
    config: &KernelConfig,
    id: Uuid,
) -> Result<(), KernelError> {
    require_project(db, id).await?;
    let children = find_children(db, id).await?;
    let count = children.count();

    if count > 0 {
        match config.delete_policy {
            DeletePolicy::Restrict => {
                warn!(project_id = %id, children = count, "Refusing to delete project with children");
                return Err(KernelError::HasChildren { id, count });
            }
            DeletePolicy::Cascade => {
                for (collection, ids) in &children.by_collection {
                    for child in ids {
                        db.store.delete(*collection, *child).await?;
                    }
                    info!(project_id = %id, collection = %collection, count = ids.len(), "Deleted child records");
                }
            }
        }
    }

    db.delete::<Project>(id).await?;
    info!(project_id = %id, "Project deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use db::models::{
        customer::CreateCustomer,
        material::{Material, MaterialStatus},
    };

    use super::*;
    use crate::services::customers::create_customer;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 10, 9, 0, 0).unwrap()
    }

    fn new_project(name: &str) -> CreateProject {
        CreateProject {
            name: name.to_string(),
            location: "Nagoya".to_string(),
            structure_type: "tension membrane".to_string(),
            estimated_amount: Some(30_000_000),
            ..Default::default()
        }
    }

    async fn setup() -> (DBService, KernelConfig, Project) {
        let db = DBService::in_memory();
        let config = KernelConfig::default();
        let project = create_project(&db, &config, new_project("Station canopy"), now())
            .await
            .unwrap();
        (db, config, project)
    }

    async fn walk(db: &DBService, id: Uuid, to: &[ProjectStatus]) -> Project {
        let mut last = None;
        for status in to {
            last = Some(transition_project(db, id, TransitionRequest::to(*status)).await.unwrap());
        }
        last.unwrap()
    }

    #[test]
    fn test_next_project_number() {
        let existing = ["YS-2024-001", "YS-2024-007", "YS-2023-050", "MK-2024-100", "junk"];
        assert_eq!(
            next_project_number(existing, "YS", 2024).unwrap().to_string(),
            "YS-2024-008"
        );
        assert_eq!(
            next_project_number(existing, "YS", 2025).unwrap().to_string(),
            "YS-2025-001"
        );
        assert!(matches!(
            next_project_number(["YS-2024-999"], "YS", 2024),
            Err(KernelError::ProjectNumbersExhausted { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let (db, config, created) = setup().await;
        assert_eq!(created.project_number, "YS-2024-001");
        assert_eq!(created.status, ProjectStatus::Inquiry);
        assert_eq!(created.current_phase, ProjectPhase::Sales);
        assert_eq!(created.inquiry_date, now());
        assert_ne!(created.id, Uuid::nil());

        let fetched = get_project(&db, created.id).await.unwrap();
        assert_eq!(fetched, created);

        let second = create_project(&db, &config, new_project("Arena roof"), now())
            .await
            .unwrap();
        assert_eq!(second.project_number, "YS-2024-002");
    }

    #[tokio::test]
    async fn test_create_rejects_missing_fields() {
        let db = DBService::in_memory();
        let err = create_project(&db, &KernelConfig::default(), CreateProject::default(), now())
            .await
            .unwrap_err();
        let KernelError::InvariantViolation(violations) = err else {
            panic!("expected invariant violation");
        };
        for field in ["name", "location", "structureType"] {
            assert!(violations.references(field));
        }
    }

    #[tokio::test]
    async fn test_full_lifecycle_stamps_dates() {
        let (db, _, project) = setup().await;
        let contracted = walk(
            &db,
            project.id,
            &[
                ProjectStatus::Estimating,
                ProjectStatus::Negotiating,
                ProjectStatus::Contracted,
            ],
        )
        .await;
        assert!(contracted.contract_date.is_some());
        assert_eq!(contracted.current_phase, ProjectPhase::Sales);

        let designing = walk(&db, project.id, &[ProjectStatus::Designing]).await;
        assert_eq!(designing.current_phase, ProjectPhase::Design);
        assert_eq!(designing.contract_date, contracted.contract_date);

        let completed = walk(
            &db,
            project.id,
            &[
                ProjectStatus::Manufacturing,
                ProjectStatus::Installing,
                ProjectStatus::Completed,
            ],
        )
        .await;
        assert_eq!(completed.current_phase, ProjectPhase::Construction);
        assert!(completed.completion_date.is_some());

        let err = transition_project(&db, project.id, TransitionRequest::to(ProjectStatus::Cancelled))
            .await
            .unwrap_err();
        assert!(matches!(err, KernelError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_skipping_requires_override() {
        let (db, _, project) = setup().await;
        let err = transition_project(&db, project.id, TransitionRequest::to(ProjectStatus::Designing))
            .await
            .unwrap_err();
        assert!(matches!(err, KernelError::InvalidTransition(_)));
        assert_eq!(
            get_project(&db, project.id).await.unwrap().status,
            ProjectStatus::Inquiry
        );

        let blank = TransitionRequest {
            override_reason: Some("  ".to_string()),
            ..TransitionRequest::to(ProjectStatus::Designing)
        };
        assert!(matches!(
            transition_project(&db, project.id, blank).await,
            Err(KernelError::InvariantViolation(_))
        ));

        let at = now() + Duration::days(3);
        let forced = transition_project(
            &db,
            project.id,
            TransitionRequest {
                to: ProjectStatus::Designing,
                override_reason: Some("contract signed on paper".to_string()),
                at: Some(at),
            },
        )
        .await
        .unwrap();
        assert_eq!(forced.status, ProjectStatus::Designing);
        assert_eq!(forced.current_phase, ProjectPhase::Design);
        assert_eq!(forced.contract_date, Some(at));
    }

    #[tokio::test]
    async fn test_cancel_keeps_phase_and_clears_contract_date() {
        let (db, _, project) = setup().await;
        walk(
            &db,
            project.id,
            &[
                ProjectStatus::Estimating,
                ProjectStatus::Negotiating,
                ProjectStatus::Contracted,
                ProjectStatus::Designing,
            ],
        )
        .await;
        let cancelled = walk(&db, project.id, &[ProjectStatus::Cancelled]).await;
        assert_eq!(cancelled.current_phase, ProjectPhase::Design);
        assert_eq!(cancelled.contract_date, None);
    }

    #[tokio::test]
    async fn test_self_transition_does_not_write() {
        let (db, _, project) = setup().await;
        let same = transition_project(&db, project.id, TransitionRequest::to(ProjectStatus::Inquiry))
            .await
            .unwrap();
        assert_eq!(same.updated_at, project.updated_at);
    }

    #[tokio::test]
    async fn test_update_project_edits_descriptive_fields() {
        let (db, _, project) = setup().await;
        let updated = update_project(
            &db,
            project.id,
            UpdateProject {
                name: Some("Station canopy phase 2".to_string()),
                contract_amount: Some(Some(28_000_000)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Station canopy phase 2");
        assert_eq!(updated.contract_amount, Some(28_000_000));
        assert_eq!(updated.project_number, project.project_number);

        let err = update_project(
            &db,
            project.id,
            UpdateProject {
                estimated_amount: Some(Some(-5)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, KernelError::InvariantViolation(_)));
    }

    #[tokio::test]
    async fn test_customer_reference_must_exist() {
        let db = DBService::in_memory();
        let config = KernelConfig::default();
        let missing = Uuid::new_v4();
        let err = create_project(
            &db,
            &config,
            CreateProject {
                customer_id: Some(missing),
                ..new_project("Gate canopy")
            },
            now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            KernelError::NotFound { collection: Collection::Customers, id } if id == missing
        ));
        assert!(list_projects(&db, &ProjectQuery::default()).await.unwrap().is_empty());

        let customer = create_customer(
            &db,
            CreateCustomer {
                company_name: "Chubu Stadium".to_string(),
                contact_name: "Suzuki".to_string(),
                email: "suzuki@example.jp".to_string(),
                phone: String::new(),
                address: "Nagoya".to_string(),
                notes: None,
            },
            now(),
        )
        .await
        .unwrap();
        let project = create_project(
            &db,
            &config,
            CreateProject {
                customer_id: Some(customer.id),
                ..new_project("Gate canopy")
            },
            now(),
        )
        .await
        .unwrap();
        assert_eq!(project.customer_id, Some(customer.id));

        let err = update_project(
            &db,
            project.id,
            UpdateProject {
                customer_id: Some(Some(missing)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, KernelError::NotFound { collection: Collection::Customers, .. }));

        let cleared = update_project(
            &db,
            project.id,
            UpdateProject {
                customer_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(cleared.customer_id, None);
    }

    #[tokio::test]
    async fn test_carried_over_number_must_be_free() {
        let (db, config, project) = setup().await;
        let err = create_project(
            &db,
            &config,
            CreateProject {
                project_number: Some(project.project_number.clone()),
                ..new_project("Arena roof")
            },
            now(),
        )
        .await
        .unwrap_err();
        let KernelError::InvariantViolation(violations) = err else {
            panic!("expected invariant violation");
        };
        assert!(violations.has_rule(Rule::UniqueProjectNumber));

        let carried = create_project(
            &db,
            &config,
            CreateProject {
                project_number: Some("YS-2023-015".to_string()),
                ..new_project("Arena roof")
            },
            now(),
        )
        .await
        .unwrap();
        assert_eq!(carried.project_number, "YS-2023-015");

        let next = create_project(&db, &config, new_project("Depot roof"), now())
            .await
            .unwrap();
        assert_eq!(next.project_number, "YS-2024-002");
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let (db, config, project) = setup().await;
        create_project(&db, &config, new_project("Arena roof"), now())
            .await
            .unwrap();
        walk(&db, project.id, &[ProjectStatus::Estimating]).await;

        let estimating = list_projects(
            &db,
            &ProjectQuery {
                status: Some(ProjectStatus::Estimating),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(estimating.len(), 1);
        assert_eq!(estimating[0].id, project.id);

        let all = list_projects(&db, &ProjectQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    fn material(project_id: Uuid) -> Material {
        Material {
            id: Uuid::nil(),
            project_id,
            name: "Steel cable".to_string(),
            specification: "φ20".to_string(),
            quantity: 120.0,
            unit: "m".to_string(),
            status: MaterialStatus::Pending,
            ordered_date: None,
            expected_date: None,
            received_date: None,
            supplier: None,
            cost: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[tokio::test]
    async fn test_delete_restricted_by_children() {
        let (db, config, project) = setup().await;
        db.insert(&material(project.id)).await.unwrap();

        let err = delete_project(&db, &config, project.id).await.unwrap_err();
        assert!(matches!(err, KernelError::HasChildren { count: 1, .. }));
        assert!(get_project(&db, project.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_cascades_when_configured() {
        let (db, mut config, project) = setup().await;
        config.delete_policy = DeletePolicy::Cascade;
        let child = db.insert(&material(project.id)).await.unwrap();
        let unrelated = db.insert(&material(Uuid::new_v4())).await.unwrap();

        delete_project(&db, &config, project.id).await.unwrap();
        assert!(matches!(
            get_project(&db, project.id).await,
            Err(KernelError::NotFound { .. })
        ));
        assert!(db.find_by_id::<Material>(child.id).await.unwrap().is_none());
        assert!(db.find_by_id::<Material>(unrelated.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_operations_on_missing_project() {
        let db = DBService::in_memory();
        let id = Uuid::new_v4();
        assert!(matches!(
            transition_project(&db, id, TransitionRequest::to(ProjectStatus::Estimating)).await,
            Err(KernelError::NotFound { .. })
        ));
        assert!(matches!(
            delete_project(&db, &KernelConfig::default(), id).await,
            Err(KernelError::NotFound { .. })
        ));
    }
}
