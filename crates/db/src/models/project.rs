use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use super::Entity;
use crate::store::Collection;

/// Lifecycle stage of a project
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    TS,
    EnumString,
    StrumDisplay,
    EnumIter,
    Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Inquiry,
    Estimating,
    Negotiating,
    Contracted,
    Designing,
    Manufacturing,
    Installing,
    Completed,
    Cancelled,
}

/// Department a project is currently routed through
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    TS,
    EnumString,
    StrumDisplay,
    EnumIter,
    Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectPhase {
    #[default]
    Sales,
    Design,
    Manufacturing,
    Construction,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectNumberError {
    #[error("project number must look like PREFIX-YYYY-NNN, got {0:?}")]
    Malformed(String),
    #[error("sequence {0} does not fit in three digits")]
    SequenceOutOfRange(u32),
}

/// Human-facing project identifier, e.g. `YS-2024-001`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectNumber {
    prefix: String,
    year: i32,
    sequence: u32,
}

impl ProjectNumber {
    pub const MAX_SEQUENCE: u32 = 999;

    pub fn new(prefix: &str, year: i32, sequence: u32) -> Result<Self, ProjectNumberError> {
        if !(1..=Self::MAX_SEQUENCE).contains(&sequence) {
            return Err(ProjectNumberError::SequenceOutOfRange(sequence));
        }
        if !valid_prefix(prefix) || !(1000..=9999).contains(&year) {
            return Err(ProjectNumberError::Malformed(format!(
                "{prefix}-{year}-{sequence:03}"
            )));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            year,
            sequence,
        })
    }

    pub fn parse(input: &str) -> Result<Self, ProjectNumberError> {
        let malformed = || ProjectNumberError::Malformed(input.to_string());
        let mut parts = input.split('-');
        let (Some(prefix), Some(year), Some(sequence), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        if year.len() != 4 || sequence.len() != 3 {
            return Err(malformed());
        }
        if !year.bytes().all(|b| b.is_ascii_digit()) || !sequence.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(malformed());
        }
        let year = year.parse().map_err(|_| malformed())?;
        let sequence = sequence.parse().map_err(|_| malformed())?;
        Self::new(prefix, year, sequence).map_err(|_| malformed())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

fn valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_uppercase())
}

impl Display for ProjectNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{:03}", self.prefix, self.year, self.sequence)
    }
}

/// A customer engagement tracked from first inquiry to hand-over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub project_number: String,
    pub name: String,
    pub customer_id: Option<Uuid>,
    pub status: ProjectStatus,
    pub current_phase: ProjectPhase,

    pub description: Option<String>,
    pub location: String,
    pub structure_type: String,
    pub estimated_area: Option<f64>, // m²

    #[ts(type = "number | null")]
    pub estimated_amount: Option<i64>,
    #[ts(type = "number | null")]
    pub contract_amount: Option<i64>,

    pub inquiry_date: DateTime<Utc>,
    pub contract_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub completion_date: Option<DateTime<Utc>>,

    pub sales_person_id: Option<String>,
    pub designer_id: Option<String>,
    pub production_manager_id: Option<String>,
    pub site_manager_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Project {
    const COLLECTION: Collection = Collection::Projects;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    /// Number carried over from an earlier system; generated when absent
    pub project_number: Option<String>,
    pub name: String,
    pub customer_id: Option<Uuid>,
    pub description: Option<String>,
    pub location: String,
    pub structure_type: String,
    pub estimated_area: Option<f64>,
    #[ts(type = "number | null")]
    pub estimated_amount: Option<i64>,
    pub inquiry_date: Option<DateTime<Utc>>,
    pub sales_person_id: Option<String>,
}

/// Present-but-null becomes `Some(None)`, so an edit can clear a field
fn clearable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Editable descriptive fields. An absent field leaves the stored value untouched;
/// `null` clears an optional one. Status and phase only change through transitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProject {
    pub name: Option<String>,
    pub location: Option<String>,
    pub structure_type: Option<String>,

    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub customer_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub estimated_area: Option<Option<f64>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "number | null")]
    pub estimated_amount: Option<Option<i64>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "number | null")]
    pub contract_amount: Option<Option<i64>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub delivery_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub sales_person_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub designer_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub production_manager_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub site_manager_id: Option<Option<String>>,
}

impl Project {
    /// Apply an edit, producing the next version of the record
    pub fn with_update(&self, data: UpdateProject) -> Project {
        let mut next = self.clone();
        if let Some(name) = data.name {
            next.name = name;
        }
        if let Some(location) = data.location {
            next.location = location;
        }
        if let Some(structure_type) = data.structure_type {
            next.structure_type = structure_type;
        }
        next.customer_id = data.customer_id.unwrap_or(next.customer_id);
        next.description = data.description.unwrap_or(next.description);
        next.estimated_area = data.estimated_area.unwrap_or(next.estimated_area);
        next.estimated_amount = data.estimated_amount.unwrap_or(next.estimated_amount);
        next.contract_amount = data.contract_amount.unwrap_or(next.contract_amount);
        next.delivery_date = data.delivery_date.unwrap_or(next.delivery_date);
        next.sales_person_id = data.sales_person_id.unwrap_or(next.sales_person_id);
        next.designer_id = data.designer_id.unwrap_or(next.designer_id);
        next.production_manager_id = data
            .production_manager_id
            .unwrap_or(next.production_manager_id);
        next.site_manager_id = data.site_manager_id.unwrap_or(next.site_manager_id);
        next
    }
}
