use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::{Entity, ProjectChild};
use crate::store::Collection;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EstimateStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Rejected,
}

/// One priced line; order in `Estimate::items` is presentation order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct EstimateItem {
    pub id: Uuid,
    pub description: String,
    #[ts(type = "number")]
    pub quantity: i64,
    pub unit: String,
    #[ts(type = "number")]
    pub unit_price: i64,
    #[ts(type = "number")]
    pub amount: i64,
}

/// Versioned quotation for a project. Amounts are in yen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub id: Uuid,
    pub project_id: Uuid,
    pub estimate_number: String,
    pub version: i32,

    pub items: Vec<EstimateItem>,
    #[ts(type = "number")]
    pub subtotal: i64,
    #[ts(type = "number")]
    pub tax: i64,
    #[ts(type = "number")]
    pub total: i64,

    pub valid_until: DateTime<Utc>,
    pub notes: Option<String>,
    pub status: EstimateStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Estimate {
    const COLLECTION: Collection = Collection::Estimates;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl ProjectChild for Estimate {
    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateEstimateItem {
    pub description: String,
    #[ts(type = "number")]
    pub quantity: i64,
    pub unit: String,
    #[ts(type = "number")]
    pub unit_price: i64,
}

impl CreateEstimateItem {
    /// Price the line; `None` when `quantity × unitPrice` does not fit in an `i64`
    pub fn into_item(self) -> Option<EstimateItem> {
        let amount = self.quantity.checked_mul(self.unit_price)?;
        Some(EstimateItem {
            id: Uuid::new_v4(),
            amount,
            description: self.description,
            quantity: self.quantity,
            unit: self.unit,
            unit_price: self.unit_price,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateEstimate {
    pub estimate_number: Option<String>,
    pub items: Vec<CreateEstimateItem>,
    pub valid_until: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}
