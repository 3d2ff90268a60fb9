use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::Entity;
use crate::store::Collection;

/// Client company; projects refer to it but do not own it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Customer {
    const COLLECTION: Collection = Collection::Customers;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomer {
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub notes: Option<String>,
}

impl Customer {
    pub fn from_create(data: CreateCustomer, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::nil(),
            company_name: data.company_name,
            contact_name: data.contact_name,
            email: data.email,
            phone: data.phone,
            address: data.address,
            notes: data.notes,
            created_at: now,
            updated_at: now,
        }
    }
}
