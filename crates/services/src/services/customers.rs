use chrono::{DateTime, Utc};
use db::{
    DBService,
    models::customer::{CreateCustomer, Customer},
    store::{Collection, Filter},
};
use tracing::info;
use uuid::Uuid;

use super::{consistency::validate_customer, error::KernelError};

pub async fn create_customer(
    db: &DBService,
    data: CreateCustomer,
    now: DateTime<Utc>,
) -> Result<Customer, KernelError> {
    let customer = Customer::from_create(data, now);
    validate_customer(&customer)?;
    let stored = db.insert(&customer).await?;
    info!(customer_id = %stored.id, company = %stored.company_name, "Customer created");
    Ok(stored)
}

pub async fn get_customer(db: &DBService, id: Uuid) -> Result<Customer, KernelError> {
    db.find_by_id(id)
        .await?
        .ok_or_else(|| KernelError::not_found(Collection::Customers, id))
}

pub async fn list_customers(db: &DBService) -> Result<Vec<Customer>, KernelError> {
    Ok(db.find_all(&Filter::new()).await?)
}

/// Replace the editable fields of a customer, keeping its identity
pub async fn update_customer(
    db: &DBService,
    id: Uuid,
    data: CreateCustomer,
) -> Result<Customer, KernelError> {
    let current = get_customer(db, id).await?;
    let next = Customer {
        id: current.id,
        created_at: current.created_at,
        updated_at: current.updated_at,
        ..Customer::from_create(data, current.created_at)
    };
    validate_customer(&next)?;
    let stored = db.replace(&next).await?;
    info!(customer_id = %id, "Customer updated");
    Ok(stored)
}
