// churnflow-core/src/domain/preparation/churn.rs

use crate::domain::error::DomainError;
use crate::domain::table::{CustomerKey, Table, Value};
use std::collections::BTreeSet;

/// Customers with a closed disconnect ticket. Expects a cleaned CRM table.
pub fn churned_customers(crm: &Table) -> Result<BTreeSet<CustomerKey>, DomainError> {
    let customers = crm.require_column("customer_id")?;
    let request_type = crm.require_column("request_type")?;
    let status = crm.require_column("status")?;

    let mut churned = BTreeSet::new();
    for ((customer, request), state) in customers
        .values()
        .iter()
        .zip(request_type.values())
        .zip(status.values())
    {
        if request.as_text() != Some("disconnect") || state.as_text() != Some("closed") {
            continue;
        }
        if let Some(key) = customer_key(crm.name(), customer)? {
            churned.insert(key);
        }
    }
    Ok(churned)
}

pub(crate) fn customer_key(table: &str, value: &Value) -> Result<Option<CustomerKey>, DomainError> {
    CustomerKey::from_value(value).map_err(|value| DomainError::UnparseableKey {
        table: table.to_string(),
        value,
    })
}
