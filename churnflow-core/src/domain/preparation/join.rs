// churnflow-core/src/domain/preparation/join.rs

use super::churn::customer_key;
use crate::domain::error::DomainError;
use crate::domain::table::{Column, ColumnType, CustomerKey, Table, Value, value::parse_datetime};
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

pub const KEY_COLUMN: &str = "customer_id";
pub const CHURN_COLUMN: &str = "is_churned";
pub const MASTER_TABLE: &str = "churn_dataset";

const LEFT_SUFFIX: &str = "_billing";
const RIGHT_SUFFIX: &str = "_subscription";

/// Builds the churn-labeled master table.
///
/// Billing is the left side: every billing row survives, fanned out by matching subscriptions.
/// The CRM side is aggregated to one row per customer before it is attached.
pub fn build_master(
    billing: &Table,
    subscriptions: &Table,
    crm: &Table,
    churned: &BTreeSet<CustomerKey>,
) -> Result<Table, DomainError> {
    let mut master = billing.clone();

    if !subscriptions.is_empty() {
        master = left_join(&master, subscriptions)?;
        debug!(rows = master.row_count(), "Joined subscriptions");
    }

    let keys = table_keys(&master)?;
    let summaries = summarize_crm(crm)?;

    let mut total_tickets = Vec::with_capacity(keys.len());
    let mut request_types = Vec::with_capacity(keys.len());
    let mut last_ticket = Vec::with_capacity(keys.len());
    let mut is_churned = Vec::with_capacity(keys.len());

    for key in &keys {
        let summary = key.as_ref().and_then(|k| summaries.get(k));
        total_tickets.push(Value::Int(summary.map_or(0, |s| s.tickets as i64)));
        request_types.push(Value::Text(match summary {
            Some(s) if !s.request_types.is_empty() => s.request_types.join(", "),
            Some(_) => String::new(),
            None => "none".to_string(),
        }));
        last_ticket.push(
            summary
                .and_then(|s| s.last_ticket)
                .map_or(Value::Null, Value::DateTime),
        );
        let churn = key.as_ref().is_some_and(|k| churned.contains(k));
        is_churned.push(Value::Int(i64::from(churn)));
    }

    let normalized_keys: Vec<Value> = keys
        .iter()
        .map(|k| k.as_ref().map_or(Value::Null, CustomerKey::to_value))
        .collect();

    let mut columns: Vec<Column> = master
        .into_columns()
        .into_iter()
        .filter(|c| c.name() != KEY_COLUMN)
        .collect();
    columns.insert(0, Column::from_values(KEY_COLUMN, normalized_keys));
    columns.push(Column::with_type("total_tickets", ColumnType::Int64, total_tickets));
    columns.push(Column::with_type("request_types", ColumnType::Text, request_types));
    columns.push(Column::with_type(
        "last_ticket_date",
        ColumnType::DateTime,
        last_ticket,
    ));
    columns.push(Column::with_type(CHURN_COLUMN, ColumnType::Int64, is_churned));

    Table::new(MASTER_TABLE, columns)
}

/// Left join on the customer key. Left row order is kept, matches follow right row order.
/// Overlapping non-key columns are suffixed on both sides.
pub fn left_join(left: &Table, right: &Table) -> Result<Table, DomainError> {
    let left_keys = table_keys(left)?;
    let right_keys = table_keys(right)?;

    let mut index: HashMap<&CustomerKey, Vec<usize>> = HashMap::new();
    for (row, key) in right_keys.iter().enumerate() {
        if let Some(key) = key {
            index.entry(key).or_default().push(row);
        }
    }

    let mut left_rows = Vec::with_capacity(left_keys.len());
    let mut right_rows = Vec::with_capacity(left_keys.len());
    for (row, key) in left_keys.iter().enumerate() {
        match key.as_ref().and_then(|k| index.get(k)) {
            Some(matches) => {
                for &m in matches {
                    left_rows.push(row);
                    right_rows.push(Some(m));
                }
            }
            None => {
                left_rows.push(row);
                right_rows.push(None);
            }
        }
    }

    let overlap = |name: &str| {
        name != KEY_COLUMN && left.has_column(name) && right.has_column(name)
    };

    let mut columns = Vec::with_capacity(left.column_count() + right.column_count());
    for col in left.columns() {
        let taken = col.take(&left_rows);
        columns.push(if overlap(col.name()) {
            let name = format!("{}{}", col.name(), LEFT_SUFFIX);
            taken.renamed(name)
        } else {
            taken
        });
    }
    for col in right.columns().iter().filter(|c| c.name() != KEY_COLUMN) {
        let taken = col.take_optional(&right_rows);
        columns.push(if overlap(col.name()) {
            let name = format!("{}{}", col.name(), RIGHT_SUFFIX);
            taken.renamed(name)
        } else {
            taken
        });
    }

    Table::new(left.name(), columns)
}

#[derive(Debug, Default)]
struct CrmSummary {
    tickets: usize,
    request_types: Vec<String>,
    last_ticket: Option<NaiveDateTime>,
}

fn summarize_crm(crm: &Table) -> Result<HashMap<CustomerKey, CrmSummary>, DomainError> {
    let mut summaries: HashMap<CustomerKey, CrmSummary> = HashMap::new();
    if crm.is_empty() {
        return Ok(summaries);
    }

    let keys = table_keys(crm)?;
    let tickets = crm.require_column("ticket_id")?;
    let request_types = crm.require_column("request_type")?;
    let created_at = crm.require_column("created_at")?;

    for (row, key) in keys.into_iter().enumerate() {
        let Some(key) = key else { continue };
        let summary = summaries.entry(key).or_default();

        if tickets.get(row).is_some_and(|v| !v.is_null()) {
            summary.tickets += 1;
        }
        if let Some(kind) = request_types.get(row).and_then(Value::to_text) {
            if !summary.request_types.contains(&kind) {
                summary.request_types.push(kind);
            }
        }
        let created = match created_at.get(row) {
            Some(Value::DateTime(dt)) => Some(*dt),
            Some(Value::Text(s)) => parse_datetime(s),
            _ => None,
        };
        if let Some(created) = created {
            summary.last_ticket = Some(summary.last_ticket.map_or(created, |t| t.max(created)));
        }
    }
    Ok(summaries)
}

fn table_keys(table: &Table) -> Result<Vec<Option<CustomerKey>>, DomainError> {
    table
        .require_column(KEY_COLUMN)?
        .values()
        .iter()
        .map(|v| customer_key(table.name(), v))
        .collect()
}
