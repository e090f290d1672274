// churnflow-core/src/domain/preparation/cleaning.rs

use crate::domain::table::{ColumnType, Table, Value, value::parse_datetime};
use serde::Serialize;

const SUBSCRIPTION_DATE_COLUMNS: [&str; 4] =
    ["subscription_start", "subscription_end", "start_date", "end_date"];
const CRM_TEXT_COLUMNS: [&str; 4] = ["request_type", "status", "disconnect_reason", "request_reason"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleaningDelta {
    pub original_records: usize,
    pub cleaned_records: usize,
    pub records_removed: usize,
}

impl CleaningDelta {
    fn between(before: &Table, after: &Table) -> Self {
        Self {
            original_records: before.row_count(),
            cleaned_records: after.row_count(),
            records_removed: before.row_count() - after.row_count(),
        }
    }
}

/// A cleaned table with its row delta and the data-quality notes raised on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned {
    pub table: Table,
    pub delta: CleaningDelta,
    pub notes: Vec<String>,
}

/// Parses `billing_date`, drops non-positive or missing amounts, then rows without a customer.
pub fn clean_billing(billing: &Table) -> Cleaned {
    let mut notes = Vec::new();
    let mut cleaned = parse_dates(billing.clone(), "billing_date");

    if let Some(amount) = cleaned.column("amount") {
        let keep: Vec<bool> = amount.values().iter().map(positive_amount).collect();
        let before = cleaned.row_count();
        cleaned = cleaned.filter_rows(&keep);
        let removed = before - cleaned.row_count();
        if removed > 0 {
            notes.push(format!(
                "Removed {} billing records with invalid amounts",
                removed
            ));
        }
    }

    let cleaned = drop_missing_customers(cleaned, "billing", &mut notes);
    Cleaned {
        delta: CleaningDelta::between(billing, &cleaned),
        table: cleaned,
        notes,
    }
}

/// Parses subscription dates, normalizes `status` and drops rows without a customer.
pub fn clean_subscriptions(subscriptions: &Table) -> Cleaned {
    let mut notes = Vec::new();
    let mut cleaned = subscriptions.clone();
    for col in SUBSCRIPTION_DATE_COLUMNS {
        cleaned = parse_dates(cleaned, col);
    }
    cleaned = normalize_text(cleaned, "status", canonical_status);

    let cleaned = drop_missing_customers(cleaned, "subscription", &mut notes);
    Cleaned {
        delta: CleaningDelta::between(subscriptions, &cleaned),
        table: cleaned,
        notes,
    }
}

/// Parses `created_at`, lower-cases ticket text fields and drops rows without a customer.
pub fn clean_crm(crm: &Table) -> Cleaned {
    let mut notes = Vec::new();
    let mut cleaned = parse_dates(crm.clone(), "created_at");
    for col in CRM_TEXT_COLUMNS {
        cleaned = normalize_text(cleaned, col, |s| s);
    }

    let cleaned = drop_missing_customers(cleaned, "CRM", &mut notes);
    Cleaned {
        delta: CleaningDelta::between(crm, &cleaned),
        table: cleaned,
        notes,
    }
}

fn positive_amount(v: &Value) -> bool {
    let amount = match v {
        Value::Text(s) => s.trim().parse::<f64>().ok(),
        other => other.as_f64(),
    };
    amount.is_some_and(|a| a > 0.0)
}

fn canonical_status(status: String) -> String {
    match status.as_str() {
        "act" | "activated" => "active".to_string(),
        _ => status,
    }
}

/// Unparseable cells become missing. Already parsed cells are kept.
fn parse_dates(table: Table, column: &str) -> Table {
    table.map_column(column, ColumnType::DateTime, |v| match v {
        Value::DateTime(dt) => Value::DateTime(*dt),
        Value::Text(s) => parse_datetime(s).map_or(Value::Null, Value::DateTime),
        _ => Value::Null,
    })
}

/// Trims and lower-cases text cells, then applies `canonical`. Non-text cells become missing.
fn normalize_text<F>(table: Table, column: &str, canonical: F) -> Table
where
    F: Fn(String) -> String,
{
    table.map_column(column, ColumnType::Text, |v| match v.as_text() {
        Some(s) => Value::Text(canonical(s.trim().to_lowercase())),
        None => Value::Null,
    })
}

fn drop_missing_customers(table: Table, label: &str, notes: &mut Vec<String>) -> Table {
    let Some(customer) = table.column("customer_id") else {
        return table;
    };
    let keep: Vec<bool> = customer.values().iter().map(|v| !v.is_null()).collect();
    let cleaned = table.filter_rows(&keep);

    let removed = table.row_count() - cleaned.row_count();
    if removed > 0 {
        notes.push(format!(
            "Removed {} {} records with missing customer_id",
            removed, label
        ));
    }
    cleaned
}
