// churnflow-core/src/domain/quality/types.rs

use super::issue::{Issue, IssueKind, Severity};
use crate::domain::table::{ColumnType, Table, Value, value::parse_float};
use serde::Serialize;

/// Column names expected to hold integer identifiers (case-insensitive).
pub const IDENTIFIER_COLUMNS: [&str; 3] = ["id", "customer_id", "user_id"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnTypeEntry {
    pub column: String,
    pub dtype: ColumnType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeReport {
    pub data_types: Vec<ColumnTypeEntry>,
    pub type_issues: Vec<String>,
}

pub fn check_types(table: &Table) -> (TypeReport, Vec<Issue>) {
    let mut data_types = Vec::with_capacity(table.column_count());
    let mut type_issues = Vec::new();
    let mut issues = Vec::new();

    for col in table.columns() {
        data_types.push(ColumnTypeEntry {
            column: col.name().to_string(),
            dtype: col.dtype(),
        });

        if col.dtype() == ColumnType::Text && looks_numeric(col.values()) {
            let note = format!("Column '{}' is object but appears numeric", col.name());
            issues.push(Issue::new(
                IssueKind::NumericAsText,
                Severity::Info,
                table.name(),
                Some(col.name()),
                note.clone(),
            ));
            type_issues.push(note);
        }

        let lowered = col.name().to_lowercase();
        if IDENTIFIER_COLUMNS.contains(&lowered.as_str()) && col.dtype() != ColumnType::Int64 {
            issues.push(Issue::new(
                IssueKind::IdentifierType,
                Severity::Warning,
                table.name(),
                Some(col.name()),
                format!(
                    "{}.{} (ID field) is not integer type",
                    table.name(),
                    col.name()
                ),
            ));
        }
    }

    (
        TypeReport {
            data_types,
            type_issues,
        },
        issues,
    )
}

fn looks_numeric(values: &[Value]) -> bool {
    values.iter().all(|v| match v {
        Value::Text(s) => parse_float(s).is_some(),
        other => other.is_null() || other.as_f64().is_some(),
    })
}
