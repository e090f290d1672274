// churnflow-core/src/domain/quality/completeness.rs

use super::issue::{Issue, IssueKind, Severity};
use crate::domain::stats::round2;
use crate::domain::table::Table;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnCompleteness {
    pub column: String,
    pub missing_count: usize,
    pub missing_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletenessReport {
    pub total_records: usize,
    pub total_columns: usize,
    pub missing_values: Vec<ColumnCompleteness>,
    pub completeness_score: f64,
}

const HIGH_MISSING_PCT: f64 = 50.0;
const MEDIUM_MISSING_PCT: f64 = 20.0;

/// Per-column missing counts plus the table's completeness score.
pub fn check_completeness(table: &Table) -> (CompletenessReport, Vec<Issue>) {
    let rows = table.row_count();
    let mut issues = Vec::new();

    let missing_values = table
        .columns()
        .iter()
        .map(|col| {
            let missing = col.null_count();
            let pct = if rows == 0 {
                0.0
            } else {
                missing as f64 / rows as f64 * 100.0
            };

            let severity = if pct > HIGH_MISSING_PCT {
                Some(Severity::High)
            } else if pct > MEDIUM_MISSING_PCT {
                Some(Severity::Medium)
            } else {
                None
            };
            if let Some(severity) = severity {
                issues.push(Issue::new(
                    IssueKind::MissingValues,
                    severity,
                    table.name(),
                    Some(col.name()),
                    format!("{}.{} has {:.1}% missing values", table.name(), col.name(), pct),
                ));
            }

            ColumnCompleteness {
                column: col.name().to_string(),
                missing_count: missing,
                missing_percentage: round2(pct),
            }
        })
        .collect();

    let total_cells = table.total_cells();
    let completeness_score = if total_cells == 0 {
        100.0
    } else {
        round2((total_cells - table.null_count()) as f64 / total_cells as f64 * 100.0)
    };

    let report = CompletenessReport {
        total_records: rows,
        total_columns: table.column_count(),
        missing_values,
        completeness_score,
    };
    (report, issues)
}
