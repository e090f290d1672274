// churnflow-core/src/application/reporting.rs

//! Markdown fragments and template contexts for the step reports.
//! Severity and labels become text here and nowhere earlier.

use chrono::Local;
use serde_json::{Value as Json, json};
use std::collections::BTreeMap;

use crate::application::ingestion::IngestionBatch;
use crate::application::preparation::PreparationOutcome;
use crate::application::storage::StorageSummary;
use crate::application::validation::ValidationReport;
use crate::domain::preparation::{CleaningDelta, DatasetStatistics};
use crate::domain::quality::{BusinessRuleReport, Issue, IssueKind, Severity};

/// Overall score at which a table is reported as validated.
pub const VALIDATED_SCORE: u32 = 70;

const REPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn with_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Upper-cases the first letter of every alphabetic run: `billing_issue` -> `Billing_Issue`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut boundary = true;
    for ch in s.chars() {
        if boundary && ch.is_alphabetic() {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        boundary = !ch.is_alphabetic();
    }
    out
}

pub fn format_table_details<'a>(tables: impl IntoIterator<Item = (&'a str, usize)>) -> String {
    tables
        .into_iter()
        .map(|(name, records)| format!("- **{}**: {} records", name, with_thousands(records)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_storage_tree(tables: &[String], date: &str) -> String {
    let mut lines = Vec::with_capacity(tables.len() * 3);
    for (i, table) in tables.iter().enumerate() {
        let last = i + 1 == tables.len();
        let (branch, indent) = if last {
            ("└──", "    ")
        } else {
            ("├──", "│   ")
        };
        lines.push(format!("{} {}/", branch, table));
        lines.push(format!("{}└── dt={}/", indent, date));
        lines.push(format!("{}    └── {}.csv", indent, table));
    }
    lines.join("\n")
}

pub fn format_quality_badge(score: u32) -> String {
    let (icon, label) = match score {
        90.. => ("🟢", "Excellent"),
        80..=89 => ("🟢", "Good"),
        70..=79 => ("🟡", "Fair"),
        60..=69 => ("🟠", "Poor"),
        _ => ("🔴", "Critical"),
    };
    format!("> {} **Data quality: {}** ({}/100)", icon, label, score)
}

pub fn format_issues(issues: &[Issue]) -> String {
    if issues.is_empty() {
        return "No data quality issues found ✅".to_string();
    }
    issues
        .iter()
        .enumerate()
        .map(|(i, issue)| format!("{}. **{}**: {}", i + 1, issue.severity, issue.message))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_table_summaries(report: &ValidationReport) -> String {
    if report.tables.is_empty() {
        return format!("No partitions found for {}.", report.validation_date);
    }
    report
        .tables
        .iter()
        .map(|(name, diag)| {
            let type_notes = if diag.types.type_issues.is_empty() {
                "none".to_string()
            } else {
                diag.types.type_issues.join("; ")
            };
            format!(
                "### {}\n- Records: {}\n- Columns: {}\n- Completeness: {:.2}%\n- Type notes: {}",
                title_case(name),
                with_thousands(diag.completeness.total_records),
                diag.completeness.total_columns,
                diag.completeness.completeness_score,
                type_notes
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn format_completeness_overview(report: &ValidationReport) -> String {
    if report.tables.is_empty() {
        return "No tables validated.".to_string();
    }
    let mut lines = vec![
        "| Table | Completeness | Columns with missing values |".to_string(),
        "|---|---|---|".to_string(),
    ];
    for (name, diag) in &report.tables {
        let sparse = diag
            .completeness
            .missing_values
            .iter()
            .filter(|c| c.missing_count > 0)
            .count();
        lines.push(format!(
            "| {} | {:.2}% | {} |",
            name, diag.completeness.completeness_score, sparse
        ));
    }
    lines.join("\n")
}

pub fn format_business_rules(rules: Option<&BusinessRuleReport>) -> String {
    let Some(rules) = rules else {
        return "Business rules were not evaluated.".to_string();
    };
    let mut lines = vec![format!("Rules checked: {}", rules.rules_checked.len())];
    if rules.violations.is_empty() {
        lines.push(String::new());
        lines.push("All business rules passed ✅".to_string());
        return lines.join("\n");
    }
    lines.push(format!(
        "Total violations: {}",
        with_thousands(rules.total_violations())
    ));
    lines.push(String::new());
    for v in &rules.violations {
        lines.push(format!(
            "- ❌ **{}** ({}): {} violation(s)",
            v.rule,
            v.table,
            with_thousands(v.violations)
        ));
    }
    lines.join("\n")
}

pub fn format_recommendations(report: &ValidationReport) -> String {
    let has = |kind: IssueKind| report.issues.iter().any(|i| i.kind == kind);
    let mut items = Vec::new();

    if report.issues.iter().any(|i| i.severity == Severity::High) {
        items.push("Resolve HIGH severity issues before preparing the dataset");
    }
    if has(IssueKind::MissingValues) {
        items.push("Trace missing values back to the source system and agree on imputation rules");
    }
    if has(IssueKind::Outliers) {
        items.push("Review outlier values with the business owners before modeling");
    }
    if has(IssueKind::IdentifierType) {
        items.push("Store identifier columns as integers at the source");
    }
    if has(IssueKind::NumericAsText) {
        items.push("Cast numeric-looking text columns during preparation");
    }
    if report
        .business_rules
        .as_ref()
        .is_some_and(|r| !r.violations.is_empty())
    {
        items.push("Fix business-rule violations at the source system");
    }
    if items.is_empty() {
        items.push("Data is ready for preparation");
    }

    items
        .iter()
        .map(|s| format!("- {}", s))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_cleaning_summary(summary: &BTreeMap<String, CleaningDelta>) -> String {
    let mut lines = vec![
        "| Table | Original | Cleaned | Removed |".to_string(),
        "|---|---|---|---|".to_string(),
    ];
    for (name, delta) in summary {
        lines.push(format!(
            "| {} | {} | {} | {} |",
            name,
            with_thousands(delta.original_records),
            with_thousands(delta.cleaned_records),
            with_thousands(delta.records_removed)
        ));
    }
    lines.join("\n")
}

pub fn format_statistics(stats: &DatasetStatistics) -> String {
    let mut lines = vec![
        format!("- Total customers: {}", with_thousands(stats.total_customers)),
        format!("- Unique customers: {}", with_thousands(stats.unique_customers)),
        format!("- Churned customers: {}", with_thousands(stats.churned_customers)),
        format!("- Churn rate: {:.2}%", stats.churn_rate),
        format!("- Retention rate: {:.2}%", stats.retention_rate),
        format!("- Overall completeness: {:.2}%", stats.overall_completeness),
        format!("- Columns with missing values: {}", stats.columns_with_missing),
    ];
    if let Some(amount) = stats.avg_billing_amount {
        lines.push(format!("- Average billing amount: ${:.2}", amount));
    }
    if let Some(fee) = stats.avg_monthly_fee {
        lines.push(format!("- Average monthly fee: ${:.2}", fee));
    }
    lines.join("\n")
}

pub fn format_quality_notes(notes: &[String]) -> String {
    if notes.is_empty() {
        return "No records were removed during cleaning ✅".to_string();
    }
    notes
        .iter()
        .map(|n| format!("- {}", n))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line of the validation summary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub table: String,
    pub records: String,
    pub columns: usize,
    pub status: &'static str,
}

pub fn validation_summary_rows(report: &ValidationReport) -> Vec<SummaryRow> {
    let status = if report.quality_score >= VALIDATED_SCORE {
        "Validated"
    } else {
        "Issues Found"
    };
    report
        .data_summary
        .iter()
        .map(|(name, shape)| SummaryRow {
            table: title_case(name),
            records: with_thousands(shape.records),
            columns: shape.columns,
            status,
        })
        .collect()
}

fn now() -> String {
    Local::now().format(REPORT_TIME_FORMAT).to_string()
}

pub fn ingestion_context(batch: &IngestionBatch) -> Json {
    let tables_count = batch.tables.len();
    let avg = if tables_count == 0 {
        0
    } else {
        batch.total_records / tables_count
    };
    json!({
        "ingestion_date": batch.ingestion_date.to_string(),
        "total_records": with_thousands(batch.total_records),
        "tables_count": tables_count,
        "avg_records_per_table": with_thousands(avg),
        "table_details": format_table_details(batch.tables.iter().map(|t| (t.name(), t.records()))),
    })
}

pub fn storage_context(summary: &StorageSummary) -> Json {
    json!({
        "storage_date": now(),
        "partition_date": summary.partition_date,
        "tables_stored": summary.tables_stored.len(),
        "total_records": with_thousands(summary.total_records),
        "storage_tree": format_storage_tree(&summary.tables_stored, &summary.partition_date),
        "table_details": format_table_details(
            summary.receipts.iter().map(|r| (r.table.as_str(), r.records_stored))
        ),
    })
}

pub fn validation_context(report: &ValidationReport) -> Json {
    json!({
        "validation_date": report.validation_date,
        "quality_badge": format_quality_badge(report.quality_score),
        "quality_score": report.quality_score,
        "quality_assessment": report.quality_label.to_string(),
        "total_issues": report.total_issues,
        "tables_count": report.tables_found.len(),
        "table_summaries": format_table_summaries(report),
        "completeness_overview": format_completeness_overview(report),
        "issues_list": format_issues(&report.top_issues),
        "business_rules_summary": format_business_rules(report.business_rules.as_ref()),
        "recommendations": format_recommendations(report),
    })
}

pub fn preparation_context(outcome: &PreparationOutcome) -> Json {
    json!({
        "preparation_date": now(),
        "source_partition": outcome.summary.source_partition,
        "output_file": outcome.save.output_file,
        "final_rows": with_thousands(outcome.master_shape.0),
        "final_columns": outcome.master_shape.1,
        "cleaning_summary": format_cleaning_summary(&outcome.summary.cleaning_summary),
        "eda_insights": format_statistics(&outcome.statistics),
        "quality_issues": format_quality_notes(&outcome.summary.data_quality_issues),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::quality::RuleViolation;

    #[test]
    fn test_with_thousands() {
        assert_eq!(with_thousands(0), "0");
        assert_eq!(with_thousands(999), "999");
        assert_eq!(with_thousands(1000), "1,000");
        assert_eq!(with_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("subscriptions"), "Subscriptions");
        assert_eq!(title_case("billing_issue"), "Billing_Issue");
    }

    #[test]
    fn test_storage_tree_layout() {
        let tree = format_storage_tree(&["billing".into(), "crm".into()], "2024-01-01");
        let expected = "├── billing/\n\
                        │   └── dt=2024-01-01/\n\
                        │       └── billing.csv\n\
                        └── crm/\n    \
                        └── dt=2024-01-01/\n        \
                        └── crm.csv";
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_issue_list_renders_severity_as_text() {
        let issues = vec![Issue::new(
            IssueKind::MissingValues,
            Severity::High,
            "crm",
            Some("plan"),
            "crm.plan has 60.0% missing values",
        )];
        assert_eq!(format_issues(&issues), "1. **HIGH**: crm.plan has 60.0% missing values");
        assert!(format_issues(&[]).starts_with("No data quality issues"));
    }

    #[test]
    fn test_business_rule_summary() {
        assert_eq!(format_business_rules(None), "Business rules were not evaluated.");
        let rules = BusinessRuleReport {
            rules_checked: vec!["amount_positive".into()],
            violations: vec![RuleViolation {
                rule: "Billing amounts must be positive".into(),
                violations: 2,
                table: "billing".into(),
            }],
        };
        let text = format_business_rules(Some(&rules));
        assert!(text.contains("Total violations: 2"));
        assert!(text.contains("**Billing amounts must be positive** (billing)"));
    }

    #[test]
    fn test_quality_badge_bands() {
        assert!(format_quality_badge(95).contains("Excellent"));
        assert!(format_quality_badge(72).contains("Fair"));
        assert!(format_quality_badge(10).contains("🔴"));
    }
}
