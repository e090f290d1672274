// churnflow-core/src/domain/quality/mod.rs

//! Pure data-quality checks. Each check reads a table and returns a typed report plus the issues it raised.

pub mod business_rules;
pub mod completeness;
pub mod issue;
pub mod ranges;
pub mod types;

pub use business_rules::{BusinessRuleReport, RuleViolation, check_business_rules};
pub use completeness::{CompletenessReport, check_completeness};
pub use issue::{Issue, IssueKind, QualityLabel, Severity, quality_score};
pub use ranges::{RangeReport, check_ranges};
pub use types::{TypeReport, check_types};

use crate::domain::project::{BusinessRuleConfig, BusinessRuleMode};
use crate::domain::table::Table;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDiagnostics {
    pub completeness: CompletenessReport,
    pub types: TypeReport,
    pub ranges: RangeReport,
}

/// Outcome of one validation pass over a set of tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityAssessment {
    pub tables: BTreeMap<String, TableDiagnostics>,
    pub business_rules: Option<BusinessRuleReport>,
    pub issues: Vec<Issue>,
    pub quality_score: u32,
    pub quality_label: QualityLabel,
}

/// Runs completeness, type and range checks per table (name order), then business rules per `rules.mode`.
pub fn assess(
    tables: &BTreeMap<String, Table>,
    rules: &BusinessRuleConfig,
    now: NaiveDateTime,
) -> QualityAssessment {
    let mut issues = Vec::new();
    let mut diagnostics = BTreeMap::new();

    for (name, table) in tables {
        let (completeness, found) = check_completeness(table);
        issues.extend(found);
        let (types, found) = check_types(table);
        issues.extend(found);
        let (ranges, found) = check_ranges(table);
        issues.extend(found);

        diagnostics.insert(
            name.clone(),
            TableDiagnostics {
                completeness,
                types,
                ranges,
            },
        );
    }

    let business_rules = match rules.mode {
        BusinessRuleMode::Disabled => None,
        BusinessRuleMode::Report => Some(check_business_rules(tables, now)),
        BusinessRuleMode::Score => {
            let report = check_business_rules(tables, now);
            issues.extend(report.to_issues(rules.severity));
            Some(report)
        }
    };

    let quality_score = quality_score(&issues);
    QualityAssessment {
        tables: diagnostics,
        business_rules,
        issues,
        quality_score,
        quality_label: QualityLabel::from_score(quality_score),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::table::Column;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn billing() -> BTreeMap<String, Table> {
        let table = Table::new(
            "billing",
            vec![
                Column::from_raw(
                    "customer_id",
                    &[Some("1"), Some("2"), Some("3"), Some("4"), Some("5")],
                ),
                Column::from_raw(
                    "amount",
                    &[Some("10"), Some("-5"), Some("20"), Some("5"), Some("15")],
                ),
                Column::from_raw("plan", &[Some("a"), None, None, None, Some("b")]),
            ],
        )
        .unwrap();
        BTreeMap::from([("billing".to_string(), table)])
    }

    fn config(mode: BusinessRuleMode) -> BusinessRuleConfig {
        BusinessRuleConfig {
            mode,
            severity: Severity::Medium,
        }
    }

    #[test]
    fn test_high_missing_column_costs_fifteen() {
        let result = assess(&billing(), &config(BusinessRuleMode::Disabled), now());
        assert!(result.business_rules.is_none());
        assert_eq!(result.issues.len(), 1);
        assert!(result.quality_score <= 85);
        assert_eq!(result.quality_label, QualityLabel::Good);
    }

    #[test]
    fn test_report_mode_does_not_score() {
        let result = assess(&billing(), &config(BusinessRuleMode::Report), now());
        let rules = result.business_rules.as_ref().unwrap();
        assert_eq!(rules.violations.len(), 1);
        assert_eq!(result.quality_score, 85);
    }

    #[test]
    fn test_score_mode_adds_rule_issues() {
        let result = assess(&billing(), &config(BusinessRuleMode::Score), now());
        assert_eq!(result.issues.last().unwrap().kind, IssueKind::BusinessRule);
        assert_eq!(result.quality_score, 75);
    }

    #[test]
    fn test_no_tables_scores_full() {
        let result = assess(&BTreeMap::new(), &config(BusinessRuleMode::Report), now());
        assert_eq!(result.quality_score, 100);
        assert!(result.tables.is_empty());
    }
}
