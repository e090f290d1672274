// churnflow-core/src/application/validation.rs

use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

use crate::domain::project::ValidationConfig;
use crate::domain::quality::{self, BusinessRuleReport, Issue, QualityLabel, TableDiagnostics};
use crate::error::ChurnflowError;
use crate::infrastructure::lake::DataLake;

const TOP_ISSUES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableShape {
    pub records: usize,
    pub columns: usize,
}

/// Everything one validation pass found.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub validated_at: String,
    pub validation_date: String,
    pub quality_score: u32,
    pub quality_label: QualityLabel,
    pub total_issues: usize,
    pub issues: Vec<Issue>,
    pub top_issues: Vec<Issue>,
    pub tables: BTreeMap<String, TableDiagnostics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_rules: Option<BusinessRuleReport>,
    pub data_summary: BTreeMap<String, TableShape>,
    pub tables_expected: Vec<String>,
    pub tables_found: Vec<String>,
}

impl ValidationReport {
    pub fn is_below(&self, threshold: u32) -> bool {
        self.quality_score < threshold
    }
}

/// Validates every raw table that has a partition for `date`.
///
/// Tables without that partition are skipped with a warning. An unreadable partition file
/// fails the whole pass.
#[instrument(skip(lake, config), fields(root = %lake.root().display()))]
pub fn run_validation(
    lake: &DataLake,
    date: NaiveDate,
    config: &ValidationConfig,
) -> Result<ValidationReport, ChurnflowError> {
    let partition = date.to_string();
    let tables_expected = lake.list_tables()?;
    info!(expected = tables_expected.len(), date = %partition, "Starting data validation");

    let mut loaded = BTreeMap::new();
    for name in &tables_expected {
        match lake.read_raw(name, &partition)? {
            Some(table) => {
                info!(table = %name, records = table.row_count(), "Loaded partition");
                loaded.insert(name.clone(), table);
            }
            None => warn!(table = %name, date = %partition, "No partition for this date, skipping"),
        }
    }

    let now = Local::now();
    let assessment = quality::assess(&loaded, &config.business_rules, now.naive_local());

    let data_summary = loaded
        .iter()
        .map(|(name, t)| {
            let shape = TableShape {
                records: t.row_count(),
                columns: t.column_count(),
            };
            (name.clone(), shape)
        })
        .collect();

    let report = ValidationReport {
        validated_at: now.to_rfc3339(),
        validation_date: partition,
        quality_score: assessment.quality_score,
        quality_label: assessment.quality_label,
        total_issues: assessment.issues.len(),
        top_issues: assessment.issues.iter().take(TOP_ISSUES).cloned().collect(),
        issues: assessment.issues,
        tables: assessment.tables,
        business_rules: assessment.business_rules,
        data_summary,
        tables_found: loaded.into_keys().collect(),
        tables_expected,
    };

    info!(
        score = report.quality_score,
        label = report.quality_label.as_str(),
        issues = report.total_issues,
        "Validation completed"
    );
    if report.is_below(config.quality_threshold) {
        warn!(
            score = report.quality_score,
            threshold = config.quality_threshold,
            "Data quality score is below threshold"
        );
    }
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::table::{Column, Table};
    use anyhow::Result;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn seed(lake: &DataLake, name: &str, day: &str, plan: &[Option<&str>]) -> Result<()> {
        let ids: Vec<Option<String>> = (1..=plan.len()).map(|i| Some(i.to_string())).collect();
        let table = Table::new(
            name,
            vec![
                Column::from_raw("customer_id", &ids),
                Column::from_raw("plan", plan),
            ],
        )?;
        lake.write_raw(&table, day)?;
        Ok(())
    }

    #[test]
    fn test_missing_partitions_are_skipped() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let lake = DataLake::new(dir.path());
        seed(&lake, "billing", "2024-01-02", &[Some("a")])?;
        seed(&lake, "crm", "2024-01-02", &[Some("b")])?;

        let report = run_validation(&lake, date(1), &ValidationConfig::default())?;
        assert!(report.tables_found.is_empty());
        assert_eq!(report.tables_expected, vec!["billing", "crm"]);
        assert_eq!(report.quality_score, 100);
        Ok(())
    }

    #[test]
    fn test_sparse_column_costs_a_high_issue() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let lake = DataLake::new(dir.path());
        seed(
            &lake,
            "subscriptions",
            "2024-01-01",
            &[Some("basic"), None, None, None, Some("pro")],
        )?;

        let report = run_validation(&lake, date(1), &ValidationConfig::default())?;
        assert_eq!(report.tables_found, vec!["subscriptions"]);
        assert_eq!(report.total_issues, 1);
        assert_eq!(report.quality_score, 85);
        assert_eq!(report.data_summary["subscriptions"].records, 5);
        assert!(report.is_below(90));
        Ok(())
    }
}
