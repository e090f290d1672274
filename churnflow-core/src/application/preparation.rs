// churnflow-core/src/application/preparation.rs

use chrono::Local;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

use crate::domain::error::DomainError;
use crate::domain::preparation::{
    CleaningDelta, DatasetStatistics, build_master, churned_customers, clean_billing, clean_crm,
    clean_subscriptions, compute_statistics,
};
use crate::domain::table::Table;
use crate::error::ChurnflowError;
use crate::infrastructure::lake::{DataLake, SaveReceipt};

pub const REQUIRED_TABLES: [&str; 3] = ["billing", "subscriptions", "crm"];

const LOW_CHURN_RATE: f64 = 5.0;
const HIGH_CHURN_RATE: f64 = 50.0;

#[derive(Debug, Clone, Serialize)]
pub struct PreparationSummary {
    pub prepared_at: String,
    pub source_partition: String,
    pub cleaning_summary: BTreeMap<String, CleaningDelta>,
    pub data_quality_issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreparationOutcome {
    /// (rows, columns) of the master table.
    pub master_shape: (usize, usize),
    pub save: SaveReceipt,
    pub statistics: DatasetStatistics,
    pub summary: PreparationSummary,
}

/// Cleans, labels and joins the latest raw partition into the master churn dataset.
///
/// Every required table must have that exact partition. The dataset is written only after
/// every step succeeded.
#[instrument(skip(lake), fields(root = %lake.root().display()))]
pub fn run_preparation(lake: &DataLake) -> Result<PreparationOutcome, ChurnflowError> {
    let date = lake.latest_partition()?.ok_or(DomainError::NoPartitions)?;
    info!(partition = %date, "Starting data preparation");

    let [billing, subscriptions, crm] = load_required(lake, &date)?;

    let billing = clean_billing(&billing);
    let subscriptions = clean_subscriptions(&subscriptions);
    let crm = clean_crm(&crm);

    let churned = churned_customers(&crm.table)?;
    info!(churned = churned.len(), "Churn labels derived");

    let master = build_master(&billing.table, &subscriptions.table, &crm.table, &churned)?;
    let statistics = compute_statistics(&master);
    check_readiness(&statistics);

    let mut cleaning_summary = BTreeMap::new();
    let mut data_quality_issues = Vec::new();
    for (name, cleaned) in [
        ("billing", &billing),
        ("subscriptions", &subscriptions),
        ("crm", &crm),
    ] {
        cleaning_summary.insert(name.to_string(), cleaned.delta);
        data_quality_issues.extend(cleaned.notes.iter().cloned());
    }

    let save = lake.write_clean(&master, &date)?;
    info!(rows = master.row_count(), columns = master.column_count(), "Data preparation completed");

    Ok(PreparationOutcome {
        master_shape: master.shape(),
        save,
        statistics,
        summary: PreparationSummary {
            prepared_at: Local::now().to_rfc3339(),
            source_partition: date,
            cleaning_summary,
            data_quality_issues,
        },
    })
}

fn load_required(lake: &DataLake, date: &str) -> Result<[Table; 3], ChurnflowError> {
    let mut loaded = Vec::with_capacity(REQUIRED_TABLES.len());
    for name in REQUIRED_TABLES {
        let table = lake
            .read_raw(name, date)?
            .ok_or_else(|| DomainError::MissingPartition {
                table: name.to_string(),
                date: date.to_string(),
            })?;
        info!(table = name, records = table.row_count(), "Loaded raw table");
        loaded.push(table);
    }
    loaded
        .try_into()
        .map_err(|_| ChurnflowError::InternalError("required table count mismatch".into()))
}

fn check_readiness(statistics: &DatasetStatistics) {
    let rate = statistics.churn_rate;
    if rate < LOW_CHURN_RATE {
        warn!(churn_rate = rate, "Low churn rate may impact model performance");
    } else if rate > HIGH_CHURN_RATE {
        warn!(churn_rate = rate, "High churn rate indicates serious business issues");
    } else {
        info!(churn_rate = rate, "Churn rate within acceptable range");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::table::{Column, Value};
    use anyhow::Result;

    const DAY: &str = "2024-01-02";

    fn seed_lake(lake: &DataLake, with_crm: bool) -> Result<()> {
        lake.write_raw(
            &Table::new(
                "billing",
                vec![
                    Column::from_raw("customer_id", &[Some("7"), Some("8"), Some("9")]),
                    Column::from_raw("amount", &[Some("50"), Some("30"), Some("-10")]),
                ],
            )?,
            DAY,
        )?;
        lake.write_raw(
            &Table::new(
                "subscriptions",
                vec![
                    Column::from_raw("customer_id", &[Some("7"), Some("8")]),
                    Column::from_raw("status", &[Some(" Act "), Some("cancelled")]),
                ],
            )?,
            DAY,
        )?;
        if with_crm {
            lake.write_raw(
                &Table::new(
                    "crm",
                    vec![
                        Column::from_raw("ticket_id", &[Some("1"), Some("2")]),
                        Column::from_raw("customer_id", &[Some("7"), Some("8")]),
                        Column::from_raw("request_type", &[Some("Disconnect"), Some("complaint")]),
                        Column::from_raw("status", &[Some("CLOSED"), Some("open")]),
                        Column::from_raw("created_at", &[Some("2024-01-01"), Some("2024-01-01")]),
                    ],
                )?,
                DAY,
            )?;
        }
        Ok(())
    }

    #[test]
    fn test_prepares_latest_partition() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let lake = DataLake::new(dir.path());
        seed_lake(&lake, true)?;

        let outcome = run_preparation(&lake)?;
        assert_eq!(outcome.summary.source_partition, DAY);
        assert_eq!(outcome.master_shape.0, 2);
        assert_eq!(outcome.statistics.churned_customers, 1);
        assert_eq!(outcome.statistics.churn_rate, 50.0);
        assert_eq!(outcome.summary.cleaning_summary["billing"].records_removed, 1);
        assert_eq!(
            outcome.summary.data_quality_issues,
            vec!["Removed 1 billing records with invalid amounts".to_string()]
        );

        let written = lake.clean_partition_dir(DAY).join("cleaned_churn_dataset.csv");
        assert_eq!(outcome.save.output_file, written.display().to_string());
        let master = crate::infrastructure::csv_codec::read_table("master", &written)?;
        assert_eq!(master.column_names()[0], "customer_id");
        let churn = master.column("is_churned").unwrap();
        assert_eq!(churn.values(), &[Value::Int(1), Value::Int(0)]);
        Ok(())
    }

    #[test]
    fn test_missing_partition_is_fatal_and_writes_nothing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let lake = DataLake::new(dir.path());
        seed_lake(&lake, false)?;

        let err = run_preparation(&lake).unwrap_err();
        assert!(matches!(
            err,
            ChurnflowError::Domain(DomainError::MissingPartition { ref table, .. }) if table == "crm"
        ));
        assert!(!lake.clean_partition_dir(DAY).exists());
        Ok(())
    }

    #[test]
    fn test_empty_lake_has_no_partitions() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_preparation(&DataLake::new(dir.path())).unwrap_err();
        assert!(matches!(err, ChurnflowError::Domain(DomainError::NoPartitions)));
    }
}
