// churnflow-core/src/infrastructure/lake.rs

use crate::domain::table::Table;
use crate::error::ChurnflowError;
use crate::infrastructure::csv_codec::{read_table, write_table};
use crate::infrastructure::error::InfrastructureError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

const PARTITION_PREFIX: &str = "dt=";
const CLEAN_DATASET: &str = "churn_dataset";
const CLEAN_FILE: &str = "cleaned_churn_dataset.csv";

/// Where a raw table landed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageReceipt {
    pub table: String,
    pub file_path: String,
    pub records_stored: usize,
    pub storage_date: String,
    pub directory: String,
}

/// Where the master dataset landed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveReceipt {
    pub output_file: String,
    pub records: usize,
    pub features: usize,
    pub partition_date: String,
}

/// Date-partitioned file layout under one root:
///
/// ```text
/// <root>/raw/<table>/dt=<date>/<table>.csv
/// <root>/clean/churn_dataset/dt=<date>/cleaned_churn_dataset.csv
/// ```
#[derive(Debug, Clone)]
pub struct DataLake {
    root: PathBuf,
}

impl DataLake {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_root(&self) -> PathBuf {
        self.root.join("raw")
    }

    pub fn raw_partition_dir(&self, table: &str, date: &str) -> PathBuf {
        self.raw_root()
            .join(table)
            .join(format!("{}{}", PARTITION_PREFIX, date))
    }

    pub fn clean_partition_dir(&self, date: &str) -> PathBuf {
        self.root
            .join("clean")
            .join(CLEAN_DATASET)
            .join(format!("{}{}", PARTITION_PREFIX, date))
    }

    /// Writes (or overwrites) the `date` partition of `table`.
    #[instrument(skip(self, table), fields(name = table.name()))]
    pub fn write_raw(&self, table: &Table, date: &str) -> Result<StorageReceipt, InfrastructureError> {
        let directory = self.raw_partition_dir(table.name(), date);
        let file_path = directory.join(format!("{}.csv", table.name()));
        write_table(table, &file_path)?;

        info!(path = ?file_path, records = table.row_count(), "Stored raw partition");
        Ok(StorageReceipt {
            table: table.name().to_string(),
            file_path: file_path.display().to_string(),
            records_stored: table.row_count(),
            storage_date: date.to_string(),
            directory: directory.display().to_string(),
        })
    }

    /// Table directories under `raw/`, sorted by name.
    pub fn list_tables(&self) -> Result<Vec<String>, InfrastructureError> {
        subdirectories(&self.raw_root())
    }

    /// Partition dates of one table, ascending.
    pub fn partition_dates(&self, table: &str) -> Result<Vec<String>, InfrastructureError> {
        Ok(subdirectories(&self.raw_root().join(table))?
            .into_iter()
            .filter_map(|d| d.strip_prefix(PARTITION_PREFIX).map(str::to_string))
            .collect())
    }

    /// Greatest partition date across every table (string order on ISO dates).
    pub fn latest_partition(&self) -> Result<Option<String>, InfrastructureError> {
        let mut latest: Option<String> = None;
        for table in self.list_tables()? {
            for date in self.partition_dates(&table)? {
                if latest.as_ref().is_none_or(|l| date > *l) {
                    latest = Some(date);
                }
            }
        }
        Ok(latest)
    }

    /// Reads one partition. `Ok(None)` when the partition directory or its file is missing.
    ///
    /// Prefers `<table>.csv`, otherwise the first CSV file in name order.
    pub fn read_raw(&self, table: &str, date: &str) -> Result<Option<Table>, ChurnflowError> {
        let dir = self.raw_partition_dir(table, date);
        if !dir.is_dir() {
            return Ok(None);
        }

        let preferred = dir.join(format!("{}.csv", table));
        let file = if preferred.is_file() {
            Some(preferred)
        } else {
            first_csv(&dir)?
        };

        match file {
            Some(path) => {
                debug!(path = ?path, "Reading raw partition");
                read_table(table, &path).map(Some)
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, master), fields(rows = master.row_count()))]
    pub fn write_clean(&self, master: &Table, date: &str) -> Result<SaveReceipt, InfrastructureError> {
        let output = self.clean_partition_dir(date).join(CLEAN_FILE);
        write_table(master, &output)?;

        info!(path = ?output, "Cleaned dataset saved");
        Ok(SaveReceipt {
            output_file: output.display().to_string(),
            records: master.row_count(),
            features: master.column_count(),
            partition_date: date.to_string(),
        })
    }
}

fn subdirectories(dir: &Path) -> Result<Vec<String>, InfrastructureError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| InfrastructureError::Io(e.into()))?;
        if entry.file_type().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

fn first_csv(dir: &Path) -> Result<Option<PathBuf>, InfrastructureError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| InfrastructureError::Io(e.into()))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files.into_iter().next())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::table::Column;
    use anyhow::Result;
    use tempfile::tempdir;

    fn billing() -> Table {
        Table::new(
            "billing",
            vec![
                Column::from_raw("customer_id", &[Some("1"), Some("2")]),
                Column::from_raw("amount", &[Some("10.5"), Some("20")]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_raw_layout_and_read_back() -> Result<()> {
        let dir = tempdir()?;
        let lake = DataLake::new(dir.path());

        let receipt = lake.write_raw(&billing(), "2024-01-01")?;
        assert_eq!(receipt.records_stored, 2);
        assert!(
            dir.path()
                .join("raw/billing/dt=2024-01-01/billing.csv")
                .is_file()
        );

        let table = lake.read_raw("billing", "2024-01-01")?.unwrap();
        assert_eq!(table, billing());
        assert!(lake.read_raw("billing", "2023-12-31")?.is_none());
        Ok(())
    }

    #[test]
    fn test_latest_partition_across_tables() -> Result<()> {
        let dir = tempdir()?;
        let lake = DataLake::new(dir.path());
        assert_eq!(lake.latest_partition()?, None);

        lake.write_raw(&billing(), "2024-01-01")?;
        lake.write_raw(&billing().renamed("crm"), "2024-01-03")?;
        lake.write_raw(&billing().renamed("subscriptions"), "2024-01-02")?;
        std::fs::create_dir_all(dir.path().join("raw/billing/tmp"))?;

        assert_eq!(lake.list_tables()?, vec!["billing", "crm", "subscriptions"]);
        assert_eq!(lake.partition_dates("billing")?, vec!["2024-01-01"]);
        assert_eq!(lake.latest_partition()?, Some("2024-01-03".to_string()));
        Ok(())
    }

    #[test]
    fn test_partition_falls_back_to_any_csv() -> Result<()> {
        let dir = tempdir()?;
        let lake = DataLake::new(dir.path());
        let partition = lake.raw_partition_dir("crm", "2024-01-01");
        std::fs::create_dir_all(&partition)?;
        std::fs::write(partition.join("export.csv"), "ticket_id\n1\n")?;

        let table = lake.read_raw("crm", "2024-01-01")?.unwrap();
        assert_eq!(table.name(), "crm");
        assert_eq!(table.row_count(), 1);
        Ok(())
    }

    #[test]
    fn test_clean_layout() -> Result<()> {
        let dir = tempdir()?;
        let lake = DataLake::new(dir.path());
        let receipt = lake.write_clean(&billing().renamed("churn_dataset"), "2024-01-01")?;

        assert_eq!(receipt.records, 2);
        assert_eq!(receipt.features, 2);
        assert!(
            dir.path()
                .join("clean/churn_dataset/dt=2024-01-01/cleaned_churn_dataset.csv")
                .is_file()
        );
        Ok(())
    }
}
