// churnflow-core/src/infrastructure/adapters/csv_file.rs

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::instrument;

use crate::domain::table::Table;
use crate::error::ChurnflowError;
use crate::infrastructure::csv_codec::read_table;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::source::RecordSource;

/// A single delimited export (the CRM ticket dump). Any requested table name reads the same file.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSource for CsvFileSource {
    #[instrument(skip(self), fields(source = "csv"))]
    async fn fetch_table(&self, table: &str) -> Result<Table, ChurnflowError> {
        if !self.path.is_file() {
            return Err(InfrastructureError::SourceUnavailable(format!(
                "CSV file not found at {}",
                self.path.display()
            ))
            .into());
        }
        read_table(table, &self.path)
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[tokio::test]
    async fn test_reads_file_under_requested_name() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("crm.csv");
        std::fs::write(&path, "ticket_id,customer_id,request_type\n1,7,disconnect\n")?;

        let table = CsvFileSource::new(&path).fetch_table("crm").await?;
        assert_eq!(table.name(), "crm");
        assert_eq!(table.shape(), (1, 3));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let result = CsvFileSource::new("/nonexistent/crm.csv")
            .fetch_table("crm")
            .await;
        assert!(matches!(
            result,
            Err(ChurnflowError::Infrastructure(
                InfrastructureError::SourceUnavailable(_)
            ))
        ));
    }
}
