// churnflow-core/src/ports/source.rs

// What ingestion needs from a data source, without knowing where the rows live
// (SQLite file, DuckDB database, CSV export).

use crate::domain::table::Table;
use crate::error::ChurnflowError;
use async_trait::async_trait;

#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Reads every row of `table` into memory, inferring column types.
    async fn fetch_table(&self, table: &str) -> Result<Table, ChurnflowError>;

    /// Human readable origin, used in logs and ingestion reports.
    fn describe(&self) -> String;
}
