// churnflow-core/src/application/ingestion.rs

use chrono::NaiveDate;
use tracing::{error, info, instrument};

use crate::domain::table::Table;
use crate::error::ChurnflowError;
use crate::ports::source::RecordSource;

pub const CRM_TABLE: &str = "crm";

#[derive(Debug, Clone)]
pub struct IngestedTable {
    pub table: Table,
    pub source: String,
}

impl IngestedTable {
    pub fn name(&self) -> &str {
        self.table.name()
    }

    pub fn records(&self) -> usize {
        self.table.row_count()
    }
}

/// Every table read in one ingestion pass, bound to the partition date it will be stored under.
#[derive(Debug, Clone)]
pub struct IngestionBatch {
    pub ingestion_date: NaiveDate,
    pub tables: Vec<IngestedTable>,
    pub total_records: usize,
}

impl IngestionBatch {
    fn new(ingestion_date: NaiveDate) -> Self {
        Self {
            ingestion_date,
            tables: Vec::new(),
            total_records: 0,
        }
    }

    fn push(&mut self, table: Table, source: String) {
        info!(table = table.name(), records = table.row_count(), "Table loaded");
        self.total_records += table.row_count();
        self.tables.push(IngestedTable { table, source });
    }
}

/// Reads the configured database tables, then the CRM export.
#[instrument(skip(database, crm))]
pub async fn ingest_all(
    database: &dyn RecordSource,
    tables: &[String],
    crm: &dyn RecordSource,
    ingestion_date: NaiveDate,
) -> Result<IngestionBatch, ChurnflowError> {
    info!(source = %database.describe(), "Starting data ingestion");
    let mut batch = IngestionBatch::new(ingestion_date);

    for name in tables {
        let table = database
            .fetch_table(name)
            .await
            .inspect_err(|e| error!(table = %name, error = %e, "Failed to ingest table"))?;
        batch.push(table, database.describe());
    }

    let crm_table = crm
        .fetch_table(CRM_TABLE)
        .await
        .inspect_err(|e| error!(table = CRM_TABLE, error = %e, "Failed to ingest CRM export"))?;
    batch.push(crm_table, crm.describe());

    info!(total_records = batch.total_records, "All data ingested successfully");
    Ok(batch)
}
