// churnflow-core/src/application/storage.rs

use serde::Serialize;
use tracing::{info, instrument};

use crate::application::ingestion::IngestionBatch;
use crate::error::ChurnflowError;
use crate::infrastructure::lake::{DataLake, StorageReceipt};

#[derive(Debug, Clone, Serialize)]
pub struct StorageSummary {
    pub partition_date: String,
    pub tables_stored: Vec<String>,
    pub receipts: Vec<StorageReceipt>,
    pub total_records: usize,
}

/// Writes every ingested table to its raw partition. Stops at the first failed write.
#[instrument(skip_all, fields(date = %batch.ingestion_date))]
pub fn store_all(lake: &DataLake, batch: &IngestionBatch) -> Result<StorageSummary, ChurnflowError> {
    let partition_date = batch.ingestion_date.to_string();
    let mut receipts = Vec::with_capacity(batch.tables.len());

    for ingested in &batch.tables {
        info!(table = ingested.name(), "Storing table");
        receipts.push(lake.write_raw(&ingested.table, &partition_date)?);
    }

    let summary = StorageSummary {
        tables_stored: receipts.iter().map(|r| r.table.clone()).collect(),
        total_records: receipts.iter().map(|r| r.records_stored).sum(),
        receipts,
        partition_date,
    };
    info!(tables = ?summary.tables_stored, "All tables stored successfully");
    Ok(summary)
}
