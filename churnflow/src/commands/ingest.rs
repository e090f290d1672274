// churnflow/src/commands/ingest.rs
//
// USE CASE: Ingest the sources and store them in the raw lake, without validating.

use anyhow::Context;
use chrono::NaiveDate;
use std::path::PathBuf;

use churnflow_core::application::{ingest_all, store_all};
use churnflow_core::infrastructure::adapters::{CsvFileSource, open_database};

pub async fn execute(project_dir: PathBuf, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let config = super::load_config(&project_dir)?;
    let date = super::date_or_today(date);

    let db_path = project_dir.join(&config.source.database);
    let database = open_database(config.source.engine, &db_path)
        .with_context(|| format!("Failed to open source database {:?}", db_path))?;
    let crm = CsvFileSource::new(project_dir.join(&config.source.crm_csv));

    println!("📥 Ingesting from {}...", database.describe());
    let batch = ingest_all(database.as_ref(), &config.source.tables, &crm, date)
        .await
        .context("Ingestion failed")?;

    let summary = store_all(&super::lake(&project_dir, &config), &batch)
        .context("Raw storage failed")?;

    for receipt in &summary.receipts {
        println!(
            "   💾 {} -> {} ({} records)",
            receipt.table, receipt.file_path, receipt.records_stored
        );
    }
    println!(
        "✨ Stored {} tables ({} records) under dt={}",
        summary.tables_stored.len(),
        summary.total_records,
        summary.partition_date
    );
    Ok(())
}
