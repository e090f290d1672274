// churnflow/src/commands/run.rs
//
// USE CASE: Run the whole pipeline.

use anyhow::Context;
use chrono::NaiveDate;
use std::path::PathBuf;

use churnflow_core::application::{PipelineContext, run_pipeline};
use churnflow_core::infrastructure::adapters::{CsvFileSource, open_database};
use churnflow_core::infrastructure::report::JinjaRenderer;

pub async fn execute(project_dir: PathBuf, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let start = std::time::Instant::now();

    // A. Load the Config (Infra)
    let config = super::load_config(&project_dir)?;

    // B. Instantiate the source adapters based on engine config
    let db_path = project_dir.join(&config.source.database);
    let database = open_database(config.source.engine, &db_path)
        .with_context(|| format!("Failed to open source database {:?}", db_path))?;
    println!("   Source: {}", database.describe());
    let crm = CsvFileSource::new(project_dir.join(&config.source.crm_csv));
    let renderer = JinjaRenderer::new().context("Failed to load report templates")?;

    // C. Run the Pipeline (Application Layer)
    let result = run_pipeline(PipelineContext {
        config: &config,
        project_dir: &project_dir,
        database: database.as_ref(),
        crm: &crm,
        renderer: &renderer,
        run_date: super::date_or_today(date),
    })
    .await;

    match result {
        Ok(run) => {
            println!(
                "\n✨ SUCCESS! {} finished {} steps in {:.2?}",
                run.run_name,
                run.tasks_completed.len(),
                start.elapsed()
            );
            println!("   Dataset: {}", run.output_file);
            println!("   Reports: {}", run.reports_dir);
        }
        Err(e) => {
            eprintln!("\n💥 CRITICAL PIPELINE ERROR: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
