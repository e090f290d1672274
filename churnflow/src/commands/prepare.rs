// churnflow/src/commands/prepare.rs
//
// USE CASE: Clean and join the latest raw partition into the churn dataset.

use anyhow::Context;
use std::path::PathBuf;

use churnflow_core::application::reporting::{format_quality_notes, format_statistics};
use churnflow_core::application::run_preparation;

pub fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let config = super::load_config(&project_dir)?;

    println!("🔧 Preparing churn dataset...");
    let outcome = run_preparation(&super::lake(&project_dir, &config))
        .context("Preparation failed")?;

    println!(
        "📊 Clean dataset: {} rows x {} columns (partition dt={})",
        outcome.master_shape.0, outcome.master_shape.1, outcome.summary.source_partition
    );
    println!("{}", format_statistics(&outcome.statistics));
    println!("{}", format_quality_notes(&outcome.summary.data_quality_issues));
    println!("✨ Saved to {}", outcome.save.output_file);
    Ok(())
}
