// churnflow/src/commands/validate.rs
//
// USE CASE: Validate the raw partitions of one date and print the summary table.

use anyhow::Context;
use chrono::NaiveDate;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use std::path::PathBuf;

use churnflow_core::application::reporting::{format_issues, validation_summary_rows};
use churnflow_core::application::run_validation;

pub fn execute(project_dir: PathBuf, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let config = super::load_config(&project_dir)?;
    let date = super::date_or_today(date);

    println!("🔍 Validating partitions dt={}...", date);
    let report = run_validation(&super::lake(&project_dir, &config), date, &config.validation)
        .context("Validation failed")?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Table", "Records", "Columns", "Status"]);
    for row in validation_summary_rows(&report) {
        table.add_row(vec![
            row.table,
            row.records,
            row.columns.to_string(),
            row.status.to_string(),
        ]);
    }

    println!("{table}");
    println!(
        "   Tables validated: {}/{}",
        report.tables_found.len(),
        report.tables_expected.len()
    );
    println!(
        "   Quality score: {}/100 ({})",
        report.quality_score, report.quality_label
    );
    if report.total_issues > 0 {
        println!("\n{}", format_issues(&report.top_issues));
    }
    if report.is_below(config.validation.quality_threshold) {
        println!(
            "\n⚠️  Quality score is below the threshold of {}",
            config.validation.quality_threshold
        );
    }
    Ok(())
}
