// churnflow/src/commands/mod.rs

pub mod clean;
pub mod ingest;
pub mod prepare;
pub mod run;
pub mod validate;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use std::path::Path;

use churnflow_core::domain::project::ProjectConfig;
use churnflow_core::infrastructure::DataLake;
use churnflow_core::infrastructure::config::load_project_config;

pub(crate) fn load_config(project_dir: &Path) -> anyhow::Result<ProjectConfig> {
    println!("⚙️  Loading configuration...");
    let config = load_project_config(project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    println!("   Project: {} (v{})", config.name, config.version);
    Ok(config)
}

pub(crate) fn lake(project_dir: &Path, config: &ProjectConfig) -> DataLake {
    DataLake::new(project_dir.join(&config.data_root))
}

pub(crate) fn date_or_today(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}
