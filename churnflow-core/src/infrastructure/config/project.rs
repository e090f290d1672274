// churnflow-core/src/infrastructure/config/project.rs

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::project::configuration::ProjectConfig;
use crate::infrastructure::error::InfrastructureError;

pub const ENV_DATA_ROOT: &str = "CHURNFLOW_DATA_ROOT";
pub const ENV_REPORTS_PATH: &str = "CHURNFLOW_REPORTS_PATH";

const CONFIG_CANDIDATES: [&str; 2] = ["churnflow.yaml", "churnflow.yml"];

#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    // 1. Locate the project file
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project configuration");

    // 2. Parse + validate
    let content = fs::read_to_string(&config_path)?;
    let mut config: ProjectConfig = serde_yaml::from_str(&content)?;
    config.validate().map_err(|e| {
        InfrastructureError::ConfigError(format!("{}: {}", config_path.display(), e))
    })?;

    // 3. Environment layering, e.g. CHURNFLOW_DATA_ROOT=/mnt/lake churnflow run
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    CONFIG_CANDIDATES
        .iter()
        .map(|name| root.join(name))
        .find(|p| p.is_file())
        .ok_or_else(|| {
            InfrastructureError::ConfigNotFound(format!(
                "{} (checked: {:?})",
                root.display(),
                CONFIG_CANDIDATES
            ))
        })
}

fn apply_env_overrides<F>(config: &mut ProjectConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(ENV_DATA_ROOT) {
        info!(old = ?config.data_root, new = ?val, "Overriding data root via ENV");
        config.data_root = val;
    }
    if let Some(val) = lookup(ENV_REPORTS_PATH) {
        info!(old = ?config.reports_path, new = ?val, "Overriding reports path via ENV");
        config.reports_path = val;
    }
}
