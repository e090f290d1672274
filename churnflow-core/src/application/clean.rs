// churnflow-core/src/application/clean.rs

use crate::error::ChurnflowError;
use crate::infrastructure::config::project::load_project_config;
use std::fs;
use std::path::{Component, Path};

/// Removes the configured clean targets (lake outputs, reports). Returns the removed paths.
pub fn clean_project(project_dir: &Path) -> Result<Vec<String>, ChurnflowError> {
    tracing::info!("🧹 Cleaning churnflow artifacts...");

    let config = load_project_config(project_dir)?;
    let mut removed = Vec::new();

    for target_rel_path in config.clean_targets {
        let relative = Path::new(&target_rel_path);

        // Only plain relative paths inside the project
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(ChurnflowError::UnsafePath(target_rel_path));
        }

        let full_path = project_dir.join(relative);
        if full_path.is_dir() {
            fs::remove_dir_all(&full_path)?;
        } else if full_path.exists() {
            fs::remove_file(&full_path)?;
        } else {
            continue;
        }
        println!("   🗑️  Artifact removed: {}", target_rel_path);
        removed.push(target_rel_path);
    }

    Ok(removed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn project(targets: &str) -> Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join("churnflow.yaml"),
            format!(
                "name: test\nclean-targets: {}\nsource:\n  database: db.sqlite\n  crm_csv: crm.csv\n",
                targets
            ),
        )?;
        Ok(dir)
    }

    #[test]
    fn test_removes_existing_targets() -> Result<()> {
        let dir = project("[data/clean, reports, missing]")?;
        fs::create_dir_all(dir.path().join("data/clean/churn_dataset"))?;
        fs::create_dir_all(dir.path().join("data/raw/billing"))?;
        fs::create_dir_all(dir.path().join("reports"))?;

        let removed = clean_project(dir.path())?;
        assert_eq!(removed, vec!["data/clean", "reports"]);
        assert!(!dir.path().join("data/clean").exists());
        assert!(dir.path().join("data/raw/billing").exists());
        Ok(())
    }

    #[test]
    fn test_rejects_traversal() -> Result<()> {
        let dir = project("[\"../outside\"]")?;
        let err = clean_project(dir.path()).unwrap_err();
        assert!(matches!(err, ChurnflowError::UnsafePath(p) if p == "../outside"));

        let dir = project("[\"/etc\"]")?;
        assert!(matches!(
            clean_project(dir.path()),
            Err(ChurnflowError::UnsafePath(_))
        ));
        Ok(())
    }
}
