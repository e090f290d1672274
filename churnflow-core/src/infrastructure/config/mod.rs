pub mod project;

pub use crate::domain::project::ProjectConfig;
pub use project::{ENV_DATA_ROOT, ENV_REPORTS_PATH, load_project_config};
