// churnflow-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(churnflow::infra::database::duckdb),
        help("An error occurred inside the DuckDB source database.")
    )]
    DuckDB(#[from] duckdb::Error),

    #[error("SQLite Engine Error: {0}")]
    #[diagnostic(
        code(churnflow::infra::database::sqlite),
        help("An error occurred while reading the SQLite source database.")
    )]
    Sqlite(#[from] rusqlite::Error),
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATABASE (Abstracted) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    #[error("Source unavailable: {0}")]
    #[diagnostic(
        code(churnflow::infra::source_unavailable),
        help("Check `source.database` and `source.crm_csv` in churnflow.yaml.")
    )]
    SourceUnavailable(String),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(churnflow::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- LAKE FILES ---
    #[error("CSV Error: {0}")]
    #[diagnostic(
        code(churnflow::infra::csv),
        help("Every record must have as many fields as the header row.")
    )]
    Csv(#[from] csv::Error),

    #[error("JSON Serialization Error: {0}")]
    #[diagnostic(code(churnflow::infra::json))]
    Json(#[from] serde_json::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(churnflow::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(churnflow::infra::config))]
    ConfigError(String),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(code(churnflow::infra::config_missing))]
    ConfigNotFound(String),

    // --- TEMPLATING ---
    #[error("Template Rendering Error: {0}")]
    #[diagnostic(
        code(churnflow::infra::template),
        help("Check the placeholders ({{ ... }}) of the report template.")
    )]
    TemplateError(#[from] minijinja::Error),
}

// Shortcuts for `?` on database calls
impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Database(DatabaseError::DuckDB(err))
    }
}

impl From<rusqlite::Error> for InfrastructureError {
    fn from(err: rusqlite::Error) -> Self {
        InfrastructureError::Database(DatabaseError::Sqlite(err))
    }
}
