// churnflow-core/src/infrastructure/adapters/mod.rs

pub mod csv_file;
pub mod duckdb;
pub mod sqlite;

pub use csv_file::CsvFileSource;
pub use duckdb::DuckDBSource;
pub use sqlite::SqliteSource;

use crate::domain::project::Engine;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::source::RecordSource;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn re_identifier() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Hardcoded pattern; the fallback matches nothing
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

/// Table names are interpolated into SQL, so only plain identifiers are accepted.
pub fn validate_identifier(name: &str) -> Result<(), InfrastructureError> {
    if re_identifier().is_match(name) {
        Ok(())
    } else {
        Err(InfrastructureError::ConfigError(format!(
            "'{}' is not a valid table name",
            name
        )))
    }
}

/// Opens the configured relational source.
pub fn open_database(
    engine: Engine,
    path: &Path,
) -> Result<Box<dyn RecordSource>, InfrastructureError> {
    Ok(match engine {
        Engine::Sqlite => Box::new(SqliteSource::new(path)?),
        Engine::DuckDB => Box::new(DuckDBSource::new(&path.to_string_lossy())?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(validate_identifier("billing").is_ok());
        assert!(validate_identifier("_raw_2024").is_ok());
        assert!(validate_identifier("billing\"; --").is_err());
        assert!(validate_identifier("").is_err());
    }
}
