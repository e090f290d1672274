// churnflow-core/src/infrastructure/adapters/sqlite.rs

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use crate::domain::table::{Column, Table, Value};
use crate::error::ChurnflowError;
use crate::infrastructure::adapters::validate_identifier;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::source::RecordSource;

/// Read-only SQLite database. Each fetch opens its own connection on a blocking thread.
pub struct SqliteSource {
    db_path: PathBuf,
}

impl SqliteSource {
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self, InfrastructureError> {
        let db_path = db_path.into();
        if !db_path.is_file() {
            return Err(InfrastructureError::SourceUnavailable(format!(
                "SQLite database not found at {}",
                db_path.display()
            )));
        }
        Ok(Self { db_path })
    }
}

#[async_trait]
impl RecordSource for SqliteSource {
    #[instrument(skip(self), fields(source = "sqlite"))]
    async fn fetch_table(&self, table: &str) -> Result<Table, ChurnflowError> {
        validate_identifier(table)?;
        let db_path = self.db_path.clone();
        let name = table.to_string();

        tokio::task::spawn_blocking(move || read_table(&db_path, &name))
            .await
            .map_err(|e| ChurnflowError::InternalError(format!("SQLite task join error: {e}")))?
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.db_path.display())
    }
}

fn read_table(db_path: &Path, table: &str) -> Result<Table, ChurnflowError> {
    let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(InfrastructureError::from)?;
    let mut stmt = conn
        .prepare(&format!("SELECT * FROM \"{}\"", table))
        .map_err(InfrastructureError::from)?;

    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut cells: Vec<Vec<Value>> = vec![Vec::new(); names.len()];

    let mut rows = stmt.query([]).map_err(InfrastructureError::from)?;
    while let Some(row) = rows.next().map_err(InfrastructureError::from)? {
        for (i, column) in cells.iter_mut().enumerate() {
            let value = match row.get_ref(i).map_err(InfrastructureError::from)? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(n) => Value::Int(n),
                ValueRef::Real(f) => Value::Float(f),
                ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
                ValueRef::Blob(b) => Value::Text(format!("<blob {} bytes>", b.len())),
            };
            column.push(value);
        }
    }

    debug!(table, rows = cells.first().map_or(0, Vec::len), "Fetched SQLite table");
    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::from_values(name, values))
        .collect();
    Ok(Table::new(table, columns)?)
}
