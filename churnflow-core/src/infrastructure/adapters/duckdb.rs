// churnflow-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use duckdb::types::{TimeUnit, Value as DuckValue};
use duckdb::{Config, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument};

use crate::domain::table::{Column, Table, Value};
use crate::error::ChurnflowError;
use crate::infrastructure::adapters::validate_identifier;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::source::RecordSource;

/// Days from 0001-01-01 (CE) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub struct DuckDBSource {
    conn: Arc<Mutex<Connection>>,
    location: String,
}

impl DuckDBSource {
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();

        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            if !Path::new(db_path).is_file() {
                return Err(InfrastructureError::SourceUnavailable(format!(
                    "DuckDB database not found at {}",
                    db_path
                )));
            }
            Connection::open_with_flags(db_path, config)?
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location: db_path.to_string(),
        })
    }

    /// Runs a statement batch (DDL, inserts). Used to seed in-memory databases.
    pub fn execute(&self, sql: &str) -> Result<(), ChurnflowError> {
        let conn = lock(&self.conn)?;
        conn.execute_batch(sql).map_err(InfrastructureError::from)?;
        Ok(())
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<std::sync::MutexGuard<'_, Connection>, ChurnflowError> {
    conn.lock().map_err(|_| {
        ChurnflowError::Infrastructure(InfrastructureError::Io(std::io::Error::other(
            "DuckDB Mutex Poisoned",
        )))
    })
}

#[async_trait]
impl RecordSource for DuckDBSource {
    #[instrument(skip(self), fields(source = "duckdb"))]
    async fn fetch_table(&self, table: &str) -> Result<Table, ChurnflowError> {
        validate_identifier(table)?;
        let conn = Arc::clone(&self.conn);
        let name = table.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            read_table(&conn, &name)
        })
        .await
        .map_err(|e| ChurnflowError::InternalError(format!("DuckDB task join error: {e}")))?
    }

    fn describe(&self) -> String {
        format!("duckdb:{}", self.location)
    }
}

fn read_table(conn: &Connection, table: &str) -> Result<Table, ChurnflowError> {
    let names = column_names(conn, table)?;

    let mut stmt = conn
        .prepare(&format!("SELECT * FROM \"{}\"", table))
        .map_err(InfrastructureError::from)?;
    let mut cells: Vec<Vec<Value>> = vec![Vec::new(); names.len()];

    let mut rows = stmt.query([]).map_err(InfrastructureError::from)?;
    while let Some(row) = rows.next().map_err(InfrastructureError::from)? {
        for (i, column) in cells.iter_mut().enumerate() {
            let raw: DuckValue = row.get(i).map_err(InfrastructureError::from)?;
            column.push(convert(raw));
        }
    }

    debug!(table, rows = cells.first().map_or(0, Vec::len), "Fetched DuckDB table");
    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::from_values(name, values))
        .collect();
    Ok(Table::new(table, columns)?)
}

fn column_names(conn: &Connection, table: &str) -> Result<Vec<String>, InfrastructureError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info('{}')", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

fn convert(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Int(i64::from(b)),
        DuckValue::TinyInt(n) => Value::Int(n.into()),
        DuckValue::SmallInt(n) => Value::Int(n.into()),
        DuckValue::Int(n) => Value::Int(n.into()),
        DuckValue::BigInt(n) => Value::Int(n),
        DuckValue::UTinyInt(n) => Value::Int(n.into()),
        DuckValue::USmallInt(n) => Value::Int(n.into()),
        DuckValue::UInt(n) => Value::Int(n.into()),
        DuckValue::UBigInt(n) => i64::try_from(n).map_or(Value::Float(n as f64), Value::Int),
        DuckValue::HugeInt(n) => i64::try_from(n).map_or(Value::Float(n as f64), Value::Int),
        DuckValue::Float(f) => Value::Float(f.into()),
        DuckValue::Double(f) => Value::Float(f),
        DuckValue::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .map_or(Value::Null, Value::Float),
        DuckValue::Text(s) | DuckValue::Enum(s) => Value::Text(s),
        DuckValue::Timestamp(unit, v) => DateTime::from_timestamp_micros(to_micros(unit, v))
            .map_or(Value::Null, |dt| Value::DateTime(dt.naive_utc())),
        DuckValue::Date32(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map_or(Value::Null, Value::DateTime),
        DuckValue::Blob(b) => Value::Text(format!("<blob {} bytes>", b.len())),
        other => Value::Text(format!("{:?}", other)),
    }
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}
