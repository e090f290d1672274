// churnflow-core/src/domain/table/mod.rs

pub mod key;
pub mod value;

pub use key::CustomerKey;
pub use value::{ColumnType, Value};

use crate::domain::error::DomainError;
use std::collections::HashSet;
use value::{
    DATE_OUTPUT_FORMAT, DATETIME_OUTPUT_FORMAT, format_float, is_na_token, parse_float, parse_int,
};

// --- COLUMN ---

/// A named, typed vector of cells. The storage type is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    dtype: ColumnType,
    values: Vec<Value>,
}

impl Column {
    /// Builds a column from raw text cells (CSV fields).
    ///
    /// Integers with missing cells widen to `Float64`; all-missing columns are `Float64`.
    /// Dates are left as text.
    pub fn from_raw<S: AsRef<str>>(name: impl Into<String>, raw: &[Option<S>]) -> Self {
        let cells: Vec<Option<&str>> = raw
            .iter()
            .map(|c| c.as_ref().map(|s| s.as_ref()).filter(|s| !is_na_token(s)))
            .collect();
        let present: Vec<&str> = cells.iter().flatten().copied().collect();
        let has_nulls = present.len() < cells.len();

        let (dtype, values) = if present.is_empty() {
            (ColumnType::Float64, vec![Value::Null; cells.len()])
        } else if present.iter().all(|s| parse_int(s).is_some()) {
            if has_nulls {
                let values = cells
                    .iter()
                    .map(|c| match c.and_then(parse_int) {
                        Some(i) => Value::Float(i as f64),
                        None => Value::Null,
                    })
                    .collect();
                (ColumnType::Float64, values)
            } else {
                let values = cells
                    .iter()
                    .map(|c| c.and_then(parse_int).map_or(Value::Null, Value::Int))
                    .collect();
                (ColumnType::Int64, values)
            }
        } else if present.iter().all(|s| parse_float(s).is_some()) {
            let values = cells
                .iter()
                .map(|c| c.and_then(parse_float).map_or(Value::Null, Value::Float))
                .collect();
            (ColumnType::Float64, values)
        } else {
            let values = cells
                .iter()
                .map(|c| c.map_or(Value::Null, |s| Value::Text(s.to_string())))
                .collect();
            (ColumnType::Text, values)
        };

        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    /// Builds a column from already typed cells (database rows), inferring the storage type.
    pub fn from_values(name: impl Into<String>, values: Vec<Value>) -> Self {
        let values: Vec<Value> = values
            .into_iter()
            .map(|v| if v.is_null() { Value::Null } else { v })
            .collect();
        let present: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
        let has_nulls = present.len() < values.len();

        let all_int = present.iter().all(|v| matches!(v, Value::Int(_)));
        let all_numeric = present
            .iter()
            .all(|v| matches!(v, Value::Int(_) | Value::Float(_)));
        let all_datetime = present.iter().all(|v| matches!(v, Value::DateTime(_)));

        let (dtype, values) = if present.is_empty() {
            (ColumnType::Float64, values)
        } else if all_int && !has_nulls {
            (ColumnType::Int64, values)
        } else if all_numeric {
            let widened = values
                .into_iter()
                .map(|v| v.as_f64().map_or(Value::Null, Value::Float))
                .collect();
            (ColumnType::Float64, widened)
        } else if all_datetime {
            (ColumnType::DateTime, values)
        } else {
            let as_text = values
                .into_iter()
                .map(|v| match v {
                    Value::Text(s) => Value::Text(s),
                    other => other.to_text().map_or(Value::Null, Value::Text),
                })
                .collect();
            (ColumnType::Text, as_text)
        };

        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    /// Builds a column with an explicit storage type. Callers guarantee the cells match it.
    pub fn with_type(name: impl Into<String>, dtype: ColumnType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> ColumnType {
        self.dtype
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Non-missing numeric cells, in row order.
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values.iter().filter_map(Value::as_f64).collect()
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn take(&self, rows: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            dtype: self.dtype,
            values: rows
                .iter()
                .map(|&i| self.values.get(i).cloned().unwrap_or_default())
                .collect(),
        }
    }

    /// Like `take`, `None` producing a missing cell. Integer columns that gain missing cells widen to float.
    pub fn take_optional(&self, rows: &[Option<usize>]) -> Self {
        let values: Vec<Value> = rows
            .iter()
            .map(|row| {
                row.and_then(|i| self.values.get(i).cloned())
                    .unwrap_or_default()
            })
            .collect();

        if self.dtype == ColumnType::Int64 && values.iter().any(Value::is_null) {
            let widened = values
                .into_iter()
                .map(|v| v.as_f64().map_or(Value::Null, Value::Float))
                .collect();
            return Self::with_type(self.name.clone(), ColumnType::Float64, widened);
        }
        Self::with_type(self.name.clone(), self.dtype, values)
    }

    /// Delimited-file rendering of every cell. Datetime columns holding only midnights render as dates.
    pub fn render_fields(&self) -> Vec<String> {
        let datetime_format = if self.dtype == ColumnType::DateTime
            && self
                .values
                .iter()
                .filter_map(Value::as_datetime)
                .all(|dt| dt.time() == chrono::NaiveTime::MIN)
        {
            DATE_OUTPUT_FORMAT
        } else {
            DATETIME_OUTPUT_FORMAT
        };

        self.values
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                Value::Int(i) => i.to_string(),
                Value::Float(f) if f.is_nan() => String::new(),
                Value::Float(f) => format_float(*f),
                Value::Text(s) => s.clone(),
                Value::DateTime(dt) => dt.format(datetime_format).to_string(),
            })
            .collect()
    }
}

// --- TABLE ---

/// Named rectangular dataset: ordered typed columns of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self, DomainError> {
        let name = name.into();

        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(DomainError::MalformedTable {
                    table: name,
                    reason: format!(
                        "column '{}' has {} rows, expected {}",
                        bad.name(),
                        bad.len(),
                        expected
                    ),
                });
            }
        }

        let mut seen = HashSet::new();
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.name())) {
            return Err(DomainError::MalformedTable {
                reason: format!("duplicate column '{}'", dup.name()),
                table: name,
            });
        }

        Ok(Self { name, columns })
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn require_column(&self, name: &str) -> Result<&Column, DomainError> {
        self.column(name).ok_or_else(|| DomainError::MissingColumn {
            table: self.name.clone(),
            column: name.to_string(),
        })
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn total_cells(&self) -> usize {
        self.row_count() * self.column_count()
    }

    pub fn null_count(&self) -> usize {
        self.columns.iter().map(Column::null_count).sum()
    }

    /// Keeps the rows whose flag is `true`.
    pub fn filter_rows(&self, keep: &[bool]) -> Self {
        let rows: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(i, &k)| k.then_some(i))
            .collect();
        Self {
            name: self.name.clone(),
            columns: self.columns.iter().map(|c| c.take(&rows)).collect(),
        }
    }

    /// Rewrites one column cell by cell. A missing column leaves the table untouched.
    pub fn map_column<F>(mut self, name: &str, dtype: ColumnType, f: F) -> Self
    where
        F: Fn(&Value) -> Value,
    {
        if let Some(col) = self.columns.iter_mut().find(|c| c.name() == name) {
            let values = col.values.iter().map(&f).collect();
            *col = Column::with_type(col.name.clone(), dtype, values);
        }
        self
    }

    /// Moves the named column to the front, keeping the order of the others.
    pub fn with_column_first(mut self, name: &str) -> Self {
        if let Some(pos) = self.columns.iter().position(|c| c.name() == name) {
            let col = self.columns.remove(pos);
            self.columns.insert(0, col);
        }
        self
    }
}
