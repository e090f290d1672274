// churnflow-core/src/infrastructure/csv_codec.rs

//! Delimited-file codec for tables: header row, comma separator, empty field for missing cells.

use crate::domain::table::{Column, Table};
use crate::error::ChurnflowError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Parses CSV text into a table, inferring column types.
pub fn parse_table<R: Read>(name: &str, reader: R) -> Result<Table, ChurnflowError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(InfrastructureError::from)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in rdr.records() {
        let record = record.map_err(InfrastructureError::from)?;
        for (i, column) in cells.iter_mut().enumerate() {
            column.push(record.get(i).map(str::to_string));
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(header, raw)| Column::from_raw(header, &raw))
        .collect();

    Ok(Table::new(name, columns)?)
}

pub fn read_table(name: &str, path: &Path) -> Result<Table, ChurnflowError> {
    let file = File::open(path)?;
    parse_table(name, file)
}

pub fn encode_table(table: &Table) -> Result<Vec<u8>, InfrastructureError> {
    if table.column_count() == 0 {
        return Ok(Vec::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.column_names())?;
    let rendered: Vec<Vec<String>> = table.columns().iter().map(|c| c.render_fields()).collect();
    for row in 0..table.row_count() {
        writer.write_record(rendered.iter().map(|col| col[row].as_str()))?;
    }

    writer
        .into_inner()
        .map_err(|e| InfrastructureError::Io(e.into_error()))
}

/// Encodes then atomically replaces `path`.
pub fn write_table(table: &Table, path: &Path) -> Result<(), InfrastructureError> {
    let bytes = encode_table(table)?;
    atomic_write(path, bytes)
}
