// churnflow-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Partition 'dt={date}' not found for table '{table}'")]
    #[diagnostic(
        code(churnflow::domain::missing_partition),
        help("Run `churnflow ingest` for that date or check the raw lake layout.")
    )]
    MissingPartition { table: String, date: String },

    #[error("No dated partitions found in the raw lake")]
    #[diagnostic(
        code(churnflow::domain::no_partitions),
        help("The raw lake is empty. Ingest data before preparing it.")
    )]
    NoPartitions,

    #[error("Column '{column}' is missing from table '{table}'")]
    #[diagnostic(code(churnflow::domain::schema_drift))]
    MissingColumn { table: String, column: String },

    #[error("Unparseable customer key '{value}' in table '{table}'")]
    #[diagnostic(
        code(churnflow::domain::join_key),
        help("Customer keys must be integers or non-empty text.")
    )]
    UnparseableKey { table: String, value: String },

    #[error("Table '{table}' is malformed: {reason}")]
    #[diagnostic(code(churnflow::domain::table))]
    MalformedTable { table: String, reason: String },
}
