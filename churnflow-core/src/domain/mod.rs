pub mod error;
pub mod pipeline;
pub mod preparation;
pub mod project;
pub mod quality;
pub mod stats;
pub mod table;

// Re-exports used across the crate
pub use error::DomainError;
pub use table::{Column, ColumnType, CustomerKey, Table, Value};
