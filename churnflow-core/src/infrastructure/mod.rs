// churnflow-core/src/infrastructure/mod.rs

pub mod adapters;
pub mod config;
pub mod csv_codec;
pub mod error;
pub mod fs;
pub mod lake;
pub mod report;

pub use lake::DataLake;
