// churnflow-core/src/ports/mod.rs

pub mod source;

pub use source::RecordSource;
