// churnflow-core/src/application/mod.rs

pub mod clean;
pub mod ingestion;
pub mod pipeline;
pub mod ports;
pub mod preparation;
pub mod reporting;
pub mod stages;
pub mod storage;
pub mod validation;

// --- RE-EXPORTS (FACADE PATTERN) ---
// The CLI can write `use churnflow_core::application::{run_pipeline, run_validation};`
// without knowing the internal file layout.

pub use clean::clean_project;
pub use ingestion::{IngestionBatch, ingest_all};
pub use pipeline::{PipelineContext, RunResult, run_pipeline};
pub use preparation::{PreparationOutcome, run_preparation};
pub use storage::{StorageSummary, store_all};
pub use validation::{ValidationReport, run_validation};
