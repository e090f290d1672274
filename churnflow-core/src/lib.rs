// churnflow-core/src/lib.rs

// 1. Documentation is not mandatory yet
#![allow(missing_docs)]
// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Contracts the use cases need from the outside world (record sources).
pub mod ports;

// 2. Domain (business core)
// Table model, quality checks, cleaning and join rules, project configuration.
// Depends on nothing else (neither infra nor app).
pub mod domain;

// 3. Infrastructure (Adapters)
// SQLite / DuckDB / CSV sources, the partitioned data lake, config files, templates.
pub mod infrastructure;

// 4. Application (Use Cases)
// Ingestion, storage, validation, preparation and the pipeline orchestrator.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
// use churnflow_core::ChurnflowError;
pub use error::ChurnflowError;
