// churnflow-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChurnflowError {
    // --- DOMAIN ERRORS (partitions, schema, join keys) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (IO, CSV, databases, config) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- ORCHESTRATION ---
    #[error("Step '{step}' failed after {attempts} attempt(s): {source}")]
    StepFailed {
        step: String,
        attempts: u32,
        #[source]
        source: Box<ChurnflowError>,
    },

    // --- GENERIC / APPLICATION ERRORS ---
    #[error("Internal Error: {0}")]
    InternalError(String),

    #[error("Unsafe path traversal detected: {0}")]
    UnsafePath(String),
}

// Manual implementation to avoid duplicate enum variant but keep ergonomics
impl From<std::io::Error> for ChurnflowError {
    fn from(err: std::io::Error) -> Self {
        ChurnflowError::Infrastructure(InfrastructureError::Io(err))
    }
}
