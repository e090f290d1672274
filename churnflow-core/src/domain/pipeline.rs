// churnflow-core/src/domain/pipeline.rs

use serde::Serialize;
use std::fmt;

/// The fixed stages of a pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Ingestion,
    Storage,
    Validation,
    Preparation,
    Transformation,
    FeatureStore,
    Versioning,
    ModelBuilding,
}

impl PipelineStep {
    pub const SEQUENCE: [PipelineStep; 8] = [
        Self::Ingestion,
        Self::Storage,
        Self::Validation,
        Self::Preparation,
        Self::Transformation,
        Self::FeatureStore,
        Self::Versioning,
        Self::ModelBuilding,
    ];

    /// Stable identifier, used for config keys and report file names.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Ingestion => "ingestion",
            Self::Storage => "storage",
            Self::Validation => "validation",
            Self::Preparation => "preparation",
            Self::Transformation => "transformation",
            Self::FeatureStore => "feature_store",
            Self::Versioning => "versioning",
            Self::ModelBuilding => "model_building",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ingestion => "Data Ingestion",
            Self::Storage => "Raw Data Storage",
            Self::Validation => "Data Validation",
            Self::Preparation => "Data Preparation",
            Self::Transformation => "Data Transformation",
            Self::FeatureStore => "Feature Store",
            Self::Versioning => "Data Versioning",
            Self::ModelBuilding => "Model Building",
        }
    }

    /// Steps that write a markdown report.
    pub fn has_report(&self) -> bool {
        matches!(
            self,
            Self::Ingestion | Self::Storage | Self::Validation | Self::Preparation
        )
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_order() {
        assert_eq!(PipelineStep::SEQUENCE[0], PipelineStep::Ingestion);
        assert_eq!(PipelineStep::SEQUENCE[3], PipelineStep::Preparation);
        assert_eq!(PipelineStep::SEQUENCE[7], PipelineStep::ModelBuilding);
    }

    #[test]
    fn test_only_data_steps_report() {
        let reporting: Vec<&str> = PipelineStep::SEQUENCE
            .iter()
            .filter(|s| s.has_report())
            .map(|s| s.key())
            .collect();
        assert_eq!(reporting, vec!["ingestion", "storage", "validation", "preparation"]);
    }
}
