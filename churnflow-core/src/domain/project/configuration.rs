// churnflow-core/src/domain/project/configuration.rs

use crate::domain::pipeline::PipelineStep;
use crate::domain::quality::Severity;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Relational engine holding the billing and subscription tables.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    Sqlite,
    DuckDB,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct ProjectConfig {
    #[validate(length(min = 1, message = "Project name cannot be empty"))]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(rename = "data-root", default = "default_data_root")]
    pub data_root: String,

    #[serde(rename = "reports-path", default = "default_reports_path")]
    pub reports_path: String,

    #[serde(rename = "clean-targets", default = "default_clean_targets")]
    pub clean_targets: Vec<String>,

    #[validate(nested)]
    pub source: SourceConfig,

    #[validate(nested)]
    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub orchestration: OrchestrationConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct SourceConfig {
    #[serde(default)]
    pub engine: Engine,

    #[validate(length(min = 1, message = "Database path cannot be empty"))]
    pub database: String,

    #[validate(length(min = 1, message = "At least one table must be ingested"))]
    #[serde(default = "default_tables")]
    pub tables: Vec<String>,

    #[validate(length(min = 1, message = "CRM file path cannot be empty"))]
    pub crm_csv: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct ValidationConfig {
    #[validate(range(max = 100, message = "Quality threshold is a score between 0 and 100"))]
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: u32,

    #[serde(default)]
    pub business_rules: BusinessRuleConfig,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            quality_threshold: default_quality_threshold(),
            business_rules: BusinessRuleConfig::default(),
        }
    }
}

/// How business-rule violations feed the quality score.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BusinessRuleMode {
    Disabled,
    /// Evaluated and reported, never scored.
    #[default]
    Report,
    /// Each violated rule also becomes an issue.
    Score,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct BusinessRuleConfig {
    #[serde(default)]
    pub mode: BusinessRuleMode,
    #[serde(default = "default_rule_severity")]
    pub severity: Severity,
}

impl Default for BusinessRuleConfig {
    fn default() -> Self {
        Self {
            mode: BusinessRuleMode::default(),
            severity: default_rule_severity(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct StepPolicy {
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default)]
    pub delay_seconds: u64,
}

impl Default for StepPolicy {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            delay_seconds: 0,
        }
    }
}

/// Retry policy per pipeline step.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OrchestrationConfig {
    #[serde(default = "default_ingestion_policy")]
    pub ingestion: StepPolicy,
    #[serde(default)]
    pub storage: StepPolicy,
    #[serde(default)]
    pub validation: StepPolicy,
    #[serde(default)]
    pub preparation: StepPolicy,
    #[serde(default)]
    pub transformation: StepPolicy,
    #[serde(default)]
    pub feature_store: StepPolicy,
    #[serde(default)]
    pub versioning: StepPolicy,
    #[serde(default)]
    pub model_building: StepPolicy,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            ingestion: default_ingestion_policy(),
            storage: StepPolicy::default(),
            validation: StepPolicy::default(),
            preparation: StepPolicy::default(),
            transformation: StepPolicy::default(),
            feature_store: StepPolicy::default(),
            versioning: StepPolicy::default(),
            model_building: StepPolicy::default(),
        }
    }
}

impl OrchestrationConfig {
    pub fn policy(&self, step: PipelineStep) -> StepPolicy {
        match step {
            PipelineStep::Ingestion => self.ingestion,
            PipelineStep::Storage => self.storage,
            PipelineStep::Validation => self.validation,
            PipelineStep::Preparation => self.preparation,
            PipelineStep::Transformation => self.transformation,
            PipelineStep::FeatureStore => self.feature_store,
            PipelineStep::Versioning => self.versioning,
            PipelineStep::ModelBuilding => self.model_building,
        }
    }
}

fn default_version() -> String {
    "1.0.0".to_string()
}
fn default_data_root() -> String {
    "data".to_string()
}
fn default_reports_path() -> String {
    "reports".to_string()
}
fn default_clean_targets() -> Vec<String> {
    vec!["data/clean".to_string(), "reports".to_string()]
}
fn default_tables() -> Vec<String> {
    vec!["billing".to_string(), "subscriptions".to_string()]
}
fn default_quality_threshold() -> u32 {
    60
}
fn default_rule_severity() -> Severity {
    Severity::Medium
}
fn default_retries() -> u32 {
    1
}
fn default_ingestion_policy() -> StepPolicy {
    StepPolicy {
        retries: 2,
        delay_seconds: 30,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
name: telecom
source:
  database: data/telecom.db
  crm_csv: data/crm.csv
"#;

    #[test]
    fn test_defaults_from_minimal_yaml() {
        let config: ProjectConfig = serde_yaml::from_str(MINIMAL).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.data_root, "data");
        assert_eq!(config.source.engine, Engine::Sqlite);
        assert_eq!(config.source.tables, vec!["billing", "subscriptions"]);
        assert_eq!(config.validation.quality_threshold, 60);
        assert_eq!(config.validation.business_rules.mode, BusinessRuleMode::Report);
        assert_eq!(config.validation.business_rules.severity, Severity::Medium);

        let ingestion = config.orchestration.policy(PipelineStep::Ingestion);
        assert_eq!((ingestion.retries, ingestion.delay_seconds), (2, 30));
        let training = config.orchestration.policy(PipelineStep::ModelBuilding);
        assert_eq!((training.retries, training.delay_seconds), (1, 0));
    }

    #[test]
    fn test_explicit_sections() {
        let yaml = r#"
name: telecom
data-root: lake
source:
  engine: duckdb
  database: telecom.duckdb
  crm_csv: crm.csv
validation:
  quality_threshold: 75
  business_rules:
    mode: score
    severity: high
orchestration:
  ingestion:
    retries: 0
"#;
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.source.engine, Engine::DuckDB);
        assert_eq!(config.validation.business_rules.mode, BusinessRuleMode::Score);
        assert_eq!(config.validation.business_rules.severity, Severity::High);
        assert_eq!(config.orchestration.ingestion.retries, 0);
        assert_eq!(config.orchestration.ingestion.delay_seconds, 0);
    }

    #[test]
    fn test_invalid_threshold_is_rejected() {
        let yaml = format!("{}validation:\n  quality_threshold: 120\n", MINIMAL);
        let config: ProjectConfig = serde_yaml::from_str(&yaml).unwrap();
        assert!(config.validate().is_err());
    }
}
