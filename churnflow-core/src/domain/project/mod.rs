// churnflow-core/src/domain/project/mod.rs

pub mod configuration;
pub use configuration::{
    BusinessRuleConfig, BusinessRuleMode, Engine, OrchestrationConfig, ProjectConfig,
    SourceConfig, StepPolicy, ValidationConfig,
};
