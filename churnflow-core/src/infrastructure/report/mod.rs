// churnflow-core/src/infrastructure/report/mod.rs

// Markdown step reports. Templates are compiled into the binary and filled with
// strings prepared by `application::reporting`.

use crate::application::ports::TemplateEngine;
use crate::error::ChurnflowError;
use crate::infrastructure::error::InfrastructureError;
use minijinja::{Environment, UndefinedBehavior};

const TEMPLATES: [(&str, &str); 4] = [
    ("ingestion_report", include_str!("templates/ingestion_report.md")),
    ("storage_report", include_str!("templates/storage_report.md")),
    ("validation_report", include_str!("templates/validation_report.md")),
    ("preparation_report", include_str!("templates/preparation_report.md")),
];

pub struct JinjaRenderer {
    env: Environment<'static>,
}

impl JinjaRenderer {
    pub fn new() -> Result<Self, InfrastructureError> {
        let mut env = Environment::new();
        // A missing placeholder is a bug in the caller, not an empty string
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);

        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }
}

impl TemplateEngine for JinjaRenderer {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String, ChurnflowError> {
        let tmpl = self
            .env
            .get_template(template)
            .map_err(InfrastructureError::TemplateError)?;
        Ok(tmpl
            .render(context)
            .map_err(InfrastructureError::TemplateError)?)
    }
}
