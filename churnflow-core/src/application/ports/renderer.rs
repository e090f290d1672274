use crate::error::ChurnflowError;

pub trait TemplateEngine: Send + Sync {
    /// Renders the named report template with a JSON context.
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String, ChurnflowError>;
}
