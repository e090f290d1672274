// churnflow-core/src/domain/quality/issue.rs

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Medium,
    High,
}

impl Severity {
    /// Points deducted from the quality score per issue.
    pub fn penalty(&self) -> u32 {
        match self {
            Self::Info => 0,
            Self::Warning => 5,
            Self::Medium => 10,
            Self::High => 15,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingValues,
    IdentifierType,
    NumericAsText,
    Outliers,
    BusinessRule,
}

/// One finding of a validation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub message: String,
}

impl Issue {
    pub fn new(
        kind: IssueKind,
        severity: Severity,
        table: &str,
        column: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            table: table.to_string(),
            column: column.map(str::to_string),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// `max(0, 100 - Σ penalty)`.
pub fn quality_score(issues: &[Issue]) -> u32 {
    let penalty: u32 = issues.iter().map(|i| i.severity.penalty()).sum();
    100u32.saturating_sub(penalty)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityLabel {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl QualityLabel {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => Self::Excellent,
            80..=89 => Self::Good,
            70..=79 => Self::Fair,
            60..=69 => Self::Poor,
            _ => Self::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Fair => "FAIR",
            Self::Poor => "POOR",
            Self::Critical => "CRITICAL",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Data is ready for analysis",
            Self::Good => "Minor issues that should be addressed",
            Self::Fair => "Several issues need attention",
            Self::Poor => "Significant data quality problems",
            Self::Critical => "Major data quality issues require immediate attention",
        }
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.as_str(), self.description())
    }
}
