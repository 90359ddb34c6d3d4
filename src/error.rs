//! Error types for the package transformer.
//!
//! Every error here is a configuration error: it is raised while the rule set
//! is being loaded or compiled and aborts engine construction. Processing a
//! package never fails.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransformError>;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("rule {rule}: both `ruleset` and legacy `family` are present")]
    DuplicateRuleset { rule: usize },

    #[error("rule {rule}: unexpected rule kind for {block} block")]
    UnexpectedRuleKind { rule: usize, block: &'static str },

    #[error("rule {rule}: `addflavor` must be a boolean, a string or a list of strings")]
    InvalidFlavor { rule: usize },

    #[error("rule {rule}: field `{field}` must be {expected}")]
    InvalidField {
        rule: usize,
        field: String,
        expected: &'static str,
    },

    #[error("rule {rule}: unknown field `{field}`")]
    UnknownField { rule: usize, field: String },

    #[error("rule {rule}: invalid regex in `{field}`: {source}")]
    InvalidRegex {
        rule: usize,
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("rule {rule}: `{field}` references ${group} but the pattern defines {available} groups")]
    InvalidPlaceholder {
        rule: usize,
        field: &'static str,
        group: usize,
        available: usize,
    },

    #[error("covering block over rules {first_rule}..={last_rule}: combined name pattern failed to build: {source}")]
    CoveringPattern {
        first_rule: usize,
        last_rule: usize,
        #[source]
        source: regex::Error,
    },

    #[error("rule {rule}: rule record is not a mapping")]
    NotAMapping { rule: usize },

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to render rule source: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransformError {
    /// Number of the rule the error was raised for, if it concerns one rule.
    pub fn rule_number(&self) -> Option<usize> {
        match self {
            TransformError::DuplicateRuleset { rule }
            | TransformError::UnexpectedRuleKind { rule, .. }
            | TransformError::InvalidFlavor { rule }
            | TransformError::InvalidField { rule, .. }
            | TransformError::UnknownField { rule, .. }
            | TransformError::InvalidRegex { rule, .. }
            | TransformError::InvalidPlaceholder { rule, .. }
            | TransformError::NotAMapping { rule } => Some(*rule),
            TransformError::CoveringPattern { .. }
            | TransformError::Yaml(_)
            | TransformError::Json(_)
            | TransformError::Io { .. } => None,
        }
    }
}
