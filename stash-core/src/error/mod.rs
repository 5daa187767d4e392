use thiserror::Error;

use crate::dynamics::DynamicError;

#[derive(Debug, Error)]
pub enum StashError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Merge(#[from] MergeError),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error(
        "top-level 'StashConfig' section is missing; found {0:?} at the root. \
         Wrap them as `StashConfig: {{ Name: ..., Defaults: ..., Sequences: [...] }}`"
    )]
    MissingRoot(Vec<String>),
}

#[derive(Debug, Error)]
#[error("stash config failed validation ({violations_len} violations)")]
pub struct ValidationError {
    pub violations: Vec<Violation>,
    violations_len: usize,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        let violations_len = violations.len();
        Self {
            violations,
            violations_len,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration-time failure raised while building the resolved tree.
///
/// Any of these aborts the run before a single HTTP call is made.
#[derive(Debug, Clone, Error)]
pub enum MergeError {
    #[error("{path}: {source}")]
    Dynamic {
        path: String,
        #[source]
        source: DynamicError,
    },
    #[error("{path}: no effective URLRoot")]
    MissingUrlRoot { path: String },
}

impl MergeError {
    pub fn path(&self) -> &str {
        match self {
            Self::Dynamic { path, .. } | Self::MissingUrlRoot { path } => path,
        }
    }
}
