use std::path::PathBuf;

use stash_core::{DynamicError, MergeError};

use crate::executor::http::HttpError;

/// Failure of a single request. Never aborts sibling requests.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecError {
    #[error("failed to resolve request-time values: {0}")]
    Resolve(#[from] DynamicError),
    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
    #[error(transparent)]
    Http(#[from] HttpError),
}

/// Failure that stops the whole run before any request is sent.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(#[from] MergeError),
    #[error("failed to create output directory '{path}': {source}")]
    CreateRunDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write resolved config '{path}': {source}")]
    WriteSnapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render resolved config: {0}")]
    RenderSnapshot(#[from] serde_yaml::Error),
    #[error("failed to create HTTP client: {0}")]
    Client(HttpError),
}

#[derive(Debug, Clone, Default)]
pub struct SequenceSummary {
    pub name: String,
    pub succeeded: usize,
    pub failed: usize,
    /// Requests logged but not sent (dry run).
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub name: String,
    pub run_dir: PathBuf,
    pub dry_run: bool,
    pub sequences: Vec<SequenceSummary>,
    pub warnings: Vec<String>,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.sequences.iter().map(|s| s.succeeded).sum()
    }

    pub fn failed(&self) -> usize {
        self.sequences.iter().map(|s| s.failed).sum()
    }

    pub fn skipped(&self) -> usize {
        self.sequences.iter().map(|s| s.skipped).sum()
    }

    pub fn requests(&self) -> usize {
        self.succeeded() + self.failed() + self.skipped()
    }
}
