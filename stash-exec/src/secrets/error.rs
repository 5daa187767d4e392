use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SecretsFileError {
    #[error("secrets file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read secrets file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid secrets line {line}: expected KEY=VALUE")]
    InvalidLine { line: usize },
    #[error("invalid secrets line {line}: empty key")]
    EmptyKey { line: usize },
}
