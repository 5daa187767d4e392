#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DynamicError {
    #[error("${{{name}:N}} requires integer N; got {arg:?}")]
    InvalidCount { name: String, arg: Option<String> },
    #[error("unsupported timestamp format {0:?} (expected epoch_ms, epoch_s or iso_8601)")]
    UnsupportedTimestampFormat(String),
    #[error("${{secrets:KEY}} requires a secret key name")]
    MissingSecretKey,
    #[error("secret '{key}' requested but no secrets were loaded")]
    NoSecrets { key: String },
    #[error("unknown secret requested: '{key}'")]
    UnknownSecret { key: String },
    #[error("${{choice:setName}} requires a set name")]
    MissingSetName,
    #[error("unknown choice set: '{name}'")]
    UnknownSet { name: String },
    #[error("choice set '{name}' is empty")]
    EmptySet { name: String },
    #[error("${{choice:{set}:K}} requires integer K >= 1; got {arg:?}")]
    InvalidChoiceCount { set: String, arg: String },
    #[error("unknown dynamic pattern: '{name}'")]
    UnknownPattern { name: String },
    #[error("unknown $func '{name}'")]
    UnknownFunc { name: String },
    #[error("invalid 'when' value {0:?} (expected resolve or request)")]
    InvalidWhen(String),
    #[error("malformed {marker} marker: {message}")]
    MalformedMarker {
        marker: &'static str,
        message: String,
    },
}

impl DynamicError {
    pub(crate) fn malformed(marker: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedMarker {
            marker,
            message: message.into(),
        }
    }
}
