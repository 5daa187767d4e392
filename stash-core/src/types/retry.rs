use std::collections::BTreeSet;

pub const DEFAULT_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_RETRY_ON_STATUS: [u16; 5] = [429, 500, 502, 503, 504];

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    Fixed,
    Exponential,
}

/// `Jitter: true|false` or `Jitter: full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "JitterRepr", into = "JitterRepr")]
pub enum Jitter {
    Enabled(bool),
    Full,
}

impl Jitter {
    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled(true) | Self::Full)
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum JitterRepr {
    Bool(bool),
    Mode(String),
}

impl TryFrom<JitterRepr> for Jitter {
    type Error = String;

    fn try_from(value: JitterRepr) -> Result<Self, Self::Error> {
        match value {
            JitterRepr::Bool(b) => Ok(Self::Enabled(b)),
            JitterRepr::Mode(m) if m.eq_ignore_ascii_case("full") => Ok(Self::Full),
            JitterRepr::Mode(m) => Err(format!(
                "unsupported Jitter {m:?} (expected true, false or \"full\")"
            )),
        }
    }
}

impl From<Jitter> for JitterRepr {
    fn from(value: Jitter) -> Self {
        match value {
            Jitter::Enabled(b) => Self::Bool(b),
            Jitter::Full => Self::Mode("full".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct RetryPolicy {
    pub attempts: u32,

    pub backoff_strategy: BackoffStrategy,

    pub backoff_seconds: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_backoff_seconds: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_elapsed_seconds: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter: Option<Jitter>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_on_status: Option<Vec<u16>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_on_network_errors: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_on_timeouts: Option<bool>,
}

impl RetryPolicy {
    pub fn multiplier(&self) -> f64 {
        self.multiplier.unwrap_or(DEFAULT_MULTIPLIER)
    }

    pub fn jitter_enabled(&self) -> bool {
        self.jitter.is_some_and(Jitter::is_enabled)
    }

    pub fn retry_on_status(&self) -> BTreeSet<u16> {
        match &self.retry_on_status {
            Some(list) if !list.is_empty() => list.iter().copied().collect(),
            _ => DEFAULT_RETRY_ON_STATUS.into_iter().collect(),
        }
    }

    pub fn retry_on_network_errors(&self) -> bool {
        self.retry_on_network_errors.unwrap_or(true)
    }

    pub fn retry_on_timeouts(&self) -> bool {
        self.retry_on_timeouts.unwrap_or(true)
    }
}
