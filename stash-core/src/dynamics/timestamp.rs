use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::DynamicError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampFormat {
    EpochMs,
    EpochS,
    #[default]
    Iso8601,
}

impl TimestampFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EpochMs => "epoch_ms",
            Self::EpochS => "epoch_s",
            Self::Iso8601 => "iso_8601",
        }
    }

    /// Epoch formats render as integers, ISO 8601 as a second-precision UTC string.
    pub fn render(self, now: DateTime<Utc>) -> Value {
        match self {
            Self::EpochMs => Value::from(now.timestamp_millis()),
            Self::EpochS => Value::from(now.timestamp()),
            Self::Iso8601 => Value::String(now.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        }
    }

    pub fn render_string(self, now: DateTime<Utc>) -> String {
        match self.render(now) {
            Value::String(s) => s,
            other => other.to_string(),
        }
    }

    pub fn now(self) -> Value {
        self.render(Utc::now())
    }
}

impl FromStr for TimestampFormat {
    type Err = DynamicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "epoch_ms" => Ok(Self::EpochMs),
            "epoch_s" => Ok(Self::EpochS),
            "iso_8601" => Ok(Self::Iso8601),
            other => Err(DynamicError::UnsupportedTimestampFormat(other.to_string())),
        }
    }
}
