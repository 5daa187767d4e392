use std::time::Duration;

use crate::error::{ValidationError, Violation};
use crate::types::StashConfig;

use super::rules;

#[derive(Default)]
pub struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.violations))
        }
    }

    pub fn validate_config(&mut self, config: &StashConfig) {
        rules::config::validate_config(self, config);
    }

    pub(crate) fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    pub(crate) fn non_negative(&mut self, path: &str, value: Option<f64>) {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                self.push(path, "must be a finite number >= 0");
            } else if Duration::try_from_secs_f64(v).is_err() {
                self.push(path, "is too large to be a duration in seconds");
            }
        }
    }
}
