mod rules;
mod validator;

use crate::error::ValidationError;
use crate::types::{Document, StashConfig};
use validator::Validator;

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for StashConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_config(self)
    }
}

impl Validate for Document {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_config(&self.stash_config)
    }
}

pub fn validate_config(config: &StashConfig) -> Result<(), ValidationError> {
    let mut v = Validator::new();
    v.validate_config(config);
    v.finish()
}
