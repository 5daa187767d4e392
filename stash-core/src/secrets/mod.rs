mod redact;
mod value;

pub use redact::{Redactor, REDACTED};
pub use value::{SecretMap, SecretValue};
