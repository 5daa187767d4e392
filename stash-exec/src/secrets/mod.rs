mod error;
mod file;

pub use error::SecretsFileError;
pub use file::{load_secrets_file, parse_secrets_str};
