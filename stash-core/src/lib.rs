#![forbid(unsafe_code)]

pub mod dynamics;
pub mod error;
pub mod merge;
pub mod parser;
pub mod secrets;
pub mod types;
pub mod validate;

pub use crate::dynamics::{DynamicError, ResolvedValue};
pub use crate::error::{MergeError, ParseError, StashError, ValidationError, Violation};
pub use crate::merge::{
    resolve_config, MaterializedRequest, ResolvedConfig, ResolvedRequest, ResolvedSequence,
    ResolvedSnapshot,
};
pub use crate::parser::{parse_document_str, DocumentFormat, ParsedDocument};
pub use crate::secrets::{Redactor, SecretMap, REDACTED};
pub use crate::types::{Document, StashConfig};
pub use crate::validate::{validate_config, Validate};
