//! Placeholder expansion and `$func` / `$timestamp` / `$dynamic` / `$secrets`
//! marker handling.
//!
//! Values are expanded in two passes. The resolve-time pass runs once while
//! the run's configuration is merged and either computes a marker's value
//! immediately or turns it into a [`Deferred`] node. The request-time pass
//! ([`ResolvedValue::resolve_deferred`]) runs right before every HTTP attempt.

mod deferred;
mod error;
mod marker;
mod random;
mod resolver;
mod template;
mod timestamp;

pub use deferred::{Deferred, ResolvedMap, ResolvedValue, DEFERRED_KEY};
pub use error::DynamicError;
pub use marker::{FuncCall, Marker, When};
pub use random::Charset;
pub use resolver::{DynamicCache, ResolveContext};
pub use template::{check, expand, Sets};
pub use timestamp::TimestampFormat;

pub(crate) use deferred::{resolve_map, snapshot_map};
pub(crate) use template::lookup_secret;
