mod common;
mod config;
mod retry;
mod sequence;

pub use common::{Field, FlowControl, ResponseFormat, ValueMap};
pub use config::{Defaults, Document, Dynamics, Forced, StashConfig};
pub use retry::{BackoffStrategy, Jitter, RetryPolicy, DEFAULT_MULTIPLIER, DEFAULT_RETRY_ON_STATUS};
pub use sequence::{Method, RequestEntry, RequestSpec, Sequence, SequenceType};
