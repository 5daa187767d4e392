mod clock;
mod config;
mod decision;
mod machine;

pub use clock::{Clock, TokioClock};
pub use config::RetryConfig;
pub(crate) use config::seconds;
pub use decision::{backoff_delay, decide_retry, AttemptOutcome, RetryDecision, RetryReason};
pub use machine::{AttemptRecord, ExecFailure, Executed, RetryMachine};
