#![forbid(unsafe_code)]

//! Runtime engine for PayloadStash: sends the requests of a resolved stash
//! config and writes the run's artifacts.
//!
//! Parsing, validation and resolution live in `stash-core`.

pub mod artifacts;
pub mod confirm;
pub mod executor;
pub mod retry;
pub mod secrets;

pub use crate::confirm::{AutoConfirm, Confirm, StdinConfirm};
pub use crate::executor::{Executor, PreparedRun, RunError, RunSummary, RunnerConfig};
pub use crate::secrets::{load_secrets_file, SecretsFileError};
