//! On-disk products of a run: the run directory, its log, results table,
//! resolved snapshot and response bodies.

mod csv;
mod recorder;
mod run_dir;

pub use csv::{csv_row, RESULTS_HEADER};
pub use recorder::RunRecorder;
pub use run_dir::{sequence_dir_name, RunDirectory, RUN_DIR_TIMESTAMP};
