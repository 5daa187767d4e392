use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use stash_core::{Redactor, ResolvedSnapshot};

use super::run_dir::{sequence_dir_name, RunDirectory};
use crate::executor::worker::RequestReport;

/// Single writer for every artifact of a run.
///
/// Reports arrive already ordered; nothing here is shared across tasks.
/// I/O failures never abort the run. They are logged where possible and
/// collected as warnings.
pub struct RunRecorder {
    dir: RunDirectory,
    redactor: Arc<Redactor>,
    snapshot: ResolvedSnapshot,
    sequence_dirs: HashMap<usize, String>,
    warnings: Vec<String>,
}

impl RunRecorder {
    pub fn new(dir: RunDirectory, redactor: Arc<Redactor>, snapshot: ResolvedSnapshot) -> Self {
        Self {
            dir,
            redactor,
            snapshot,
            sequence_dirs: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn dir(&self) -> &RunDirectory {
        &self.dir
    }

    pub fn snapshot(&self) -> &ResolvedSnapshot {
        &self.snapshot
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }

    fn warn(&mut self, message: String) {
        tracing::warn!(%message, "artifact write failed");
        self.warnings.push(message);
    }

    /// Writes `text` to the run log with secrets redacted.
    pub fn log(&mut self, text: &str) {
        let redacted = self.redactor.redact(text);
        if let Err(e) = self.dir.append_log(&redacted) {
            self.warn(format!("failed to write run log '{}': {e}", self.dir.log_path().display()));
        }
    }

    /// Run log header and an empty results table.
    pub fn start(&mut self, started_at: &str, name: &str) {
        self.log(&format!("=== PayloadStash run started at {started_at} UTC ==="));
        self.log(&format!("Name: {name}"));
        let resolved = self.dir.resolved_path().display().to_string();
        self.log(&format!("Resolved config: {resolved}"));
        self.log("--- Sequences ---");
        if let Err(e) = self.dir.init_results() {
            let path = self.dir.results_path().display().to_string();
            self.log(&format!("Warning: failed to initialize results CSV '{path}': {e}"));
            self.warn(format!("failed to initialize results CSV '{path}': {e}"));
        }
    }

    pub fn finish(&mut self) {
        self.log("=== PayloadStash run finished ===");
    }

    /// Creates `seqNNN-<name>/`. `index` is 0-based.
    pub fn begin_sequence(&mut self, index: usize, name: &str) {
        self.sequence_dirs
            .insert(index, sequence_dir_name(index + 1, name));
        let path = self.dir.sequence_dir(index + 1, name);
        if let Err(e) = fs::create_dir_all(&path) {
            let path = path.display().to_string();
            self.log(&format!("  Warning: failed to create sequence directory '{path}': {e}"));
            self.warn(format!("failed to create sequence directory '{path}': {e}"));
        }
    }

    fn sequence_dir_name(&self, index: usize) -> String {
        self.sequence_dirs
            .get(&index)
            .cloned()
            .unwrap_or_else(|| format!("seq{:03}", index + 1))
    }

    /// Persists one finished request: body file, log block, results row and
    /// the updated resolved snapshot.
    pub fn record(&mut self, report: RequestReport) {
        let seq_dir = self.sequence_dir_name(report.sequence);
        let mut lines = report.lines.clone();

        if let Some(body) = &report.body {
            let path = self
                .dir
                .root()
                .join(&seq_dir)
                .join(format!("{}-response.{}", report.file_stem(), body.extension));
            match fs::write(&path, body.text.as_bytes()) {
                Ok(()) => lines.push(format!("    Response Body: written to {}", path.display())),
                Err(e) => {
                    lines.push(format!("    Warning: failed to write response body file: {e}"));
                    self.warn(format!("failed to write '{}': {e}", path.display()));
                }
            }
        }
        self.log(&lines.join("\n"));

        let row = [
            seq_dir,
            report.file_stem(),
            report.started_at.clone(),
            report.status.to_string(),
            report.duration_ms.to_string(),
            report.attempts.to_string(),
        ];
        if let Err(e) = self.dir.append_result(&row) {
            self.log(&format!("Warning: failed to append to results CSV: {e}"));
            self.warn(format!("failed to append to results CSV: {e}"));
        }

        if let Some(block) = report.resolved_block {
            self.snapshot
                .set_request_block(report.sequence, report.index - 1, block);
            if let Err(e) = self.write_snapshot() {
                let key = report.key;
                self.log(&format!("  Warning: failed to update resolved file after {key}: {e}"));
                self.warn(format!("failed to update resolved file after {key}: {e}"));
            }
        }
    }

    /// Rewrites `<stem>-resolved.yml` from the current snapshot, redacted.
    pub fn write_snapshot(&self) -> std::io::Result<()> {
        let yaml = self
            .snapshot
            .to_yaml(&self.redactor)
            .map_err(std::io::Error::other)?;
        self.dir.write_resolved(&yaml)
    }
}
