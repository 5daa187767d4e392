use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::csv::{csv_row, RESULTS_HEADER};

/// Folder name format of a run: `2025-09-17T19-35-00Z`.
pub const RUN_DIR_TIMESTAMP: &str = "%Y-%m-%dT%H-%M-%SZ";

/// `seqNNN-<name>` with a 1-based index.
pub fn sequence_dir_name(index: usize, name: &str) -> String {
    format!("seq{index:03}-{name}")
}

/// Paths of one run: `<out>/<Name>/<timestamp>/` and the files inside it.
#[derive(Debug, Clone)]
pub struct RunDirectory {
    root: PathBuf,
    resolved: PathBuf,
    log: PathBuf,
    results: PathBuf,
}

impl RunDirectory {
    /// `stem` is the config file name without extension.
    pub fn new(out: &Path, name: &str, stem: &str, started: DateTime<Utc>) -> Self {
        let root = out
            .join(name)
            .join(started.format(RUN_DIR_TIMESTAMP).to_string());
        Self {
            resolved: root.join(format!("{stem}-resolved.yml")),
            log: root.join(format!("{stem}-run.log")),
            results: root.join(format!("{stem}-results.csv")),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolved_path(&self) -> &Path {
        &self.resolved
    }

    pub fn log_path(&self) -> &Path {
        &self.log
    }

    pub fn results_path(&self) -> &Path {
        &self.results
    }

    pub fn create(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    pub fn sequence_dir(&self, index: usize, name: &str) -> PathBuf {
        self.root.join(sequence_dir_name(index, name))
    }

    pub fn write_resolved(&self, yaml: &str) -> io::Result<()> {
        fs::write(&self.resolved, yaml)
    }

    /// Appends `text` to the run log, adding a newline if missing.
    pub fn append_log(&self, text: &str) -> io::Result<()> {
        let mut f = OpenOptions::new().create(true).append(true).open(&self.log)?;
        f.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            f.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Truncates the results table down to its header row.
    pub fn init_results(&self) -> io::Result<()> {
        fs::write(&self.results, csv_row(&RESULTS_HEADER))
    }

    pub fn append_result<S: AsRef<str>>(&self, fields: &[S]) -> io::Result<()> {
        let mut f = OpenOptions::new().create(true).append(true).open(&self.results)?;
        f.write_all(csv_row(fields).as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn layout_follows_name_and_timestamp() {
        let ts = Utc.with_ymd_and_hms(2025, 9, 17, 19, 35, 0).unwrap();
        let dir = RunDirectory::new(Path::new("/out"), "Demo", "demo", ts);
        assert_eq!(dir.root(), Path::new("/out/Demo/2025-09-17T19-35-00Z"));
        assert_eq!(
            dir.resolved_path(),
            Path::new("/out/Demo/2025-09-17T19-35-00Z/demo-resolved.yml")
        );
        assert_eq!(
            dir.sequence_dir(3, "Users"),
            Path::new("/out/Demo/2025-09-17T19-35-00Z/seq003-Users")
        );
    }
}
