use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use stash_core::types::StashConfig;
use stash_core::{resolve_config, Redactor, ResolvedConfig, ResolvedSnapshot, SecretMap};

use crate::artifacts::{RunDirectory, RunRecorder};
use crate::confirm::Confirm;
use crate::executor::events::{Event, EventSink};
use crate::executor::http::HttpClient;
use crate::executor::result::{RunError, RunSummary};
use crate::executor::sequence::run_sequence;
use crate::executor::step_runner::{JitterSource, RequestDeps};
use crate::executor::types::RunnerConfig;
use crate::retry::{Clock, TokioClock};

/// A run whose configuration is fully resolved and whose directory and
/// initial snapshot exist on disk. Nothing has been sent yet.
pub struct PreparedRun {
    resolved: ResolvedConfig,
    secrets: Arc<SecretMap>,
    redactor: Arc<Redactor>,
    dir: RunDirectory,
    snapshot: ResolvedSnapshot,
    started: DateTime<Utc>,
}

impl PreparedRun {
    pub fn resolved(&self) -> &ResolvedConfig {
        &self.resolved
    }

    pub fn dir(&self) -> &RunDirectory {
        &self.dir
    }

    pub fn snapshot(&self) -> &ResolvedSnapshot {
        &self.snapshot
    }
}

/// Run orchestrator: resolves a stash config, then drives its sequences in
/// document order.
pub struct Executor {
    config: Arc<RunnerConfig>,
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    event_sink: Arc<dyn EventSink>,
    jitter: JitterSource,
}

impl Executor {
    pub fn new(config: RunnerConfig, http: Arc<dyn HttpClient>, event_sink: Arc<dyn EventSink>) -> Self {
        Self {
            config: Arc::new(config),
            http,
            clock: Arc::new(TokioClock::default()),
            event_sink,
            jitter: Arc::new(fastrand::f64),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_jitter(mut self, jitter: JitterSource) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Resolves `config`, creates `<out>/<Name>/<timestamp>/` and writes the
    /// first redacted snapshot. Every failure here is fatal.
    pub fn prepare(
        &self,
        config: &StashConfig,
        secrets: SecretMap,
        out: &Path,
        stem: &str,
    ) -> Result<PreparedRun, RunError> {
        let resolved = resolve_config(config, &secrets, false)?;
        let redactor = Arc::new(secrets.redactor());
        let started = Utc::now();
        let dir = RunDirectory::new(out, &resolved.name, stem, started);
        dir.create().map_err(|source| RunError::CreateRunDir {
            path: dir.root().to_path_buf(),
            source,
        })?;

        let snapshot = ResolvedSnapshot::new(&resolved);
        let yaml = snapshot.to_yaml(&redactor)?;
        dir.write_resolved(&yaml)
            .map_err(|source| RunError::WriteSnapshot {
                path: dir.resolved_path().to_path_buf(),
                source,
            })?;

        Ok(PreparedRun {
            resolved,
            secrets: Arc::new(secrets),
            redactor,
            dir,
            snapshot,
            started,
        })
    }

    /// Asks `confirm` once; `None` means the run was declined.
    pub async fn run(&self, prepared: PreparedRun, confirm: &dyn Confirm) -> Option<RunSummary> {
        if !confirm.confirm(" Continue? [y/N]: ") {
            tracing::info!(name = %prepared.resolved.name, "run declined");
            return None;
        }
        Some(self.execute(prepared).await)
    }

    pub async fn execute(&self, prepared: PreparedRun) -> RunSummary {
        let PreparedRun {
            resolved,
            secrets,
            redactor,
            dir,
            snapshot,
            started,
        } = prepared;
        let t0 = self.clock.now();

        self.event_sink
            .emit(Event::RunStarted {
                name: resolved.name.clone(),
                run_dir: dir.root().to_path_buf(),
                sequences: resolved.sequences.len(),
                requests: resolved.total_requests(),
                dry_run: self.config.dry_run,
            })
            .await;

        let mut recorder = RunRecorder::new(dir, Arc::clone(&redactor), snapshot);
        recorder.start(&started.format("%Y-%m-%dT%H-%M-%SZ").to_string(), &resolved.name);

        let deps = RequestDeps {
            http: Arc::clone(&self.http),
            clock: Arc::clone(&self.clock),
            secrets,
            redactor,
            config: Arc::clone(&self.config),
            jitter: Arc::clone(&self.jitter),
            event_sink: Arc::clone(&self.event_sink),
        };

        let total = resolved.sequences.len();
        let mut sequences = Vec::with_capacity(total);
        for (position, seq) in resolved.sequences.iter().enumerate() {
            let mut line = format!(
                "Processing sequence {}/{total}: {} (Type={}",
                position + 1,
                seq.name,
                seq.kind.as_str()
            );
            if let Some(limit) = seq.concurrency_limit {
                line.push_str(&format!(", ConcurrencyLimit={limit}"));
            }
            line.push(')');
            recorder.log(&line);
            sequences.push(run_sequence(seq, position, total, &deps, &mut recorder).await);
        }
        recorder.finish();

        let run_dir = recorder.dir().root().to_path_buf();
        let summary = RunSummary {
            name: resolved.name.clone(),
            run_dir,
            dry_run: self.config.dry_run,
            sequences,
            warnings: recorder.into_warnings(),
            duration_ms: u64::try_from(self.clock.now().saturating_sub(t0).as_millis())
                .unwrap_or(u64::MAX),
        };
        self.event_sink
            .emit(Event::RunFinished {
                name: summary.name.clone(),
                succeeded: summary.succeeded(),
                failed: summary.failed(),
                duration_ms: summary.duration_ms,
            })
            .await;
        summary
    }
}
