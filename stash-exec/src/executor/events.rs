use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

#[derive(Debug, Clone)]
pub enum Event {
    RunStarted {
        name: String,
        run_dir: PathBuf,
        sequences: usize,
        requests: usize,
        dry_run: bool,
    },
    RunFinished {
        name: String,
        succeeded: usize,
        failed: usize,
        duration_ms: u64,
    },
    SequenceStarted {
        index: usize,
        total: usize,
        name: String,
        kind: &'static str,
        workers: usize,
    },
    SequenceFinished {
        index: usize,
        name: String,
        succeeded: usize,
        failed: usize,
    },
    RequestStarted {
        sequence: String,
        index: usize,
        total: usize,
        key: String,
    },
    AttemptFinished {
        sequence: String,
        key: String,
        attempt_no: u32,
        outcome: String,
    },
    RequestFinished {
        sequence: String,
        key: String,
        status: i32,
        attempts: u32,
        duration_ms: u64,
    },
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: Event);
}

pub struct CompositeEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl Default for CompositeEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }
}

#[async_trait]
impl EventSink for CompositeEventSink {
    async fn emit(&self, event: Event) {
        for sink in &self.sinks {
            sink.emit(event.clone()).await;
        }
    }
}

/// One JSON object per line on stdout.
pub struct StdoutEventSink;

#[async_trait]
impl EventSink for StdoutEventSink {
    async fn emit(&self, event: Event) {
        let json = match event {
            Event::RunStarted {
                name,
                run_dir,
                sequences,
                requests,
                dry_run,
            } => json!({
                "type": "run.started",
                "name": name,
                "run_dir": run_dir.display().to_string(),
                "sequences": sequences,
                "requests": requests,
                "dry_run": dry_run
            }),
            Event::RunFinished {
                name,
                succeeded,
                failed,
                duration_ms,
            } => json!({
                "type": "run.finished",
                "name": name,
                "succeeded": succeeded,
                "failed": failed,
                "duration_ms": duration_ms
            }),
            Event::SequenceStarted {
                index,
                total,
                name,
                kind,
                workers,
            } => json!({
                "type": "sequence.started",
                "index": index,
                "total": total,
                "name": name,
                "kind": kind,
                "workers": workers
            }),
            Event::SequenceFinished {
                index,
                name,
                succeeded,
                failed,
            } => json!({
                "type": "sequence.finished",
                "index": index,
                "name": name,
                "succeeded": succeeded,
                "failed": failed
            }),
            Event::RequestStarted {
                sequence,
                index,
                total,
                key,
            } => json!({
                "type": "request.started",
                "sequence": sequence,
                "index": index,
                "total": total,
                "key": key
            }),
            Event::AttemptFinished {
                sequence,
                key,
                attempt_no,
                outcome,
            } => json!({
                "type": "attempt.finished",
                "sequence": sequence,
                "key": key,
                "attempt_no": attempt_no,
                "outcome": outcome
            }),
            Event::RequestFinished {
                sequence,
                key,
                status,
                attempts,
                duration_ms,
            } => json!({
                "type": "request.finished",
                "sequence": sequence,
                "key": key,
                "status": status,
                "attempts": attempts,
                "duration_ms": duration_ms
            }),
        };
        println!("{}", serde_json::to_string(&json).unwrap_or_default());
    }
}

pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: Event) {}
}
