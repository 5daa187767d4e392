use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use stash_core::{MaterializedRequest, Redactor, ResolvedRequest, SecretMap};

use crate::executor::http::HttpClient;
use crate::executor::request::build_request;
use crate::executor::response::{extension_for, format_body};
use crate::executor::types::RunnerConfig;
use crate::retry::{self, AttemptRecord, Clock, ExecFailure, Executed, RetryConfig, RetryMachine};

/// Status recorded for requests that failed or were not sent.
pub const NO_STATUS: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// An HTTP response was received, whatever its status.
    Responded,
    Failed,
    /// Dry run.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct ResponseBody {
    pub text: String,
    pub extension: String,
}

/// Everything one request produced. Built by a worker, consumed by the
/// run recorder.
#[derive(Debug, Clone)]
pub struct RequestReport {
    /// 0-based sequence position.
    pub sequence: usize,
    /// 1-based position within the sequence.
    pub index: usize,
    pub key: String,
    pub started_at: String,
    pub outcome: RequestOutcome,
    pub status: i32,
    pub duration_ms: u64,
    pub attempts: u32,
    /// One entry per attempt made, not yet redacted.
    pub history: Vec<AttemptRecord>,
    /// Log block, not yet redacted.
    pub lines: Vec<String>,
    pub body: Option<ResponseBody>,
    /// Request block carrying the values of the last materialized attempt.
    pub resolved_block: Option<Value>,
    pub delay_seconds: f64,
}

impl RequestReport {
    pub fn file_stem(&self) -> String {
        format!("req{:03}-{}", self.index, self.key)
    }

    /// Failed stand-in for a request whose worker stopped before reporting.
    pub fn lost(sequence: usize, total: usize, req: &ResolvedRequest) -> Self {
        let index = req.index + 1;
        Self {
            sequence,
            index,
            key: req.key.clone(),
            started_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            outcome: RequestOutcome::Failed,
            status: NO_STATUS,
            duration_ms: 0,
            attempts: 0,
            history: Vec::new(),
            lines: vec![
                format!("  Request {index}/{total}: {}", req.key),
                "    ERROR: Request failed: worker stopped before reporting a result".to_string(),
            ],
            body: None,
            resolved_block: None,
            delay_seconds: req.delay_seconds(),
        }
    }
}

pub struct Worker<'a> {
    pub http: &'a dyn HttpClient,
    pub clock: &'a dyn Clock,
    pub secrets: &'a SecretMap,
    pub redactor: &'a Redactor,
    pub config: &'a RunnerConfig,
    pub jitter: &'a (dyn Fn() -> f64 + Send + Sync),
}

/// YAML rendering of `value`, every line prefixed with `indent`.
pub(crate) fn yaml_lines(value: &impl Serialize, indent: &str) -> Vec<String> {
    match serde_yaml::to_string(value) {
        Ok(text) => text.lines().map(|l| format!("{indent}{l}")).collect(),
        Err(e) => vec![format!("{indent}<unrenderable: {e}>")],
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

pub async fn execute_request(
    worker: &Worker<'_>,
    sequence: usize,
    total: usize,
    req: &ResolvedRequest,
) -> RequestReport {
    let index = req.index + 1;
    let started_at = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let mut lines = vec![format!("  Request {index}/{total}: {}", req.key)];

    let mut report = RequestReport {
        sequence,
        index,
        key: req.key.clone(),
        started_at: started_at.clone(),
        outcome: RequestOutcome::Failed,
        status: NO_STATUS,
        duration_ms: 0,
        attempts: 0,
        history: Vec::new(),
        lines: Vec::new(),
        body: None,
        resolved_block: None,
        delay_seconds: req.delay_seconds(),
    };

    // Request-time values are computed once up front for the log and
    // recomputed by every attempt below.
    let first = req.materialize(worker.secrets);
    let url = match &first {
        Ok(live) => build_request(req, live).map(|p| p.url.to_string()),
        Err(e) => Err(e.clone().into()),
    };
    lines.push(format!("    URL: {}", url.as_deref().unwrap_or("<unresolved>")));
    lines.push(format!("    Start: {started_at}"));
    lines.push("    Resolved Request:".to_string());
    let block = match &first {
        Ok(live) => req.materialized_block(live),
        Err(_) => req.snapshot_block(),
    };
    lines.extend(yaml_lines(&worker.redactor.redact_value(&block), "      "));
    match req.retry_policy() {
        Some(policy) => {
            lines.push("    Resolved Retry:".to_string());
            lines.extend(yaml_lines(policy, "      "));
        }
        None => lines.push("    Resolved Retry: Null".to_string()),
    }

    if worker.config.dry_run {
        lines.push("    DRY-RUN: would make request (skipped)".to_string());
        report.outcome = RequestOutcome::Skipped;
        report.resolved_block = first.ok().map(|live| req.materialized_block(&live));
        report.lines = lines;
        return report;
    }

    let retry = RetryConfig::from_policy(req.retry_policy());
    // Zero and out-of-range timeouts both mean no per-attempt timeout.
    let timeout = req
        .timeout_seconds()
        .filter(|s| *s > 0.0)
        .and_then(retry::seconds);
    let machine = RetryMachine {
        client: worker.http,
        clock: worker.clock,
        config: &retry,
        timeout,
        max_response_bytes: worker.config.max_response_bytes,
        jitter: worker.jitter,
    };

    let mut last: Option<MaterializedRequest> = None;
    let mut first = Some(first);
    let t0 = worker.clock.now();
    let result = machine
        .run(|_attempt_no| {
            let live = match first.take() {
                Some(done) => done?,
                None => req.materialize(worker.secrets)?,
            };
            let parts = build_request(req, &live)?;
            last = Some(live);
            Ok(parts)
        })
        .await;
    report.duration_ms = millis(worker.clock.now().saturating_sub(t0));
    report.resolved_block = last.as_ref().map(|live| req.materialized_block(live));

    match result {
        Ok(Executed {
            response,
            attempts,
            history,
            trace,
        }) => {
            lines.extend(trace.iter().map(|l| format!("    {l}")));
            lines.push(format!("    Response: HTTP {}", response.status));
            lines.push(format!("    Attempts: {attempts}"));
            lines.push("    Response Headers:".to_string());
            let headers = worker.redactor.redact_value(
                &serde_json::to_value(&response.headers).unwrap_or(Value::Null),
            );
            lines.extend(yaml_lines(&headers, "      "));

            let content_type = response.content_type();
            let text = String::from_utf8_lossy(&response.body).into_owned();
            report.body = Some(ResponseBody {
                extension: extension_for(content_type),
                text: format_body(text, content_type, req.response.as_ref()),
            });
            report.outcome = RequestOutcome::Responded;
            report.status = i32::from(response.status);
            report.attempts = attempts;
            report.history = history;
        }
        Err(ExecFailure {
            error,
            attempts,
            history,
            trace,
        }) => {
            lines.extend(trace.iter().map(|l| format!("    {l}")));
            lines.push(format!("    ERROR: Request failed: {error}"));
            report.attempts = attempts;
            report.history = history;
        }
    }

    report.lines = lines;
    report
}
