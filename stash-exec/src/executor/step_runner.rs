use std::sync::Arc;

use stash_core::{Redactor, ResolvedRequest, SecretMap};

use crate::executor::events::{Event, EventSink};
use crate::executor::http::HttpClient;
use crate::executor::types::RunnerConfig;
use crate::executor::worker::{execute_request, RequestReport, Worker};
use crate::retry::Clock;

pub type JitterSource = Arc<dyn Fn() -> f64 + Send + Sync>;

pub struct RequestContext {
    /// 0-based sequence position.
    pub sequence: usize,
    pub sequence_name: String,
    /// Number of requests in the sequence.
    pub total: usize,
    pub request: ResolvedRequest,
}

/// Shared handles every request runs against.
#[derive(Clone)]
pub struct RequestDeps {
    pub http: Arc<dyn HttpClient>,
    pub clock: Arc<dyn Clock>,
    pub secrets: Arc<SecretMap>,
    pub redactor: Arc<Redactor>,
    pub config: Arc<RunnerConfig>,
    pub jitter: JitterSource,
    pub event_sink: Arc<dyn EventSink>,
}

pub async fn run_request(ctx: RequestContext, deps: RequestDeps) -> RequestReport {
    deps.event_sink
        .emit(Event::RequestStarted {
            sequence: ctx.sequence_name.clone(),
            index: ctx.request.index + 1,
            total: ctx.total,
            key: ctx.request.key.clone(),
        })
        .await;

    let worker = Worker {
        http: deps.http.as_ref(),
        clock: deps.clock.as_ref(),
        secrets: deps.secrets.as_ref(),
        redactor: deps.redactor.as_ref(),
        config: deps.config.as_ref(),
        jitter: deps.jitter.as_ref(),
    };
    let report = execute_request(&worker, ctx.sequence, ctx.total, &ctx.request).await;

    emit_attempts(&deps, &ctx.sequence_name, &report).await;
    deps.event_sink
        .emit(Event::RequestFinished {
            sequence: ctx.sequence_name,
            key: report.key.clone(),
            status: report.status,
            attempts: report.attempts,
            duration_ms: report.duration_ms,
        })
        .await;
    report
}

/// One `AttemptFinished` per attempt made. Outcomes may quote the request
/// URL, so they are redacted like the run log.
async fn emit_attempts(deps: &RequestDeps, sequence: &str, report: &RequestReport) {
    for record in &report.history {
        deps.event_sink
            .emit(Event::AttemptFinished {
                sequence: sequence.to_string(),
                key: report.key.clone(),
                attempt_no: record.attempt_no,
                outcome: deps.redactor.redact(&record.outcome).into_owned(),
            })
            .await;
    }
}
