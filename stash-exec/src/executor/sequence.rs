use std::collections::BTreeMap;
use std::time::Duration;

use stash_core::types::SequenceType;
use stash_core::ResolvedSequence;
use tokio::sync::mpsc;

use crate::artifacts::RunRecorder;
use crate::executor::concurrency::WorkerLimit;
use crate::executor::events::Event;
use crate::executor::result::SequenceSummary;
use crate::executor::step_runner::{run_request, RequestContext, RequestDeps};
use crate::executor::worker::{RequestOutcome, RequestReport};
use crate::retry;

/// Seconds as written in the run log: `2`, `0.5`.
pub(crate) fn fmt_seconds(seconds: f64) -> String {
    if seconds.fract() == 0.0 && seconds.abs() < 1e15 {
        format!("{}", seconds as i64)
    } else {
        format!("{seconds}")
    }
}

/// Delay to sleep after a request. Values no `Duration` can hold are skipped.
fn pause(secs: f64) -> Option<Duration> {
    if secs.is_nan() || secs <= 0.0 {
        return None;
    }
    let delay = retry::seconds(secs);
    if delay.is_none() {
        tracing::warn!(delay_seconds = secs, "delay out of range, not sleeping");
    }
    delay
}

fn tally(summary: &mut SequenceSummary, report: &RequestReport) {
    match report.outcome {
        RequestOutcome::Responded => summary.succeeded += 1,
        RequestOutcome::Failed => summary.failed += 1,
        RequestOutcome::Skipped => summary.skipped += 1,
    }
}

fn context(seq: &ResolvedSequence, position: usize, index: usize) -> RequestContext {
    RequestContext {
        sequence: position,
        sequence_name: seq.name.clone(),
        total: seq.requests.len(),
        request: seq.requests[index].clone(),
    }
}

/// Runs one sequence and records every request through `recorder` in
/// document order. `position` is the 0-based sequence index.
pub async fn run_sequence(
    seq: &ResolvedSequence,
    position: usize,
    total_sequences: usize,
    deps: &RequestDeps,
    recorder: &mut RunRecorder,
) -> SequenceSummary {
    let workers = match seq.kind {
        SequenceType::Sequential => 1,
        SequenceType::Concurrent => seq.workers(),
    };
    deps.event_sink
        .emit(Event::SequenceStarted {
            index: position + 1,
            total: total_sequences,
            name: seq.name.clone(),
            kind: seq.kind.as_str(),
            workers,
        })
        .await;
    recorder.begin_sequence(position, &seq.name);

    let mut summary = SequenceSummary {
        name: seq.name.clone(),
        succeeded: 0,
        failed: 0,
        skipped: 0,
    };
    match seq.kind {
        SequenceType::Sequential => run_sequential(seq, position, deps, recorder, &mut summary).await,
        SequenceType::Concurrent => {
            recorder.log(&format!("  Using concurrency: workers={workers}"));
            run_concurrent(seq, position, workers, deps, recorder, &mut summary).await
        }
    }

    deps.event_sink
        .emit(Event::SequenceFinished {
            index: position + 1,
            name: seq.name.clone(),
            succeeded: summary.succeeded,
            failed: summary.failed,
        })
        .await;
    summary
}

async fn run_sequential(
    seq: &ResolvedSequence,
    position: usize,
    deps: &RequestDeps,
    recorder: &mut RunRecorder,
    summary: &mut SequenceSummary,
) {
    for index in 0..seq.requests.len() {
        let report = run_request(context(seq, position, index), deps.clone()).await;
        tally(summary, &report);
        let delay = report.delay_seconds;
        recorder.record(report);
        recorder.log(&format!("    Delay {} s", fmt_seconds(delay)));
        if let Some(d) = pause(delay) {
            deps.clock.sleep(d).await;
        }
    }
}

async fn run_concurrent(
    seq: &ResolvedSequence,
    position: usize,
    workers: usize,
    deps: &RequestDeps,
    recorder: &mut RunRecorder,
    summary: &mut SequenceSummary,
) {
    let limit = WorkerLimit::new(workers);
    let (tx, mut rx) = mpsc::unbounded_channel::<RequestReport>();
    let delay_after = deps.config.concurrent_delay;

    for index in 0..seq.requests.len() {
        let ctx = context(seq, position, index);
        let deps = deps.clone();
        let limit = limit.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let permit = limit.acquire().await;
            let clock = deps.clock.clone();
            let report = run_request(ctx, deps).await;
            let delay = report.delay_seconds;
            // The receiver outlives every worker unless the run itself is gone.
            let _ = tx.send(report);
            if delay_after {
                if let Some(d) = pause(delay) {
                    clock.sleep(d).await;
                }
            }
            drop(permit);
        });
    }
    drop(tx);

    // Completion order is arbitrary; flush strictly by index.
    let mut buffered: BTreeMap<usize, RequestReport> = BTreeMap::new();
    let mut next = 1;
    while let Some(report) = rx.recv().await {
        buffered.insert(report.index, report);
        while let Some(report) = buffered.remove(&next) {
            flush(report, delay_after, recorder, summary);
            next += 1;
        }
    }

    // Gaps are left only by workers that panicked; each still gets its row.
    let total = seq.requests.len();
    for index in next..=total {
        let report = match buffered.remove(&index) {
            Some(report) => report,
            None => {
                tracing::error!(sequence = %seq.name, index, "request produced no result");
                RequestReport::lost(position, total, &seq.requests[index - 1])
            }
        };
        flush(report, delay_after, recorder, summary);
    }
}

fn flush(
    report: RequestReport,
    delay_after: bool,
    recorder: &mut RunRecorder,
    summary: &mut SequenceSummary,
) {
    tally(summary, &report);
    let delay = report.delay_seconds;
    recorder.record(report);
    if delay_after {
        recorder.log(&format!("    Delay {} s", fmt_seconds(delay)));
    }
}
