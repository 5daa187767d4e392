use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use stash_exec::executor::{CompositeEventSink, EventSink, ReqwestHttpClient, StdoutEventSink};
use stash_exec::{AutoConfirm, Confirm, Executor, RunError, RunSummary, RunnerConfig, StdinConfirm};

use super::config::{config_stem, load_config, load_secrets};
use super::progress::ProgressEventSink;
use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::{OutputArgs, SecretsArgs};

pub struct RunFlags {
    pub dry_run: bool,
    pub yes: bool,
    pub concurrent_delay: bool,
}

#[derive(Serialize)]
struct RunResult {
    name: String,
    run_dir: String,
    dry_run: bool,
    requests: usize,
    succeeded: usize,
    failed: usize,
    skipped: usize,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

impl From<&RunSummary> for RunResult {
    fn from(s: &RunSummary) -> Self {
        Self {
            name: s.name.clone(),
            run_dir: s.run_dir.display().to_string(),
            dry_run: s.dry_run,
            requests: s.requests(),
            succeeded: s.succeeded(),
            failed: s.failed(),
            skipped: s.skipped(),
            duration_ms: s.duration_ms,
            warnings: s.warnings.clone(),
        }
    }
}

fn event_sink(output: &OutputArgs) -> Arc<dyn EventSink> {
    let mut sink = CompositeEventSink::new();
    match output.format {
        OutputFormat::Json if !output.quiet => sink.add(Arc::new(StdoutEventSink)),
        OutputFormat::Text if !output.quiet => sink.add(Arc::new(ProgressEventSink)),
        _ => {}
    }
    Arc::new(sink)
}

pub async fn run_cmd(
    path: &Path,
    out: &Path,
    flags: RunFlags,
    secrets: SecretsArgs,
    output: OutputArgs,
) -> i32 {
    let config = match load_config(path, &output) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let secrets = match load_secrets(&secrets, &output) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let runner = RunnerConfig {
        dry_run: flags.dry_run,
        concurrent_delay: flags.concurrent_delay,
        ..RunnerConfig::default()
    };
    let http = match ReqwestHttpClient::new(&runner) {
        Ok(c) => c,
        Err(e) => {
            let err = RunError::Client(e);
            print_error(output.format, output.quiet, &err.to_string());
            return exit_codes::RUNTIME_ERROR;
        }
    };
    let executor = Executor::new(runner, Arc::new(http), event_sink(&output));

    let prepared = match executor.prepare(&config, secrets, out, &config_stem(path)) {
        Ok(p) => p,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return match e {
                RunError::Config(_) => exit_codes::VALIDATION_FAILED,
                _ => exit_codes::RUNTIME_ERROR,
            };
        }
    };

    let text = output.format == OutputFormat::Text && !output.quiet;
    if text {
        let resolved = prepared.resolved();
        let dir = prepared.dir();
        println!("PayloadStash run summary:");
        println!("  Name:            {}", resolved.name);
        println!("  Sequences:       {}", resolved.sequences.len());
        println!("  Total Requests:  {}", resolved.total_requests());
        println!("  Output folder:   {}", dir.root().display());
        println!("  Resolved config: {}", dir.resolved_path().display());
        println!("  Log file:        {}", dir.log_path().display());
        if flags.dry_run {
            println!("  Mode:            DRY-RUN (no HTTP calls)");
        }
    }

    let confirm: Box<dyn Confirm> = if flags.yes {
        if text {
            println!("Auto-continue (--yes supplied).");
        }
        Box::new(AutoConfirm)
    } else {
        Box::new(StdinConfirm)
    };

    let Some(summary) = executor.run(prepared, confirm.as_ref()).await else {
        if !output.quiet {
            println!("\nOperation Cancelled");
        }
        return exit_codes::SUCCESS;
    };

    let result = RunResult::from(&summary);
    if text {
        for w in &result.warnings {
            eprintln!("warning: {w}");
        }
        println!(
            "Run finished: {} succeeded, {} failed, {} skipped ({} ms)",
            result.succeeded, result.failed, result.skipped, result.duration_ms
        );
        println!("Artifacts: {}", result.run_dir);
    } else {
        print_result(output.format, output.quiet, &result);
    }

    if summary.failed() > 0 {
        exit_codes::RUN_FAILED
    } else {
        exit_codes::SUCCESS
    }
}
