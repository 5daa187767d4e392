use std::time::Duration;

use crate::executor::http::{HttpClient, HttpError, HttpRequestParts, HttpResponseParts};
use crate::executor::ExecError;
use crate::retry::clock::Clock;
use crate::retry::config::RetryConfig;
use crate::retry::decision::{decide_retry, AttemptOutcome, RetryDecision};

/// What a single attempt ended with, kept apart from the trace text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub attempt_no: u32,
    /// `HTTP 503`, or the transport error message.
    pub outcome: String,
}

#[derive(Debug)]
pub struct Executed {
    pub response: HttpResponseParts,
    pub attempts: u32,
    pub history: Vec<AttemptRecord>,
    pub trace: Vec<String>,
}

#[derive(Debug)]
pub struct ExecFailure {
    pub error: ExecError,
    /// HTTP attempts actually sent.
    pub attempts: u32,
    pub history: Vec<AttemptRecord>,
    pub trace: Vec<String>,
}

enum State {
    Attempt(u32),
    Evaluate {
        attempt_no: u32,
        result: Result<HttpResponseParts, HttpError>,
    },
    Backoff {
        next: u32,
        delay: Duration,
    },
    Done {
        response: HttpResponseParts,
        attempts: u32,
    },
    Fail {
        error: ExecError,
        attempts: u32,
    },
}

/// Drives one request through Attempt -> Evaluate -> Backoff -> Attempt until
/// it reaches Done or Fail.
pub struct RetryMachine<'a> {
    pub client: &'a dyn HttpClient,
    pub clock: &'a dyn Clock,
    pub config: &'a RetryConfig,
    pub timeout: Option<Duration>,
    pub max_response_bytes: usize,
    /// Uniform source in `[0, 1)` for jittered backoff.
    pub jitter: &'a (dyn Fn() -> f64 + Send + Sync),
}

impl RetryMachine<'_> {
    /// `build` is called before every attempt with the 1-based attempt number,
    /// so request-time values are recomputed each time.
    pub async fn run<B>(&self, mut build: B) -> Result<Executed, ExecFailure>
    where
        B: FnMut(u32) -> Result<HttpRequestParts, ExecError> + Send,
    {
        let started = self.clock.now();
        let max = self.config.max_attempts;
        let mut trace = Vec::new();
        let mut history = Vec::new();
        let mut state = State::Attempt(1);

        loop {
            state = match state {
                State::Attempt(attempt_no) => match build(attempt_no) {
                    Ok(req) => State::Evaluate {
                        attempt_no,
                        result: self
                            .client
                            .send(req, self.timeout, self.max_response_bytes)
                            .await,
                    },
                    Err(error) => {
                        let outcome = format!("not sent: {error}");
                        trace.push(format!("Attempt {attempt_no}/{max}: {outcome}"));
                        history.push(AttemptRecord {
                            attempt_no,
                            outcome,
                        });
                        State::Fail {
                            error,
                            attempts: attempt_no - 1,
                        }
                    }
                },
                State::Evaluate { attempt_no, result } => {
                    let outcome = match &result {
                        Ok(resp) => AttemptOutcome::Response(resp.status),
                        Err(e) => AttemptOutcome::Error(e),
                    };
                    let elapsed = self.clock.now().saturating_sub(started);
                    let decision =
                        decide_retry(self.config, attempt_no, outcome, elapsed, || (self.jitter)());
                    let summary = match &result {
                        Ok(resp) => format!("HTTP {}", resp.status),
                        Err(e) => e.to_string(),
                    };
                    trace.push(format!("Attempt {attempt_no}/{max}: {summary}"));
                    history.push(AttemptRecord {
                        attempt_no,
                        outcome: summary,
                    });
                    tracing::debug!(attempt_no, ?decision, "retry decision");

                    match (decision, result) {
                        (RetryDecision::RetryAfter { delay, reason }, _) => {
                            trace.push(format!(
                                "Retrying after {:.3}s ({reason})",
                                delay.as_secs_f64()
                            ));
                            State::Backoff {
                                next: attempt_no + 1,
                                delay,
                            }
                        }
                        (RetryDecision::Done, Ok(response)) => State::Done {
                            response,
                            attempts: attempt_no,
                        },
                        (RetryDecision::Stop { reason }, Ok(response)) => {
                            if max > 1 {
                                trace.push(format!("Not retrying: {reason}"));
                            }
                            State::Done {
                                response,
                                attempts: attempt_no,
                            }
                        }
                        (RetryDecision::Stop { reason }, Err(e)) => {
                            if max > 1 {
                                trace.push(format!("Not retrying: {reason}"));
                            }
                            State::Fail {
                                error: ExecError::Http(e),
                                attempts: attempt_no,
                            }
                        }
                        (RetryDecision::Done, Err(e)) => State::Fail {
                            error: ExecError::Http(e),
                            attempts: attempt_no,
                        },
                    }
                }
                State::Backoff { next, delay } => {
                    self.clock.sleep(delay).await;
                    State::Attempt(next)
                }
                State::Done { response, attempts } => {
                    return Ok(Executed {
                        response,
                        attempts,
                        history,
                        trace,
                    });
                }
                State::Fail { error, attempts } => {
                    return Err(ExecFailure {
                        error,
                        attempts,
                        history,
                        trace,
                    });
                }
            };
        }
    }
}
