use std::fmt;
use std::time::Duration;

use stash_core::types::BackoffStrategy;

use crate::executor::http::HttpError;
use crate::retry::config::{seconds, RetryConfig};

#[derive(Debug, Clone, Copy)]
pub enum AttemptOutcome<'a> {
    Response(u16),
    Error(&'a HttpError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// The response is final.
    Done,
    RetryAfter { delay: Duration, reason: RetryReason },
    Stop { reason: RetryReason },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    HttpStatus(u16),
    Timeout,
    NetworkFailure,
    NotRetryable,
    AttemptsExhausted,
    ElapsedBudget,
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpStatus(s) => write!(f, "HTTP {s}"),
            Self::Timeout => f.write_str("timeout"),
            Self::NetworkFailure => f.write_str("network error"),
            Self::NotRetryable => f.write_str("not retryable"),
            Self::AttemptsExhausted => f.write_str("attempts exhausted"),
            Self::ElapsedBudget => f.write_str("max elapsed time reached"),
        }
    }
}

/// Delay before retry `retry_index` (1-based: 1 is the wait before the 2nd attempt).
///
/// `rand_unit` must return a value in `[0, 1)`; it is only called when jitter is on.
pub fn backoff_delay(cfg: &RetryConfig, retry_index: u32, rand_unit: impl FnOnce() -> f64) -> Duration {
    let mut secs = match cfg.strategy {
        BackoffStrategy::Fixed => cfg.base_seconds,
        BackoffStrategy::Exponential => {
            let exp = i32::try_from(retry_index.saturating_sub(1)).unwrap_or(i32::MAX);
            cfg.base_seconds * cfg.multiplier.powi(exp)
        }
    };
    if let Some(cap) = cfg.max_backoff_seconds {
        secs = secs.min(cap);
    }
    if cfg.jitter {
        secs *= rand_unit().clamp(0.0, 1.0);
    }
    // An uncapped exponential can overflow to infinity; treat that as the longest wait.
    seconds(secs).unwrap_or(Duration::MAX)
}

/// Decide what follows attempt `attempt_no` (1-based).
///
/// - `elapsed`: time since the first attempt started.
/// - `rand_unit`: jitter source in `[0, 1)`.
pub fn decide_retry(
    cfg: &RetryConfig,
    attempt_no: u32,
    outcome: AttemptOutcome<'_>,
    elapsed: Duration,
    rand_unit: impl FnOnce() -> f64,
) -> RetryDecision {
    let reason = match outcome {
        AttemptOutcome::Response(status) if !cfg.retry_statuses.contains(&status) => {
            return RetryDecision::Done;
        }
        AttemptOutcome::Response(status) => RetryReason::HttpStatus(status),
        AttemptOutcome::Error(HttpError::Timeout) if cfg.retry_on_timeouts => RetryReason::Timeout,
        AttemptOutcome::Error(HttpError::Network(_)) if cfg.retry_on_network_errors => {
            RetryReason::NetworkFailure
        }
        AttemptOutcome::Error(_) => {
            return RetryDecision::Stop {
                reason: RetryReason::NotRetryable,
            };
        }
    };

    if attempt_no >= cfg.max_attempts {
        return RetryDecision::Stop {
            reason: RetryReason::AttemptsExhausted,
        };
    }

    let delay = backoff_delay(cfg, attempt_no, rand_unit);
    if let Some(budget) = cfg.max_elapsed {
        if elapsed.saturating_add(delay) > budget {
            return RetryDecision::Stop {
                reason: RetryReason::ElapsedBudget,
            };
        }
    }

    RetryDecision::RetryAfter { delay, reason }
}
