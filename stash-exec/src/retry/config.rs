use std::collections::BTreeSet;
use std::time::Duration;

use stash_core::types::{BackoffStrategy, RetryPolicy};

/// Executor view of a request's effective Retry policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub strategy: BackoffStrategy,
    pub base_seconds: f64,
    pub multiplier: f64,
    pub max_backoff_seconds: Option<f64>,
    pub max_elapsed: Option<Duration>,
    pub jitter: bool,
    pub retry_statuses: BTreeSet<u16>,
    pub retry_on_network_errors: bool,
    pub retry_on_timeouts: bool,
}

impl RetryConfig {
    /// One attempt, nothing retried. Used when no level declares a Retry policy.
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            strategy: BackoffStrategy::Fixed,
            base_seconds: 0.0,
            multiplier: 1.0,
            max_backoff_seconds: None,
            max_elapsed: None,
            jitter: false,
            retry_statuses: BTreeSet::new(),
            retry_on_network_errors: false,
            retry_on_timeouts: false,
        }
    }

    pub fn from_policy(policy: Option<&RetryPolicy>) -> Self {
        let Some(p) = policy else {
            return Self::single_attempt();
        };
        Self {
            max_attempts: p.attempts.max(1),
            strategy: p.backoff_strategy,
            base_seconds: p.backoff_seconds.max(0.0),
            multiplier: p.multiplier(),
            max_backoff_seconds: p.max_backoff_seconds,
            max_elapsed: p.max_elapsed_seconds.and_then(seconds),
            jitter: p.jitter_enabled(),
            retry_statuses: p.retry_on_status(),
            retry_on_network_errors: p.retry_on_network_errors(),
            retry_on_timeouts: p.retry_on_timeouts(),
        }
    }
}

/// Seconds to `Duration`, clamping negatives to zero and rejecting NaN or overflow.
pub(crate) fn seconds(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs.max(0.0)).ok()
}
