use crate::types::{Field, RetryPolicy};
use crate::validate::validator::Validator;

pub(crate) fn validate_retry_field(v: &mut Validator, path: &str, field: &Field<RetryPolicy>) {
    if let Field::Value(policy) = field {
        validate_retry(v, path, policy);
    }
}

fn validate_retry(v: &mut Validator, path: &str, policy: &RetryPolicy) {
    if policy.attempts < 1 {
        v.push(format!("{path}.Attempts"), "must be >= 1");
    }
    v.non_negative(&format!("{path}.BackoffSeconds"), Some(policy.backoff_seconds));
    if let Some(m) = policy.multiplier {
        if !m.is_finite() || m <= 0.0 {
            v.push(format!("{path}.Multiplier"), "must be a finite number > 0");
        }
    }
    v.non_negative(&format!("{path}.MaxBackoffSeconds"), policy.max_backoff_seconds);
    v.non_negative(&format!("{path}.MaxElapsedSeconds"), policy.max_elapsed_seconds);
    if let Some(codes) = &policy.retry_on_status {
        for (idx, code) in codes.iter().enumerate() {
            if !(100..=599).contains(code) {
                v.push(
                    format!("{path}.RetryOnStatus[{idx}]"),
                    "must be an HTTP status code (100-599)",
                );
            }
        }
    }
}
