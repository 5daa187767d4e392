use std::collections::HashSet;

use crate::types::{Sequence, SequenceType};
use crate::validate::rules::{config::validate_flow_control, retry};
use crate::validate::validator::Validator;

pub(crate) fn validate_sequence(v: &mut Validator, seq: &Sequence, path: &str) {
    match (seq.kind, seq.concurrency_limit) {
        (SequenceType::Concurrent, None) => v.push(
            format!("{path}.ConcurrencyLimit"),
            "is required when Type is 'Concurrent'",
        ),
        (SequenceType::Concurrent, Some(0)) => {
            v.push(format!("{path}.ConcurrencyLimit"), "must be >= 1")
        }
        (SequenceType::Sequential, Some(_)) => v.push(
            format!("{path}.ConcurrencyLimit"),
            "must not be set when Type is 'Sequential'",
        ),
        _ => {}
    }

    if seq.requests.is_empty() {
        v.push(format!("{path}.Requests"), "must have at least one entry");
    }

    let mut keys = HashSet::<&str>::new();
    for (idx, entry) in seq.requests.iter().enumerate() {
        let rpath = format!("{path}.Requests[{idx}]");
        if entry.key.trim().is_empty() {
            v.push(rpath.clone(), "request key must not be empty");
        }
        if !keys.insert(entry.key.as_str()) {
            v.push(
                format!("{rpath}.{}", entry.key),
                "request key must be unique within the sequence",
            );
        }

        let spath = format!("{rpath}.{}", entry.key);
        if let Some(flow) = &entry.spec.flow_control {
            validate_flow_control(v, &format!("{spath}.FlowControl"), flow);
        }
        retry::validate_retry_field(v, &format!("{spath}.Retry"), &entry.spec.retry);
    }
}
