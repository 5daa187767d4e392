use std::collections::HashSet;

use crate::types::{Dynamics, FlowControl, StashConfig};
use crate::validate::rules::{retry, sequence};
use crate::validate::validator::Validator;

pub(crate) fn validate_config(v: &mut Validator, sc: &StashConfig) {
    if sc.name.trim().is_empty() {
        v.push("StashConfig.Name", "must not be empty");
    }
    if sc.name.contains(['/', '\\']) {
        v.push("StashConfig.Name", "must not contain path separators");
    }

    if sc.defaults.url_root.trim().is_empty() {
        v.push("StashConfig.Defaults.URLRoot", "must not be empty");
    }
    if let Some(flow) = &sc.defaults.flow_control {
        validate_flow_control(v, "StashConfig.Defaults.FlowControl", flow);
    }
    retry::validate_retry_field(v, "StashConfig.Defaults.Retry", &sc.defaults.retry);
    retry::validate_retry_field(v, "StashConfig.Retry", &sc.retry);
    if let Some(forced) = &sc.forced {
        retry::validate_retry_field(v, "StashConfig.Forced.Retry", &forced.retry);
    }
    if let Some(dynamics) = &sc.dynamics {
        validate_dynamics(v, dynamics);
    }

    if sc.sequences.is_empty() {
        v.push("StashConfig.Sequences", "must have at least one entry");
    }

    let mut names = HashSet::<&str>::new();
    for (idx, seq) in sc.sequences.iter().enumerate() {
        let path = format!("StashConfig.Sequences[{idx}]");
        if seq.name.trim().is_empty() {
            v.push(format!("{path}.Name"), "must not be empty");
        }
        if !names.insert(seq.name.as_str()) {
            v.push(format!("{path}.Name"), "must be unique");
        }
        sequence::validate_sequence(v, seq, &path);
    }
}

pub(crate) fn validate_flow_control(v: &mut Validator, path: &str, flow: &FlowControl) {
    v.non_negative(&format!("{path}.DelaySeconds"), flow.delay_seconds);
    v.non_negative(&format!("{path}.TimeoutSeconds"), flow.timeout_seconds);
}

fn validate_dynamics(v: &mut Validator, dynamics: &Dynamics) {
    for (name, values) in &dynamics.sets {
        if values.is_empty() {
            v.push(
                format!("StashConfig.Dynamics.Sets.{name}"),
                "must have at least one entry",
            );
        }
    }
}
