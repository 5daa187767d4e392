use serde_json::{Map, Value};

use super::resolved::to_value;
use super::ResolvedConfig;
use crate::secrets::Redactor;

/// Document form of a [`ResolvedConfig`], written to `<stem>-resolved.yml`.
///
/// Starts with `$deferred` markers in every request-time field. The runner
/// replaces a request's block with its materialized values once that request
/// completes.
#[derive(Debug, Clone)]
pub struct ResolvedSnapshot {
    root: Value,
}

impl ResolvedSnapshot {
    pub fn new(config: &ResolvedConfig) -> Self {
        let mut sc = Map::new();
        sc.insert("Name".into(), Value::from(config.name.as_str()));
        if config.retry.is_declared() {
            sc.insert("Retry".into(), to_value(&config.retry));
        }
        sc.insert("Defaults".into(), to_value(&config.defaults));
        if let Some(forced) = &config.forced {
            sc.insert("Forced".into(), to_value(forced));
        }

        let sequences = config
            .sequences
            .iter()
            .map(|seq| {
                let mut s = Map::new();
                s.insert("Name".into(), Value::from(seq.name.as_str()));
                s.insert("Type".into(), Value::from(seq.kind.as_str()));
                if let Some(limit) = seq.concurrency_limit {
                    s.insert("ConcurrencyLimit".into(), Value::from(limit));
                }
                let requests = seq
                    .requests
                    .iter()
                    .map(|req| {
                        let mut entry = Map::new();
                        entry.insert(req.key.clone(), req.snapshot_block());
                        Value::Object(entry)
                    })
                    .collect();
                s.insert("Requests".into(), Value::Array(requests));
                Value::Object(s)
            })
            .collect();
        sc.insert("Sequences".into(), Value::Array(sequences));

        let mut root = Map::new();
        root.insert("StashConfig".into(), Value::Object(sc));
        Self {
            root: Value::Object(root),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Replaces the block of request `req` in sequence `seq` (both 0-based).
    /// Returns false when no such request exists.
    pub fn set_request_block(&mut self, seq: usize, req: usize, block: Value) -> bool {
        let Some(entry) = self
            .root
            .pointer_mut(&format!("/StashConfig/Sequences/{seq}/Requests/{req}"))
            .and_then(Value::as_object_mut)
        else {
            return false;
        };
        match entry.values_mut().next() {
            Some(slot) => {
                *slot = block;
                true
            }
            None => false,
        }
    }

    /// YAML rendering with every secret value masked.
    pub fn to_yaml(&self, redactor: &Redactor) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&redactor.redact_value(&self.root))
    }
}
