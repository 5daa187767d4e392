use serde_json::{Map, Value};

use crate::dynamics::{DynamicError, ResolvedMap};
use crate::secrets::SecretMap;
use crate::types::{
    Defaults, Field, FlowControl, Forced, Method, ResponseFormat, RetryPolicy, SequenceType,
    ValueMap,
};

/// The merged configuration of one run. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub name: String,
    pub url_root: String,
    pub retry: Field<RetryPolicy>,
    pub defaults: Defaults,
    pub forced: Option<Forced>,
    pub sequences: Vec<ResolvedSequence>,
}

impl ResolvedConfig {
    pub fn total_requests(&self) -> usize {
        self.sequences.iter().map(|s| s.requests.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedSequence {
    /// 0-based position in the document.
    pub index: usize,
    pub name: String,
    pub kind: SequenceType,
    pub concurrency_limit: Option<usize>,
    pub requests: Vec<ResolvedRequest>,
}

impl ResolvedSequence {
    /// Worker count for a concurrent sequence: `min(limit, request count)`, at least 1.
    pub fn workers(&self) -> usize {
        let n = self.requests.len();
        self.concurrency_limit.unwrap_or(n).min(n).max(1)
    }
}

/// One request with every precedence rule applied. Header, body and query
/// entries may still hold deferred values.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    /// 0-based position in its sequence.
    pub index: usize,
    pub key: String,
    /// Location used in error messages, e.g. `Sequences[0].Requests[2].login`.
    pub path: String,
    pub method: Method,
    pub url_root: String,
    pub url_path: String,
    pub headers: Option<ResolvedMap>,
    pub body: Option<ResolvedMap>,
    pub query: Option<ResolvedMap>,
    pub retry: Field<RetryPolicy>,
    pub flow: FlowControl,
    pub insecure_tls: bool,
    pub response: Option<ResponseFormat>,
}

/// Header, body and query values computed for a single attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedRequest {
    pub method: Method,
    pub url_root: String,
    pub url_path: String,
    pub headers: Option<ValueMap>,
    pub body: Option<ValueMap>,
    pub query: Option<ValueMap>,
}

impl ResolvedRequest {
    pub fn has_deferred(&self) -> bool {
        [&self.headers, &self.body, &self.query]
            .into_iter()
            .flatten()
            .any(|m| m.values().any(|v| v.has_deferred()))
    }

    pub fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry.value()
    }

    /// Effective inter-request delay; unset means none.
    pub fn delay_seconds(&self) -> f64 {
        self.flow.delay_seconds.unwrap_or(0.0)
    }

    pub fn timeout_seconds(&self) -> Option<f64> {
        self.flow.timeout_seconds
    }

    /// Runs the request-time pass. Called once per attempt.
    pub fn materialize(&self, secrets: &SecretMap) -> Result<MaterializedRequest, DynamicError> {
        let live = |m: &Option<ResolvedMap>| {
            m.as_ref()
                .map(|m| crate::dynamics::resolve_map(m, secrets, false))
                .transpose()
        };
        Ok(MaterializedRequest {
            method: self.method,
            url_root: self.url_root.clone(),
            url_path: self.url_path.clone(),
            headers: live(&self.headers)?,
            body: live(&self.body)?,
            query: live(&self.query)?,
        })
    }

    /// Request block with `$deferred` markers where values are still pending.
    pub fn snapshot_block(&self) -> Value {
        let section = |m: &Option<ResolvedMap>| {
            m.as_ref()
                .map(|m| Value::Object(crate::dynamics::snapshot_map(m)))
        };
        self.block(
            section(&self.headers),
            section(&self.body),
            section(&self.query),
        )
    }

    /// Request block carrying the values of one materialized attempt.
    pub fn materialized_block(&self, live: &MaterializedRequest) -> Value {
        let section = |m: &Option<ValueMap>| m.clone().map(Value::Object);
        self.block(
            section(&live.headers),
            section(&live.body),
            section(&live.query),
        )
    }

    fn block(&self, headers: Option<Value>, body: Option<Value>, query: Option<Value>) -> Value {
        let mut out = Map::new();
        out.insert("Method".into(), Value::from(self.method.as_str()));
        out.insert("URLRoot".into(), Value::from(self.url_root.as_str()));
        out.insert("URLPath".into(), Value::from(self.url_path.as_str()));
        for (name, section) in [("Headers", headers), ("Body", body), ("Query", query)] {
            if let Some(section) = section {
                out.insert(name.into(), section);
            }
        }
        if self.flow != FlowControl::default() {
            out.insert("FlowControl".into(), to_value(&self.flow));
        }
        if self.retry.is_declared() {
            out.insert("Retry".into(), to_value(&self.retry));
        }
        if self.insecure_tls {
            out.insert("InsecureTLS".into(), Value::Bool(true));
        }
        if let Some(response) = &self.response {
            out.insert("Response".into(), to_value(response));
        }
        Value::Object(out)
    }
}

pub(crate) fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}
