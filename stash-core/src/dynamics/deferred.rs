use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use super::{expand, lookup_secret, DynamicError, FuncCall, Sets};
use crate::secrets::SecretMap;

/// Key of the marker object that stands in for a deferred value in snapshots.
pub const DEFERRED_KEY: &str = "$deferred";

/// A value computed again immediately before every HTTP attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Deferred {
    Func(FuncCall),
    Dynamic {
        pattern: String,
        template: String,
        sets: Arc<Sets>,
    },
    Secret {
        key: String,
    },
}

impl Deferred {
    pub fn evaluate(&self, secrets: &SecretMap, redact: bool) -> Result<Value, DynamicError> {
        match self {
            Self::Func(call) => Ok(call.call()),
            Self::Dynamic { template, sets, .. } => {
                expand(template, sets, secrets, redact).map(Value::String)
            }
            Self::Secret { key } => lookup_secret(key, secrets, redact).map(Value::String),
        }
    }

    pub fn marker_value(&self) -> Value {
        let payload = match self {
            Self::Func(call) => call.payload(),
            Self::Dynamic {
                pattern, template, ..
            } => {
                let mut map = Map::new();
                map.insert(
                    "dynamic".into(),
                    json!({"pattern": pattern, "template": template}),
                );
                map
            }
            Self::Secret { key } => {
                let mut map = Map::new();
                map.insert("secret".into(), Value::from(key.as_str()));
                map
            }
        };
        let mut outer = Map::new();
        outer.insert(DEFERRED_KEY.into(), Value::Object(payload));
        Value::Object(outer)
    }
}

/// Ordered map of resolved section entries (Headers, Body, Query).
pub type ResolvedMap = IndexMap<String, ResolvedValue>;

/// Output of the resolve-time pass.
///
/// Subtrees without deferred nodes collapse into a single [`ResolvedValue::Literal`],
/// so `Array` and `Object` always contain at least one deferred descendant.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    Literal(Value),
    Array(Vec<ResolvedValue>),
    Object(ResolvedMap),
    Deferred(Deferred),
}

impl ResolvedValue {
    pub fn from_array(items: Vec<ResolvedValue>) -> Self {
        if items.iter().all(Self::is_literal) {
            Self::Literal(Value::Array(
                items.into_iter().filter_map(Self::into_literal).collect(),
            ))
        } else {
            Self::Array(items)
        }
    }

    pub fn from_object(entries: ResolvedMap) -> Self {
        if entries.values().all(Self::is_literal) {
            Self::Literal(Value::Object(
                entries
                    .into_iter()
                    .filter_map(|(k, v)| v.into_literal().map(|v| (k, v)))
                    .collect(),
            ))
        } else {
            Self::Object(entries)
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    pub fn has_deferred(&self) -> bool {
        !self.is_literal()
    }

    fn into_literal(self) -> Option<Value> {
        match self {
            Self::Literal(v) => Some(v),
            _ => None,
        }
    }

    /// Replaces every deferred node with a freshly computed value.
    ///
    /// Trees without deferred nodes come back unchanged.
    pub fn resolve_deferred(&self, secrets: &SecretMap, redact: bool) -> Result<Value, DynamicError> {
        match self {
            Self::Literal(v) => Ok(v.clone()),
            Self::Array(items) => items
                .iter()
                .map(|v| v.resolve_deferred(secrets, redact))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Self::Object(map) => resolve_map(map, secrets, redact).map(Value::Object),
            Self::Deferred(d) => d.evaluate(secrets, redact),
        }
    }

    /// The resolve-time view, with `$deferred` markers in place of deferred nodes.
    pub fn snapshot(&self) -> Value {
        match self {
            Self::Literal(v) => v.clone(),
            Self::Array(items) => Value::Array(items.iter().map(Self::snapshot).collect()),
            Self::Object(map) => Value::Object(snapshot_map(map)),
            Self::Deferred(d) => d.marker_value(),
        }
    }
}

pub(crate) fn resolve_map(
    map: &ResolvedMap,
    secrets: &SecretMap,
    redact: bool,
) -> Result<Map<String, Value>, DynamicError> {
    map.iter()
        .map(|(k, v)| Ok((k.clone(), v.resolve_deferred(secrets, redact)?)))
        .collect()
}

pub(crate) fn snapshot_map(map: &ResolvedMap) -> Map<String, Value> {
    map.iter().map(|(k, v)| (k.clone(), v.snapshot())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::TimestampFormat;

    #[test]
    fn literal_children_collapse() {
        let v = ResolvedValue::from_array(vec![
            ResolvedValue::Literal(Value::from(1)),
            ResolvedValue::Literal(Value::from("a")),
        ]);
        assert_eq!(v, ResolvedValue::Literal(json!([1, "a"])));
    }

    #[test]
    fn deferred_child_keeps_structure() {
        let mut map = ResolvedMap::new();
        map.insert("a".into(), ResolvedValue::Literal(Value::from(1)));
        map.insert(
            "ts".into(),
            ResolvedValue::Deferred(Deferred::Func(FuncCall::Timestamp(TimestampFormat::EpochS))),
        );
        let v = ResolvedValue::from_object(map);
        assert!(v.has_deferred());

        let snap = v.snapshot();
        assert_eq!(snap["ts"]["$deferred"]["func"], "timestamp");
        assert_eq!(snap["ts"]["$deferred"]["format"], "epoch_s");

        let live = v.resolve_deferred(&SecretMap::new(), false).unwrap();
        assert_eq!(live["a"], 1);
        assert!(live["ts"].is_i64());
    }

    #[test]
    fn resolving_literals_is_idempotent() {
        let v = ResolvedValue::Literal(json!({"k": ["x", {"y": null}]}));
        let once = v.resolve_deferred(&SecretMap::new(), false).unwrap();
        let twice = ResolvedValue::Literal(once.clone())
            .resolve_deferred(&SecretMap::new(), false)
            .unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, v.snapshot());
    }

    #[test]
    fn deferred_secret_fails_when_key_disappears() {
        let v = ResolvedValue::Deferred(Deferred::Secret { key: "GONE".into() });
        let secrets: SecretMap = [("OTHER", "x")].into_iter().collect();
        let err = v.resolve_deferred(&secrets, false).unwrap_err();
        assert_eq!(err, DynamicError::UnknownSecret { key: "GONE".into() });
    }
}
