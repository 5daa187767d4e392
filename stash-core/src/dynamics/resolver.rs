use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use super::{
    check, expand, lookup_secret, Deferred, DynamicError, Marker, ResolvedMap, ResolvedValue,
    Sets, When,
};
use crate::secrets::SecretMap;
use crate::types::Dynamics;

/// Per-run memo of resolve-time `$dynamic` values, keyed by pattern name.
#[derive(Debug, Default, Clone)]
pub struct DynamicCache {
    values: HashMap<String, String>,
}

impl DynamicCache {
    pub fn get(&self, pattern: &str) -> Option<&str> {
        self.values.get(pattern).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// State of one resolve-time pass over a configuration.
pub struct ResolveContext<'a> {
    patterns: IndexMap<String, String>,
    sets: Arc<Sets>,
    secrets: &'a SecretMap,
    redact: bool,
    cache: DynamicCache,
}

impl<'a> ResolveContext<'a> {
    pub fn new(dynamics: Option<&Dynamics>, secrets: &'a SecretMap, redact: bool) -> Self {
        let (patterns, sets) = match dynamics {
            Some(d) => (d.patterns.clone(), d.sets.clone()),
            None => (IndexMap::new(), Sets::new()),
        };
        Self {
            patterns,
            sets: Arc::new(sets),
            secrets,
            redact,
            cache: DynamicCache::default(),
        }
    }

    pub fn cache(&self) -> &DynamicCache {
        &self.cache
    }

    pub fn resolve_value(&mut self, value: &Value) -> Result<ResolvedValue, DynamicError> {
        match value {
            Value::String(s) => Ok(ResolvedValue::Literal(Value::String(expand(
                s,
                &self.sets,
                self.secrets,
                self.redact,
            )?))),
            Value::Array(items) => {
                let items = items
                    .iter()
                    .map(|v| self.resolve_value(v))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ResolvedValue::from_array(items))
            }
            Value::Object(map) => {
                if let Some(marker) = Marker::parse(map) {
                    return self.resolve_marker(marker?);
                }
                let mut entries = ResolvedMap::with_capacity(map.len());
                for (k, v) in map {
                    entries.insert(k.clone(), self.resolve_value(v)?);
                }
                Ok(ResolvedValue::from_object(entries))
            }
            other => Ok(ResolvedValue::Literal(other.clone())),
        }
    }

    fn resolve_marker(&mut self, marker: Marker) -> Result<ResolvedValue, DynamicError> {
        match marker {
            Marker::Func {
                call,
                when: When::Resolve,
            } => Ok(ResolvedValue::Literal(call.call())),
            Marker::Func {
                call,
                when: When::Request,
            } => Ok(ResolvedValue::Deferred(Deferred::Func(call))),
            Marker::Dynamic { pattern, when } => {
                let template = self
                    .patterns
                    .get(&pattern)
                    .cloned()
                    .ok_or_else(|| DynamicError::UnknownPattern {
                        name: pattern.clone(),
                    })?;
                match when {
                    When::Resolve => {
                        if let Some(hit) = self.cache.get(&pattern) {
                            return Ok(ResolvedValue::Literal(Value::from(hit)));
                        }
                        let value = expand(&template, &self.sets, self.secrets, self.redact)?;
                        self.cache.values.insert(pattern, value.clone());
                        Ok(ResolvedValue::Literal(Value::String(value)))
                    }
                    When::Request => {
                        check(&template, &self.sets, self.secrets)?;
                        Ok(ResolvedValue::Deferred(Deferred::Dynamic {
                            pattern,
                            template,
                            sets: Arc::clone(&self.sets),
                        }))
                    }
                }
            }
            Marker::Secret { key, when } => {
                let value = lookup_secret(&key, self.secrets, self.redact)?;
                Ok(match when {
                    When::Resolve => ResolvedValue::Literal(Value::String(value)),
                    When::Request => ResolvedValue::Deferred(Deferred::Secret { key }),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn dynamics() -> Dynamics {
        let mut d = Dynamics::default();
        d.patterns.insert("order".into(), "ORD-${hex:6}".into());
        d.patterns.insert("bad".into(), "${choice:nope}".into());
        d
    }

    #[test]
    fn resolve_time_dynamic_is_memoized() {
        let secrets = SecretMap::new();
        let d = dynamics();
        let mut ctx = ResolveContext::new(Some(&d), &secrets, false);
        let a = ctx.resolve_value(&json!({"$dynamic": "order"})).unwrap();
        let b = ctx.resolve_value(&json!({"$dynamic": "order"})).unwrap();
        assert_eq!(a, b);
        assert_eq!(ctx.cache().len(), 1);
    }

    #[test]
    fn request_time_dynamic_is_validated_eagerly() {
        let secrets = SecretMap::new();
        let d = dynamics();
        let mut ctx = ResolveContext::new(Some(&d), &secrets, false);
        let err = ctx
            .resolve_value(&json!({"$dynamic": "bad", "when": "request"}))
            .unwrap_err();
        assert_eq!(err, DynamicError::UnknownSet { name: "nope".into() });

        let v = ctx
            .resolve_value(&json!({"$dynamic": "order", "when": "request"}))
            .unwrap();
        assert!(matches!(v, ResolvedValue::Deferred(Deferred::Dynamic { .. })));
    }

    #[test]
    fn unknown_pattern_is_an_error() {
        let secrets = SecretMap::new();
        let mut ctx = ResolveContext::new(None, &secrets, false);
        let err = ctx.resolve_value(&json!({"$dynamic": "missing"})).unwrap_err();
        assert_eq!(err, DynamicError::UnknownPattern { name: "missing".into() });
    }

    #[test]
    fn request_time_secret_checks_key_up_front() {
        let secrets: SecretMap = [("TOKEN", "t")].into_iter().collect();
        let mut ctx = ResolveContext::new(None, &secrets, false);
        assert!(ctx
            .resolve_value(&json!({"$secrets": "MISSING", "when": "request"}))
            .is_err());
        let v = ctx
            .resolve_value(&json!({"auth": {"$secrets": "TOKEN", "when": "request"}}))
            .unwrap();
        assert_eq!(v.snapshot(), json!({"auth": {"$deferred": {"secret": "TOKEN"}}}));
        assert_eq!(v.resolve_deferred(&secrets, false).unwrap(), json!({"auth": "t"}));
    }

    #[test]
    fn string_leaves_are_expanded_and_keys_are_not() {
        let secrets = SecretMap::new();
        let mut ctx = ResolveContext::new(None, &secrets, false);
        let v = ctx
            .resolve_value(&json!({"${hex:2}": "id-${numeric:3}", "n": 5}))
            .unwrap();
        let ResolvedValue::Literal(Value::Object(map)) = v else {
            panic!("expected literal object");
        };
        assert!(map.contains_key("${hex:2}"));
        assert_eq!(map["${hex:2}"].as_str().unwrap().len(), 6);
        assert_eq!(map["n"], 5);
    }
}
