use std::borrow::Cow;

use serde_json::Value;

use super::SecretValue;

pub const REDACTED: &str = "***REDACTED***";

/// Replaces every known secret value with [`REDACTED`].
///
/// Longer secrets are replaced first so a secret that contains another one is
/// never left half-masked.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    needles: Vec<SecretValue>,
}

impl Redactor {
    pub fn new(values: impl IntoIterator<Item = SecretValue>) -> Self {
        let mut needles: Vec<SecretValue> = values
            .into_iter()
            .filter(|v| !v.expose().is_empty())
            .collect();
        needles.sort_by(|a, b| b.expose().len().cmp(&a.expose().len()));
        Self { needles }
    }

    pub fn is_empty(&self) -> bool {
        self.needles.is_empty()
    }

    pub fn redact<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut out = Cow::Borrowed(text);
        for needle in &self.needles {
            let needle = needle.expose();
            if out.contains(needle) {
                out = Cow::Owned(out.replace(needle, REDACTED));
            }
        }
        out
    }

    /// Redacts string leaves and object keys of a JSON-like tree.
    pub fn redact_value(&self, value: &Value) -> Value {
        if self.is_empty() {
            return value.clone();
        }
        match value {
            Value::String(s) => Value::String(self.redact(s).into_owned()),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.redact_value(v)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (self.redact(k).into_owned(), self.redact_value(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::SecretMap;

    #[test]
    fn longest_secret_is_replaced_first() {
        let map: SecretMap = [("SHORT", "abc"), ("LONG", "abcdef")].into_iter().collect();
        let r = map.redactor();
        assert_eq!(r.redact("x=abcdef y=abc"), "x=***REDACTED*** y=***REDACTED***");
    }

    #[test]
    fn empty_secret_values_are_ignored() {
        let map: SecretMap = [("EMPTY", "")].into_iter().collect();
        assert_eq!(map.redactor().redact("plain"), "plain");
    }

    #[test]
    fn nested_values_are_redacted() {
        let map: SecretMap = [("TOKEN", "s3cr3t")].into_iter().collect();
        let v = serde_json::json!({"auth": {"bearer": "Bearer s3cr3t"}, "n": 1});
        let out = map.redactor().redact_value(&v);
        assert_eq!(out["auth"]["bearer"], "Bearer ***REDACTED***");
        assert_eq!(out["n"], 1);
    }
}
