use std::str::FromStr;

use serde_json::{Map, Value};

use super::{Charset, DynamicError, TimestampFormat};

const FUNC: &str = "$func";
const TIMESTAMP: &str = "$timestamp";
const DYNAMIC: &str = "$dynamic";
const SECRETS: &str = "$secrets";
const WHEN: &str = "when";

/// When a marker is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum When {
    #[default]
    Resolve,
    Request,
}

impl FromStr for When {
    type Err = DynamicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("resolve") {
            Ok(Self::Resolve)
        } else if s.eq_ignore_ascii_case("request") {
            Ok(Self::Request)
        } else {
            Err(DynamicError::InvalidWhen(s.to_string()))
        }
    }
}

/// A built-in value generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FuncCall {
    Timestamp(TimestampFormat),
    Uuid,
    Random { charset: Charset, length: usize },
}

impl FuncCall {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Timestamp(_) => "timestamp",
            Self::Uuid => "uuidv4",
            Self::Random { charset, .. } => charset.name(),
        }
    }

    pub fn call(&self) -> Value {
        match self {
            Self::Timestamp(format) => format.now(),
            Self::Uuid => Value::String(uuid::Uuid::new_v4().to_string()),
            Self::Random { charset, length } => Value::String(charset.generate(*length)),
        }
    }

    /// Parameters as they appear in a `$deferred` payload.
    pub fn payload(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("func".into(), Value::from(self.name()));
        match self {
            Self::Timestamp(format) => {
                map.insert("format".into(), Value::from(format.as_str()));
            }
            Self::Random { length, .. } => {
                map.insert("length".into(), Value::from(*length));
            }
            Self::Uuid => {}
        }
        map
    }
}

/// A special object recognized inside Headers, Body and Query.
///
/// `$timestamp` is folded into [`Marker::Func`] when parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Func { call: FuncCall, when: When },
    Dynamic { pattern: String, when: When },
    Secret { key: String, when: When },
}

impl Marker {
    pub fn when(&self) -> When {
        match self {
            Self::Func { when, .. } | Self::Dynamic { when, .. } | Self::Secret { when, .. } => {
                *when
            }
        }
    }

    /// Returns `None` when `map` is an ordinary object.
    pub fn parse(map: &Map<String, Value>) -> Option<Result<Self, DynamicError>> {
        let tags: Vec<&str> = [FUNC, TIMESTAMP, DYNAMIC, SECRETS]
            .into_iter()
            .filter(|tag| map.contains_key(*tag))
            .collect();
        match tags.as_slice() {
            [] => None,
            [tag] => Some(parse_tagged(tag, map)),
            [first, ..] => Some(Err(DynamicError::malformed(
                marker_name(first),
                format!("object mixes {}", tags.join(", ")),
            ))),
        }
    }
}

fn marker_name(tag: &str) -> &'static str {
    match tag {
        FUNC => FUNC,
        TIMESTAMP => TIMESTAMP,
        DYNAMIC => DYNAMIC,
        _ => SECRETS,
    }
}

fn parse_tagged(tag: &str, map: &Map<String, Value>) -> Result<Marker, DynamicError> {
    let marker = marker_name(tag);
    let when = match map.get(WHEN) {
        None | Some(Value::Null) => When::default(),
        Some(Value::String(s)) => s.parse()?,
        Some(other) => return Err(DynamicError::InvalidWhen(other.to_string())),
    };

    match marker {
        FUNC => {
            reject_unknown_keys(marker, map, &[FUNC, WHEN, "format", "fmt", "length", "n"])?;
            let name = expect_str(marker, map.get(FUNC))?;
            Ok(Marker::Func {
                call: parse_func(name, map)?,
                when,
            })
        }
        TIMESTAMP => {
            reject_unknown_keys(marker, map, &[TIMESTAMP, WHEN])?;
            let format = match map.get(TIMESTAMP) {
                None | Some(Value::Null) => TimestampFormat::default(),
                Some(Value::String(s)) => s.parse()?,
                Some(Value::Object(inner)) => parse_format(inner)?,
                Some(other) => {
                    return Err(DynamicError::malformed(
                        marker,
                        format!("expected a format name or object, got {other}"),
                    ))
                }
            };
            Ok(Marker::Func {
                call: FuncCall::Timestamp(format),
                when,
            })
        }
        DYNAMIC => {
            reject_unknown_keys(marker, map, &[DYNAMIC, WHEN])?;
            let pattern = expect_str(marker, map.get(DYNAMIC))?;
            Ok(Marker::Dynamic {
                pattern: pattern.to_string(),
                when,
            })
        }
        _ => {
            reject_unknown_keys(marker, map, &[SECRETS, WHEN])?;
            let key = expect_str(marker, map.get(SECRETS))?;
            if key.is_empty() {
                return Err(DynamicError::MissingSecretKey);
            }
            Ok(Marker::Secret {
                key: key.to_string(),
                when,
            })
        }
    }
}

fn parse_func(name: &str, params: &Map<String, Value>) -> Result<FuncCall, DynamicError> {
    if let Some(charset) = Charset::from_name(name) {
        let raw = params.get("length").or_else(|| params.get("n"));
        let length = match raw {
            Some(Value::Number(n)) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
            Some(Value::String(s)) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                s.parse().ok()
            }
            _ => None,
        };
        return length
            .map(|length| FuncCall::Random { charset, length })
            .ok_or_else(|| DynamicError::InvalidCount {
                name: name.to_string(),
                arg: raw.map(|v| v.to_string()),
            });
    }
    match name {
        "timestamp" => Ok(FuncCall::Timestamp(parse_format(params)?)),
        "uuidv4" | "uuid" => Ok(FuncCall::Uuid),
        other => Err(DynamicError::UnknownFunc {
            name: other.to_string(),
        }),
    }
}

fn parse_format(params: &Map<String, Value>) -> Result<TimestampFormat, DynamicError> {
    match params.get("format").or_else(|| params.get("fmt")) {
        None | Some(Value::Null) => Ok(TimestampFormat::default()),
        Some(Value::String(s)) => s.parse(),
        Some(other) => Err(DynamicError::UnsupportedTimestampFormat(other.to_string())),
    }
}

fn expect_str<'a>(marker: &'static str, value: Option<&'a Value>) -> Result<&'a str, DynamicError> {
    match value {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(DynamicError::malformed(
            marker,
            format!("expected a string, got {other}"),
        )),
        None => Err(DynamicError::malformed(marker, "missing value")),
    }
}

fn reject_unknown_keys(
    marker: &'static str,
    map: &Map<String, Value>,
    allowed: &[&str],
) -> Result<(), DynamicError> {
    match map.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(key) => Err(DynamicError::malformed(
            marker,
            format!("unexpected key '{key}'"),
        )),
        None => Ok(()),
    }
}
