use std::sync::LazyLock;

use chrono::Utc;
use indexmap::IndexMap;
use regex::{Captures, Regex};

use super::{Charset, DynamicError, TimestampFormat};
use crate::secrets::{SecretMap, REDACTED};

/// Named value sets for `${choice:...}`.
pub type Sets = IndexMap<String, Vec<String>>;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}:]+)(?::([^}:]+))?(?::([^}]+))?\}").expect("valid regex")
});
static INLINE_SECRET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\s*\$secrets\s*:\s*([A-Za-z0-9_\-\.]+)\s*\}").expect("valid regex")
});

/// Expands `${name[:arg1[:arg2]]}` placeholders, then inline `{ $secrets: KEY }`
/// references. Unknown placeholder names are kept verbatim.
pub fn expand(
    template: &str,
    sets: &Sets,
    secrets: &SecretMap,
    redact: bool,
) -> Result<String, DynamicError> {
    let expanded = replace_all(&PLACEHOLDER_RE, template, |caps| {
        placeholder(caps, sets, secrets, redact)
    })?;
    replace_all(&INLINE_SECRET_RE, &expanded, |caps| {
        lookup_secret(&caps[1], secrets, redact)
    })
}

/// Runs an expansion only to surface configuration errors.
pub fn check(template: &str, sets: &Sets, secrets: &SecretMap) -> Result<(), DynamicError> {
    expand(template, sets, secrets, true).map(|_| ())
}

pub(crate) fn lookup_secret(
    key: &str,
    secrets: &SecretMap,
    redact: bool,
) -> Result<String, DynamicError> {
    if secrets.is_empty() {
        return Err(DynamicError::NoSecrets {
            key: key.to_string(),
        });
    }
    match secrets.get(key) {
        Some(_) if redact => Ok(REDACTED.to_string()),
        Some(value) => Ok(value.to_string()),
        None => Err(DynamicError::UnknownSecret {
            key: key.to_string(),
        }),
    }
}

fn replace_all(
    re: &Regex,
    input: &str,
    mut replace: impl FnMut(&Captures<'_>) -> Result<String, DynamicError>,
) -> Result<String, DynamicError> {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for caps in re.captures_iter(input) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&input[last..whole.start()]);
        out.push_str(&replace(&caps)?);
        last = whole.end();
    }
    out.push_str(&input[last..]);
    Ok(out)
}

fn placeholder(
    caps: &Captures<'_>,
    sets: &Sets,
    secrets: &SecretMap,
    redact: bool,
) -> Result<String, DynamicError> {
    let name = &caps[1];
    let arg1 = caps.get(2).map(|m| m.as_str());
    let arg2 = caps.get(3).map(|m| m.as_str());

    if let Some(charset) = Charset::from_name(name) {
        let len = parse_count(arg1).ok_or_else(|| DynamicError::InvalidCount {
            name: name.to_string(),
            arg: arg1.map(str::to_string),
        })?;
        return Ok(charset.generate(len));
    }

    match name {
        "uuidv4" => Ok(uuid::Uuid::new_v4().to_string()),
        "timestamp" | "@timestamp" => {
            let format = match arg1 {
                Some(f) => f.parse::<TimestampFormat>()?,
                None => TimestampFormat::default(),
            };
            Ok(format.render_string(Utc::now()))
        }
        "secrets" | "secret" => {
            let key = arg1
                .filter(|k| !k.is_empty())
                .ok_or(DynamicError::MissingSecretKey)?;
            lookup_secret(key, secrets, redact)
        }
        "choice" => choice(arg1, arg2, sets),
        _ => Ok(caps[0].to_string()),
    }
}

fn choice(set: Option<&str>, count: Option<&str>, sets: &Sets) -> Result<String, DynamicError> {
    let set = set.ok_or(DynamicError::MissingSetName)?;
    let pool = sets.get(set).ok_or_else(|| DynamicError::UnknownSet {
        name: set.to_string(),
    })?;
    if pool.is_empty() {
        return Err(DynamicError::EmptySet {
            name: set.to_string(),
        });
    }
    let picks = match count {
        None => 1,
        Some(arg) => parse_count(Some(arg))
            .filter(|n| *n >= 1)
            .ok_or_else(|| DynamicError::InvalidChoiceCount {
                set: set.to_string(),
                arg: arg.to_string(),
            })?,
    };
    Ok((0..picks)
        .map(|_| pool[fastrand::usize(..pool.len())].as_str())
        .collect())
}

fn parse_count(arg: Option<&str>) -> Option<usize> {
    arg.filter(|a| !a.is_empty() && a.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|a| a.parse().ok())
}
