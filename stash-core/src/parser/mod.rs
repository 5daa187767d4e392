use crate::error::ParseError;
use crate::types::Document;

/// Root keys that belong under `StashConfig`; used to explain a missing wrapper.
const STASH_CONFIG_CHILDREN: [&str; 6] = ["Name", "Defaults", "Forced", "Retry", "Dynamics", "Sequences"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Auto,
}

#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub document: Document,
    pub format: DocumentFormat,
}

pub fn parse_document_str(input: &str, format: DocumentFormat) -> Result<ParsedDocument, ParseError> {
    match format {
        DocumentFormat::Json => Ok(ParsedDocument {
            document: serde_json::from_str::<Document>(input)?,
            format,
        }),
        DocumentFormat::Yaml => Ok(ParsedDocument {
            document: parse_yaml(input)?,
            format,
        }),
        DocumentFormat::Auto => parse_document_auto(input),
    }
}

fn parse_yaml(input: &str) -> Result<Document, ParseError> {
    let mut value: serde_yaml::Value = serde_yaml::from_str(input)?;
    // Aliases are expanded by the loader; `<<` merge keys need an explicit pass.
    value.apply_merge()?;
    check_root(&value)?;
    Ok(serde_yaml::from_value::<Document>(value)?)
}

fn check_root(value: &serde_yaml::Value) -> Result<(), ParseError> {
    let Some(map) = value.as_mapping() else {
        return Ok(());
    };
    if map.contains_key("StashConfig") {
        return Ok(());
    }
    let present: Vec<String> = STASH_CONFIG_CHILDREN
        .iter()
        .filter(|k| map.contains_key(**k))
        .map(|k| (*k).to_string())
        .collect();
    if present.is_empty() {
        Ok(())
    } else {
        Err(ParseError::MissingRoot(present))
    }
}

fn parse_document_auto(input: &str) -> Result<ParsedDocument, ParseError> {
    // JSON always starts with `{` or `[` after trimming; YAML is a JSON superset,
    // so fall back to the YAML loader when strict JSON fails.
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return match serde_json::from_str::<Document>(input) {
            Ok(document) => Ok(ParsedDocument {
                document,
                format: DocumentFormat::Json,
            }),
            Err(e) => match parse_yaml(input) {
                Ok(document) => Ok(ParsedDocument {
                    document,
                    format: DocumentFormat::Yaml,
                }),
                Err(_) => Err(ParseError::Json(e)),
            },
        };
    }

    Ok(ParsedDocument {
        document: parse_yaml(input)?,
        format: DocumentFormat::Yaml,
    })
}
