use indexmap::IndexMap;

use crate::types::{Field, FlowControl, ResponseFormat, RetryPolicy, Sequence, ValueMap};

/// Top-level document. Unknown root keys are kept so YAML anchor holders
/// (`x-common: &common ...`) do not fail parsing.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Document {
    #[serde(rename = "StashConfig")]
    pub stash_config: StashConfig,

    #[serde(flatten, default)]
    pub extra: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct StashConfig {
    pub name: String,

    pub defaults: Defaults,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced: Option<Forced>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub retry: Field<RetryPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamics: Option<Dynamics>,

    pub sequences: Vec<Sequence>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Defaults {
    #[serde(rename = "URLRoot")]
    pub url_root: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_control: Option<FlowControl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<ValueMap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<ValueMap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<ValueMap>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub retry: Field<RetryPolicy>,

    #[serde(default, rename = "InsecureTLS", skip_serializing_if = "Option::is_none")]
    pub insecure_tls: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Forced {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<ValueMap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<ValueMap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<ValueMap>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub retry: Field<RetryPolicy>,
}

/// Named templates (`$dynamic`) and value sets (`${choice:...}`).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Dynamics {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub patterns: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub sets: IndexMap<String, Vec<String>>,
}
