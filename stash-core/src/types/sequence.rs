use indexmap::IndexMap;

use crate::types::{Field, FlowControl, ResponseFormat, RetryPolicy, ValueMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SequenceType {
    Sequential,
    Concurrent,
}

impl SequenceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "Sequential",
            Self::Concurrent => "Concurrent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Sequence {
    pub name: String,

    #[serde(rename = "Type")]
    pub kind: SequenceType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency_limit: Option<usize>,

    pub requests: Vec<RequestEntry>,
}

/// One `{ <Key>: <Request> }` item of a sequence's `Requests` list.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(
    try_from = "IndexMap<String, RequestSpec>",
    into = "IndexMap<String, RequestSpec>"
)]
pub struct RequestEntry {
    pub key: String,
    pub spec: RequestSpec,
}

impl TryFrom<IndexMap<String, RequestSpec>> for RequestEntry {
    type Error = String;

    fn try_from(map: IndexMap<String, RequestSpec>) -> Result<Self, Self::Error> {
        if map.len() != 1 {
            return Err(format!(
                "each Requests entry must be a single-key mapping {{ <Key>: {{Request...}} }}; got {} keys",
                map.len()
            ));
        }
        let Some((key, spec)) = map.into_iter().next() else {
            return Err("empty Requests entry".to_string());
        };
        Ok(Self { key, spec })
    }
}

impl From<RequestEntry> for IndexMap<String, RequestSpec> {
    fn from(entry: RequestEntry) -> Self {
        let mut map = IndexMap::with_capacity(1);
        map.insert(entry.key, entry.spec);
        map
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct RequestSpec {
    pub method: Method,

    #[serde(rename = "URLPath")]
    pub url_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<ValueMap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<ValueMap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<ValueMap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_control: Option<FlowControl>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub retry: Field<RetryPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseFormat>,

    #[serde(default, rename = "InsecureTLS", skip_serializing_if = "Option::is_none")]
    pub insecure_tls: Option<bool>,
}
