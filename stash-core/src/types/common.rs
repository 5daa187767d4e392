use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Header, body and query sections are free-form JSON-like maps.
pub type ValueMap = serde_json::Map<String, serde_json::Value>;

/// A document field that keeps "omitted" apart from "explicitly null".
///
/// Use with `#[serde(default, skip_serializing_if = "Field::is_unset")]` so that
/// omission deserializes to [`Field::Unset`] and a literal `null` to [`Field::Null`].
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Unset,
    Null,
    Value(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> Field<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// True when the field appeared in the document, even as `null`.
    pub fn is_declared(&self) -> bool {
        !self.is_unset()
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Unset | Self::Null => None,
        }
    }

    /// First declared field wins; an explicit null stops the walk.
    pub fn or_declared(self, farther: Field<T>) -> Field<T> {
        if self.is_declared() {
            self
        } else {
            farther
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Self::Value(v),
            None => Self::Null,
        })
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::Unset | Self::Null => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct FlowControl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<f64>,
}

impl FlowControl {
    /// Per-field overlay: values set on `self` win over `fallback`.
    pub fn overlay(&self, fallback: Option<&FlowControl>) -> FlowControl {
        FlowControl {
            delay_seconds: self
                .delay_seconds
                .or_else(|| fallback.and_then(|f| f.delay_seconds)),
            timeout_seconds: self
                .timeout_seconds
                .or_else(|| fallback.and_then(|f| f.timeout_seconds)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ResponseFormat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pretty_print: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<bool>,
}

impl ResponseFormat {
    pub fn sort(&self) -> bool {
        self.sort.unwrap_or(false)
    }

    /// Sorting implies pretty printing.
    pub fn pretty(&self) -> bool {
        self.pretty_print.unwrap_or(false) || self.sort()
    }
}
