use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A scraped product listing as it travels through the pipeline.
///
/// Only `title`, `marca`, `modelo` and `precio` are interpreted directly; every
/// other attribute the crawler produced is kept verbatim in `attributes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub marca: Option<String>,
    #[serde(default)]
    pub modelo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precio: Option<Value>,
    /// Product slug derived from the resolved brand and model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Canonical attribute values keyed by field name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub normalized: BTreeMap<String, NormalizedValue>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Item {
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn marca(mut self, marca: impl Into<String>) -> Self {
        self.marca = Some(marca.into());
        self
    }

    pub fn modelo(mut self, modelo: impl Into<String>) -> Self {
        self.modelo = Some(modelo.into());
        self
    }

    pub fn attribute(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(field.to_string(), value.into());
        self
    }

    /// Text form of an attribute, the way a crawler would have printed it.
    pub fn attribute_text(&self, field: &str) -> Option<String> {
        self.attributes.get(field).and_then(value_text)
    }
}

/// Render a scalar JSON value as text. Containers and nulls have no text form.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// A canonical attribute value produced by the normalization engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Ints(Vec<i64>),
    Text(String),
}

impl NormalizedValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NormalizedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NormalizedValue::Int(i) => Some(*i as f64),
            NormalizedValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            NormalizedValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for NormalizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedValue::Bool(b) => write!(f, "{}", b),
            NormalizedValue::Int(i) => write!(f, "{}", i),
            NormalizedValue::Float(x) => write!(f, "{}", x),
            NormalizedValue::Ints(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            NormalizedValue::Text(s) => write!(f, "{}", s),
        }
    }
}
