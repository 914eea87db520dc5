//! Storable field values.
//!
//! `Value` is the closed set of values a record slot can hold. The host
//! persistence layer maps these onto its own column types; this crate only
//! needs them for redirection, fallback resolution and the per-kind "natural
//! default" rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single storable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    DateTime(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    /// Whether this is the null/absent value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// String content, when this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
