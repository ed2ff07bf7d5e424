//! Metric data model
//!
//! The processor never touches a metric's storage directly. Everything it
//! needs goes through [`MetricAdapter`], so any host representation can be
//! processed as long as it implements the trait. [`Metric`] is the concrete
//! type used by the bundled codecs and the command-line filter.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value of a single metric field
///
/// Only [`FieldValue::String`] values are eligible for string transforms;
/// every other variant is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean value
    Boolean(bool),
    /// Signed 64-bit integer
    Integer(i64),
    /// Unsigned 64-bit integer
    Unsigned(u64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 string
    String(String),
}

impl FieldValue {
    /// Borrow the string payload, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Type name used in log output
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Integer(_) => "integer",
            FieldValue::Unsigned(_) => "unsigned",
            FieldValue::Float(_) => "float",
            FieldValue::String(_) => "string",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Unsigned(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Unsigned(u) => write!(f, "{}", u),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::String(s) => write!(f, "{}", s),
        }
    }
}

/// Capability surface the processor uses to read and mutate a metric
///
/// `tags()` and `fields()` return owned snapshots. Wildcard passes iterate
/// the snapshot while mutating the live metric, so an implementation does
/// not have to tolerate mutation during its own iteration.
pub trait MetricAdapter {
    /// Measurement name
    fn name(&self) -> &str;

    /// Replace the measurement name
    fn set_name(&mut self, name: String);

    /// Snapshot of all tags
    fn tags(&self) -> Vec<(String, String)>;

    /// Look up a single tag value
    fn get_tag(&self, key: &str) -> Option<&str>;

    /// Insert or overwrite a tag
    fn add_tag(&mut self, key: String, value: String);

    /// Remove a tag, returning its value if it was present
    fn remove_tag(&mut self, key: &str) -> Option<String>;

    /// Snapshot of all fields
    fn fields(&self) -> Vec<(String, FieldValue)>;

    /// Look up a single field value
    fn get_field(&self, key: &str) -> Option<&FieldValue>;

    /// Insert or overwrite a field
    fn add_field(&mut self, key: String, value: FieldValue);

    /// Remove a field, returning its value if it was present
    fn remove_field(&mut self, key: &str) -> Option<FieldValue>;
}

/// A single metric data point
///
/// Tags and fields are kept in sorted maps so encoded output is
/// deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metric {
    /// Measurement name
    pub name: String,
    /// Tag set
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Field set
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    /// Timestamp in nanoseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Metric {
    /// Create a metric with no tags or fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a tag
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add a field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Set the timestamp
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

impl MetricAdapter for Metric {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn tags(&self) -> Vec<(String, String)> {
        self.tags
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn get_tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    fn add_tag(&mut self, key: String, value: String) {
        self.tags.insert(key, value);
    }

    fn remove_tag(&mut self, key: &str) -> Option<String> {
        self.tags.remove(key)
    }

    fn fields(&self) -> Vec<(String, FieldValue)> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn get_field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    fn add_field(&mut self, key: String, value: FieldValue) {
        self.fields.insert(key, value);
    }

    fn remove_field(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.remove(key)
    }
}
