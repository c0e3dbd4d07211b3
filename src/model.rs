//! Record and field value types.
//!
//! These structures carry what a gather cycle produces: named records
//! holding a mapping of field name to numeric-or-string value plus a
//! mapping of tag name to string.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A value read from a control file.
///
/// Control files carry base-10 integers or opaque text. A token is
/// coerced to `Int` when the whole of it parses as a signed 64-bit
/// integer, otherwise the literal text is kept. No floating point.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric value.
    Int(i64),
    /// Literal text that did not parse as an integer.
    Text(String),
}

impl FieldValue {
    /// Coerces a raw token into a typed value.
    ///
    /// Layout patterns admit digit/dash sequences, so tokens like
    /// `"12-781"` reach the text branch.
    pub fn coerce(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(n) => FieldValue::Int(n),
            Err(_) => FieldValue::Text(s.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Int(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

/// Named fields of one record.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// String-valued labels attached to a record.
pub type TagMap = BTreeMap<String, String>;

/// One measurement pushed into a record sink.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct Record {
    /// Measurement name, including the `cgroup:` namespace token.
    pub measurement: String,
    /// Field name to value.
    pub fields: FieldMap,
    /// Tag name to tag value. Always carries `path`.
    pub tags: TagMap,
}
