//! Form Value Types
//!
//! Represents the primitive values that flow between data records, option
//! lists and field handles.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A primitive value as found in a data record or an option list.
///
/// # Examples
///
/// ```json
/// "Alice"
/// 42
/// false
/// null
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
    /// Explicit null (or a value that was never set)
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value, kept in its JSON representation
    Number(Number),
    /// String value
    String(String),
}

impl Primitive {
    /// Create a new string primitive
    pub fn string(s: impl Into<String>) -> Self {
        Primitive::String(s.into())
    }

    /// Convert a JSON value into a primitive.
    ///
    /// Arrays and objects are not primitives; they are flattened into their
    /// compact JSON text so nothing is silently dropped.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Primitive::Null,
            Value::Bool(b) => Primitive::Bool(*b),
            Value::Number(n) => Primitive::Number(n.clone()),
            Value::String(s) => Primitive::String(s.clone()),
            other => Primitive::String(other.to_string()),
        }
    }

    /// Check if this is null
    pub fn is_null(&self) -> bool {
        matches!(self, Primitive::Null)
    }

    /// Get the string if this is a string primitive
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Primitive::String(s) => Some(s),
            _ => None,
        }
    }

    /// Text form used for display and for comparing option keys.
    ///
    /// `Null` becomes the empty string; `0`, `false` and `""` keep their
    /// literal spelling.
    pub fn to_text(&self) -> String {
        match self {
            Primitive::Null => String::new(),
            Primitive::Bool(b) => b.to_string(),
            Primitive::Number(n) => n.to_string(),
            Primitive::String(s) => s.clone(),
        }
    }

    /// Check whether the text form is empty
    pub fn is_blank(&self) -> bool {
        match self {
            Primitive::Null => true,
            Primitive::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for Primitive {
    fn from(s: &str) -> Self {
        Primitive::String(s.to_string())
    }
}

impl From<String> for Primitive {
    fn from(s: String) -> Self {
        Primitive::String(s)
    }
}

impl From<bool> for Primitive {
    fn from(b: bool) -> Self {
        Primitive::Bool(b)
    }
}

impl From<i64> for Primitive {
    fn from(n: i64) -> Self {
        Primitive::Number(n.into())
    }
}

/// A data record supplied by the embedding application.
///
/// Maps field names (or mapped column names) to values. The record is
/// read-only to the engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataRecord {
    entries: Map<String, Value>,
}

impl DataRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record from a JSON object map
    pub fn from_map(entries: Map<String, Value>) -> Self {
        DataRecord { entries }
    }

    /// Create a record from any JSON value; non-objects yield an empty record
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(entries) => DataRecord { entries },
            _ => DataRecord::new(),
        }
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Get the raw entry under `key`, including explicit nulls
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Get the entry under `key` if it is present and not null.
    ///
    /// `0`, `false` and `""` are present values.
    pub fn get_present(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).filter(|v| !v.is_null())
    }

    /// Check if the record has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitive_untagged_decode() {
        let values: Vec<Primitive> = serde_json::from_str(r#"[null, true, 3, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Primitive::Null,
                Primitive::Bool(true),
                Primitive::from(3_i64),
                Primitive::string("x"),
            ]
        );
    }

    #[test]
    fn test_falsy_primitives_keep_their_text() {
        assert_eq!(Primitive::from(0_i64).to_text(), "0");
        assert_eq!(Primitive::Bool(false).to_text(), "false");
        assert_eq!(Primitive::string("").to_text(), "");
        assert_eq!(Primitive::Null.to_text(), "");
    }

    #[test]
    fn test_record_present_skips_null_only() {
        let record = DataRecord::from_value(json!({"a": null, "b": 0, "c": false, "d": ""}));
        assert!(record.get_present("a").is_none());
        assert!(record.get("a").is_some());
        assert_eq!(record.get_present("b"), Some(&json!(0)));
        assert_eq!(record.get_present("c"), Some(&json!(false)));
        assert_eq!(record.get_present("d"), Some(&json!("")));
        assert!(record.get_present("missing").is_none());
    }
}
