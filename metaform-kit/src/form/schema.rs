//! Field Schema Types
//!
//! This module defines the Rust types for the backend-produced field schema.
//! Schemas are deserialized with serde_json and are deliberately lenient:
//! backends spell booleans and numbers in several ways.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::error::{FormError, Result};

/// Lenient bool deserializer: accepts `true`, `1`, `"Y"`, `"true"`, `"1"`.
fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<bool, D::Error> {
    let val = Option::<Value>::deserialize(d)?;
    Ok(match val {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "y" | "yes" | "1"
        ),
        _ => false,
    })
}

fn lenient_editable<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<bool, D::Error> {
    let val = Option::<Value>::deserialize(d)?;
    match val {
        None | Some(Value::Null) => Ok(true),
        Some(other) => lenient_bool(other).map_err(serde::de::Error::custom),
    }
}

/// Lenient u8 deserializer: accepts numbers and numeric strings, ignores the rest.
fn lenient_u8<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<u8>, D::Error> {
    let val = Option::<Value>::deserialize(d)?;
    Ok(match val {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn default_true() -> bool {
    true
}

/// A single field in the form schema.
///
/// # Example JSON
///
/// ```text
/// {
///   "name": "status",
///   "caption": "Status",
///   "widgetKind": "combo",
///   "dataField": "STATUS_CD",
///   "required": "Y",
///   "style": {"width": "120px", "class": "narrow, muted"},
///   "tooltip": "Pick one\\nof the states",
///   "widgetParameter": {
///     "dataUrl": "/codes/status",
///     "values": {"value": "code", "display": "label"}
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Field name; unique within a field list
    pub name: String,

    /// Caption shown next to the widget
    #[serde(default)]
    pub caption: String,

    /// Declared widget kind, matched case-insensitively
    #[serde(default, alias = "type")]
    pub widget_kind: String,

    /// Column name used instead of `name` for record lookup and reporting
    #[serde(default)]
    pub data_field: Option<String>,

    /// Whether a value must be provided
    #[serde(default, deserialize_with = "lenient_bool")]
    pub required: bool,

    /// Whether the user may edit the value
    #[serde(default = "default_true", deserialize_with = "lenient_editable")]
    pub editable: bool,

    /// Raw style map, in declaration order
    #[serde(default)]
    pub style: Option<IndexMap<String, Value>>,

    /// Raw tooltip text, possibly with escaped newlines
    #[serde(default)]
    pub tooltip: Option<String>,

    /// Widget-specific parameters
    #[serde(default)]
    pub widget_parameter: WidgetParameter,
}

impl FieldDescriptor {
    /// Create a descriptor with the given name and widget kind
    pub fn new(name: impl Into<String>, widget_kind: impl Into<String>) -> Self {
        FieldDescriptor {
            name: name.into(),
            caption: String::new(),
            widget_kind: widget_kind.into(),
            data_field: None,
            required: false,
            editable: true,
            style: None,
            tooltip: None,
            widget_parameter: WidgetParameter::default(),
        }
    }

    /// Key under which the field's value is reported: `dataField` if set, else `name`
    pub fn report_key(&self) -> &str {
        self.data_field
            .as_deref()
            .filter(|df| !df.is_empty())
            .unwrap_or(&self.name)
    }
}

/// Widget-specific parameters of a field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetParameter {
    /// Embedded options: an array, or a JSON string encoding one
    #[serde(default)]
    pub data: Option<Value>,

    /// Remote options source
    #[serde(default)]
    pub data_url: Option<String>,

    /// Which sub-keys serve as value/display: an object, or a JSON string encoding one
    #[serde(default)]
    pub values: Option<Value>,

    /// Date/time mode flag (`1`, `2`, `3`); any non-empty value enables formatting
    #[serde(default)]
    pub format: Option<Value>,

    /// Checkbox cardinality (2 or 3)
    #[serde(default, deserialize_with = "lenient_u8")]
    pub state_number: Option<u8>,

    /// Where the caption sits relative to the widget
    #[serde(default)]
    pub caption_position: Option<CaptionPosition>,

    /// Parameters not interpreted by the engine
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl WidgetParameter {
    /// Check if a non-empty format flag is declared
    pub fn has_format(&self) -> bool {
        match &self.format {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    /// Check if the checkbox declares 3-state cardinality
    pub fn is_tri_state(&self) -> bool {
        self.state_number == Some(3)
    }

    /// Embedded option data, if any (null counts as absent)
    pub fn embedded_data(&self) -> Option<&Value> {
        self.data.as_ref().filter(|v| !v.is_null())
    }

    /// Remote option URL, if any (blank counts as absent)
    pub fn remote_url(&self) -> Option<&str> {
        self.data_url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// Caption placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptionPosition {
    #[default]
    Left,
    Top,
    Right,
    None,
    #[serde(other)]
    Unknown,
}

/// A whole form definition.
///
/// # Example JSON
///
/// ```text
/// {"columns": 3, "fields": [{"name": "title", "widgetKind": "text"}]}
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    /// Column count override for row layout
    #[serde(default)]
    pub columns: Option<usize>,

    /// Ordered field list
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl FormSchema {
    /// Parse a form definition.
    ///
    /// Accepts either a `{ "fields": [...] }` object or a bare field array.
    pub fn from_json_str(json: &str) -> Result<Self> {
        // Decoded straight from the text so style maps keep declaration order.
        let schema = if json.trim_start().starts_with('[') {
            FormSchema {
                columns: None,
                fields: serde_json::from_str(json)
                    .map_err(|e| FormError::decode("field list", e))?,
            }
        } else {
            serde_json::from_str(json).map_err(|e| FormError::decode("form schema", e))?
        };

        let mut seen = std::collections::HashSet::new();
        for field in &schema.fields {
            if !seen.insert(field.name.as_str()) {
                ::log::warn!("[schema] duplicate field name '{}'", field.name);
            }
        }

        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_descriptor() {
        let json = r#"{
            "name": "status",
            "caption": "Status",
            "widgetKind": "Combo",
            "dataField": "STATUS_CD",
            "required": "Y",
            "editable": 0,
            "style": {"width": "120px", "class": "a, b", "height": 30},
            "tooltip": "tip",
            "widgetParameter": {"dataUrl": "/codes", "stateNumber": "3", "captionPosition": "top", "rows": 4}
        }"#;

        let field: FieldDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(field.name, "status");
        assert_eq!(field.widget_kind, "Combo");
        assert!(field.required);
        assert!(!field.editable);
        assert_eq!(field.report_key(), "STATUS_CD");

        let style = field.style.as_ref().unwrap();
        let keys: Vec<&str> = style.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["width", "class", "height"]);

        let param = &field.widget_parameter;
        assert_eq!(param.remote_url(), Some("/codes"));
        assert!(param.is_tri_state());
        assert_eq!(param.caption_position, Some(CaptionPosition::Top));
        assert_eq!(param.extra.get("rows"), Some(&serde_json::json!(4)));
    }

    #[test]
    fn test_defaults_and_type_alias() {
        let field: FieldDescriptor =
            serde_json::from_str(r#"{"name": "title", "type": "text"}"#).unwrap();
        assert_eq!(field.widget_kind, "text");
        assert!(field.editable);
        assert!(!field.required);
        assert_eq!(field.report_key(), "title");
        assert!(!field.widget_parameter.has_format());
    }

    #[test]
    fn test_has_format() {
        let mut param = WidgetParameter::default();
        param.format = Some(Value::String("  ".to_string()));
        assert!(!param.has_format());
        param.format = Some(serde_json::json!(2));
        assert!(param.has_format());
    }

    #[test]
    fn test_unknown_caption_position() {
        let param: WidgetParameter =
            serde_json::from_str(r#"{"captionPosition": "diagonal"}"#).unwrap();
        assert_eq!(param.caption_position, Some(CaptionPosition::Unknown));
    }

    #[test]
    fn test_form_schema_accepts_bare_array() {
        let schema = FormSchema::from_json_str(r#"[{"name": "a"}, {"name": "b"}]"#).unwrap();
        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.columns, None);

        let schema =
            FormSchema::from_json_str(r#"{"columns": 3, "fields": [{"name": "a"}]}"#).unwrap();
        assert_eq!(schema.columns, Some(3));
    }

    #[test]
    fn test_form_schema_keeps_style_declaration_order() {
        let schema = FormSchema::from_json_str(
            r#"[{"name": "a", "widgetKind": "text",
                 "style": {"width": "1px", "color": "red", "height": "2px"}},
                {"name": "b", "style": {"z-index": "1", "border": "0"}}]"#,
        )
        .unwrap();

        let keys = |field: &FieldDescriptor| -> Vec<String> {
            field.style.as_ref().unwrap().keys().cloned().collect()
        };
        assert_eq!(keys(&schema.fields[0]), vec!["width", "color", "height"]);
        assert_eq!(keys(&schema.fields[1]), vec!["z-index", "border"]);

        let wrapped = FormSchema::from_json_str(
            r#"{"fields": [{"name": "c", "style": {"width": "1px", "color": "red"}}]}"#,
        )
        .unwrap();
        assert_eq!(keys(&wrapped.fields[0]), vec!["width", "color"]);
    }

    #[test]
    fn test_form_schema_rejects_garbage() {
        assert!(matches!(
            FormSchema::from_json_str("{not json"),
            Err(FormError::Decode { .. })
        ));
    }
}
