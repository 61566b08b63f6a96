//! Value Formatter
//!
//! Resolves the display value of a field from a data record.

use serde_json::Value;

use super::datetime::{DateMode, format_date};
use super::registry::WidgetKind;
use super::schema::FieldDescriptor;
use super::value::DataRecord;

/// Find the raw record entry for a field.
///
/// A present, non-null entry under `dataField` wins; otherwise the entry
/// under `name` is used. `0`, `false` and `""` count as present.
pub fn resolve_raw<'a>(record: &'a DataRecord, field: &FieldDescriptor) -> Option<&'a Value> {
    field
        .data_field
        .as_deref()
        .and_then(|df| record.get_present(df))
        .or_else(|| record.get_present(&field.name))
}

/// Text form of a record value.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Resolve and format the display value of `field` from `record`.
///
/// Fields that declare a `format` flag are run through date/time formatting,
/// except plain labels, which always show the raw text.
pub fn format_value(record: &DataRecord, field: &FieldDescriptor) -> String {
    let Some(raw) = resolve_raw(record, field) else {
        return String::new();
    };
    let text = value_text(raw);

    let kind = WidgetKind::parse(&field.widget_kind);
    if field.widget_parameter.has_format() && kind != WidgetKind::Label {
        let mode = DateMode::from_flag(field.widget_parameter.format.as_ref());
        format_date(&text, mode)
    } else {
        text
    }
}
