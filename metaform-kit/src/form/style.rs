//! Style directive derivation.
//!
//! Turns a field's raw style map into ordered `(property, value)` pairs plus
//! a class list. Property names and values are not validated here; the
//! rendering surface decides what it understands.

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

/// Reserved style key holding a comma-separated class list.
const CLASS_KEY: &str = "class";

/// Style directives derived from a field's style map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleDirectives {
    /// `(property, value)` pairs in declaration order
    pub directives: Vec<(String, String)>,

    /// Class names in first-seen order, without duplicates
    pub classes: IndexSet<String>,
}

impl StyleDirectives {
    /// Derive directives from an optional raw style map.
    pub fn parse(style: Option<&IndexMap<String, Value>>) -> Self {
        let mut parsed = StyleDirectives::default();
        let Some(style) = style else {
            return parsed;
        };

        for (property, value) in style {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };

            if property.trim().eq_ignore_ascii_case(CLASS_KEY) {
                parsed.classes.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_string),
                );
            } else {
                parsed.directives.push((property.clone(), value));
            }
        }

        parsed
    }

    /// Value of the last declaration of `property`
    pub fn get(&self, property: &str) -> Option<&str> {
        self.directives
            .iter()
            .rev()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Append `overlay` after `self`.
    ///
    /// Later declarations win when the directives are applied in order, so
    /// properties in `overlay` override the same properties in `self`.
    pub fn merge(&mut self, overlay: &StyleDirectives) {
        self.directives.extend(overlay.directives.iter().cloned());
        self.classes.extend(overlay.classes.iter().cloned());
    }

    /// Check if nothing was declared
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty() && self.classes.is_empty()
    }
}
