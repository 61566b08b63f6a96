//! Widget Registry
//!
//! Maps declared widget kinds to the behavior the engine attaches to them.

use std::collections::HashMap;

const KNOWN_KINDS: &[WidgetKind] = &[
    WidgetKind::Label,
    WidgetKind::GroupTitle,
    WidgetKind::Text,
    WidgetKind::TextArea,
    WidgetKind::Password,
    WidgetKind::Number,
    WidgetKind::Combo,
    WidgetKind::AdvancedCombo,
    WidgetKind::ListBox,
    WidgetKind::CheckBox,
    WidgetKind::Date,
    WidgetKind::File,
    WidgetKind::Button,
];

/// Widget kind identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    // Display
    Label,
    GroupTitle,

    // Text entry
    Text,
    TextArea,
    Password,
    Number,

    // Choice
    Combo,
    AdvancedCombo,
    ListBox,
    CheckBox,

    // Special
    Date,
    File,
    Button,

    /// Unrecognized kind, rendered read-only
    Unknown(String),
}

impl WidgetKind {
    /// Get the canonical kind name
    pub fn name(&self) -> &str {
        match self {
            WidgetKind::Label => "label",
            WidgetKind::GroupTitle => "groupTitle",
            WidgetKind::Text => "text",
            WidgetKind::TextArea => "textArea",
            WidgetKind::Password => "password",
            WidgetKind::Number => "number",
            WidgetKind::Combo => "combo",
            WidgetKind::AdvancedCombo => "advancedCombo",
            WidgetKind::ListBox => "listBox",
            WidgetKind::CheckBox => "checkBox",
            WidgetKind::Date => "date",
            WidgetKind::File => "file",
            WidgetKind::Button => "button",
            WidgetKind::Unknown(name) => name,
        }
    }

    /// Parse a declared kind; matching is trimmed and case-insensitive.
    ///
    /// Never fails: unrecognized kinds become [`WidgetKind::Unknown`].
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "label" | "lbl" | "display" => WidgetKind::Label,
            "grouptitle" | "group" | "title" => WidgetKind::GroupTitle,
            "text" | "textbox" | "input" | "" => WidgetKind::Text,
            "textarea" | "memo" | "multiline" => WidgetKind::TextArea,
            "password" => WidgetKind::Password,
            "number" | "numberbox" | "numeric" => WidgetKind::Number,
            "combo" | "combobox" | "select" | "dropdown" => WidgetKind::Combo,
            "advancedcombo" | "advcombo" | "multicombo" => WidgetKind::AdvancedCombo,
            "listbox" | "list" | "multiselect" => WidgetKind::ListBox,
            "checkbox" | "check" => WidgetKind::CheckBox,
            "date" | "datebox" | "datetime" => WidgetKind::Date,
            "file" | "upload" | "filebox" => WidgetKind::File,
            "button" | "btn" => WidgetKind::Button,
            _ => WidgetKind::Unknown(trimmed.to_string()),
        }
    }

    /// Get all known kinds (without the fallback)
    pub fn all() -> &'static [WidgetKind] {
        KNOWN_KINDS
    }

    /// Check if this is the group-title marker used by row layout
    pub fn is_group_title(&self) -> bool {
        matches!(self, WidgetKind::GroupTitle)
    }

    /// Check if the kind loads an option list
    pub fn uses_options(&self) -> bool {
        matches!(
            self,
            WidgetKind::Combo | WidgetKind::AdvancedCombo | WidgetKind::ListBox
        )
    }
}

/// How a widget's value is read back by the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// One primitive
    Scalar,
    /// A list joined with commas
    JoinedList,
    /// Read through the handle's selection accessor
    Selection,
    /// A file list, expanded in multipart mode
    Files,
    /// Contributes nothing
    None,
}

/// Mapping information for a widget kind
#[derive(Debug, Clone)]
pub struct WidgetMapping {
    /// The widget kind
    pub kind: WidgetKind,

    /// How the value is collected
    pub value_shape: ValueShape,

    /// Whether users interact with it
    pub interactive: bool,

    /// Description of the widget
    pub description: &'static str,
}

/// Registry of widget behaviors.
///
/// # Example
///
/// ```rust,ignore
/// let registry = WidgetRegistry::with_standard_catalog();
///
/// let shape = registry.value_shape(&WidgetKind::ListBox);
/// assert_eq!(shape, ValueShape::JoinedList);
/// ```
#[derive(Debug, Clone)]
pub struct WidgetRegistry {
    mappings: HashMap<WidgetKind, WidgetMapping>,
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self::with_standard_catalog()
    }
}

impl WidgetRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        WidgetRegistry {
            mappings: HashMap::new(),
        }
    }

    /// Create a registry with the standard widget catalog
    pub fn with_standard_catalog() -> Self {
        let mut registry = Self::new();

        let catalog = [
            (
                WidgetKind::Label,
                ValueShape::Scalar,
                false,
                "Read-only text",
            ),
            (
                WidgetKind::GroupTitle,
                ValueShape::None,
                false,
                "Section heading that starts a new row",
            ),
            (
                WidgetKind::Text,
                ValueShape::Scalar,
                true,
                "Single-line text entry",
            ),
            (
                WidgetKind::TextArea,
                ValueShape::Scalar,
                true,
                "Multi-line text entry",
            ),
            (
                WidgetKind::Password,
                ValueShape::Scalar,
                true,
                "Masked text entry",
            ),
            (
                WidgetKind::Number,
                ValueShape::Scalar,
                true,
                "Numeric text entry",
            ),
            (
                WidgetKind::Combo,
                ValueShape::Scalar,
                true,
                "Single selection from options",
            ),
            (
                WidgetKind::AdvancedCombo,
                ValueShape::Selection,
                true,
                "Multi selection from options, read via selection",
            ),
            (
                WidgetKind::ListBox,
                ValueShape::JoinedList,
                true,
                "Multi selection list",
            ),
            (
                WidgetKind::CheckBox,
                ValueShape::Scalar,
                true,
                "Two- or three-state checkbox",
            ),
            (
                WidgetKind::Date,
                ValueShape::Scalar,
                true,
                "Date, date-time or time entry",
            ),
            (WidgetKind::File, ValueShape::Files, true, "File selection"),
            (WidgetKind::Button, ValueShape::None, true, "Action trigger"),
        ];

        for (kind, value_shape, interactive, description) in catalog {
            registry.register(WidgetMapping {
                kind,
                value_shape,
                interactive,
                description,
            });
        }

        registry
    }

    /// Register a widget mapping
    pub fn register(&mut self, mapping: WidgetMapping) {
        self.mappings.insert(mapping.kind.clone(), mapping);
    }

    /// Get a widget mapping
    pub fn get(&self, kind: &WidgetKind) -> Option<&WidgetMapping> {
        self.mappings.get(kind)
    }

    /// Check if a kind is registered
    pub fn contains(&self, kind: &WidgetKind) -> bool {
        self.mappings.contains_key(kind)
    }

    /// How values of `kind` are collected; unregistered kinds are read-only scalars
    pub fn value_shape(&self, kind: &WidgetKind) -> ValueShape {
        self.get(kind)
            .map(|m| m.value_shape)
            .unwrap_or(ValueShape::Scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog() {
        let registry = WidgetRegistry::with_standard_catalog();

        for kind in WidgetKind::all() {
            assert!(registry.contains(kind), "Missing mapping for {:?}", kind);
        }
    }

    #[test]
    fn test_parse_is_trimmed_and_case_insensitive() {
        assert_eq!(WidgetKind::parse("  ComboBox "), WidgetKind::Combo);
        assert_eq!(WidgetKind::parse("CHECKBOX"), WidgetKind::CheckBox);
        assert_eq!(WidgetKind::parse("AdvCombo"), WidgetKind::AdvancedCombo);
        assert_eq!(WidgetKind::parse("groupTitle"), WidgetKind::GroupTitle);
    }

    #[test]
    fn test_unknown_kind_falls_back() {
        let kind = WidgetKind::parse(" Sparkline ");
        assert_eq!(kind, WidgetKind::Unknown("Sparkline".to_string()));
        assert_eq!(kind.name(), "Sparkline");

        let registry = WidgetRegistry::with_standard_catalog();
        assert_eq!(registry.value_shape(&kind), ValueShape::Scalar);
    }

    #[test]
    fn test_value_shapes() {
        let registry = WidgetRegistry::with_standard_catalog();
        assert_eq!(registry.value_shape(&WidgetKind::Button), ValueShape::None);
        assert_eq!(
            registry.value_shape(&WidgetKind::ListBox),
            ValueShape::JoinedList
        );
        assert_eq!(
            registry.value_shape(&WidgetKind::AdvancedCombo),
            ValueShape::Selection
        );
        assert_eq!(registry.value_shape(&WidgetKind::File), ValueShape::Files);
    }
}
