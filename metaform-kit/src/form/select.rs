//! Selection state for choice widgets.
//!
//! Options may arrive after the value does. Both selectors keep the value they
//! were given and reconcile it against whatever options are loaded, so the
//! reported selection is always drawn from the current option list.

use indexmap::IndexSet;

use super::options::OptionEntry;
use super::value::Primitive;

/// Split a comma-joined selection into trimmed, non-empty keys
pub fn split_keys(joined: &str) -> IndexSet<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Multi-selection over an option list (advanced combo, list box).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiSelect {
    options: Vec<OptionEntry>,
    wanted: IndexSet<String>,
    loaded: bool,
}

impl MultiSelect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a comma-joined value from the record or the embedding application
    pub fn set_external_value(&mut self, joined: &str) {
        self.wanted = split_keys(joined);
    }

    /// Install the resolved options; a value set earlier is reconciled now
    pub fn set_options(&mut self, options: Vec<OptionEntry>) {
        self.options = options;
        self.loaded = true;
    }

    pub fn options(&self) -> &[OptionEntry] {
        &self.options
    }

    /// Whether the option list has been resolved
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Selected options, in option order
    pub fn selected_entries(&self) -> Vec<&OptionEntry> {
        self.options
            .iter()
            .filter(|o| self.wanted.contains(&o.key()))
            .collect()
    }

    /// Selected values, in option order
    pub fn values(&self) -> Vec<Primitive> {
        self.selected_entries()
            .into_iter()
            .map(|o| o.value.clone())
            .collect()
    }

    /// Selected values joined with commas
    pub fn joined_value(&self) -> String {
        self.selected_entries()
            .iter()
            .map(|o| o.key())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Selected display texts joined with commas
    pub fn joined_display(&self) -> String {
        self.selected_entries()
            .iter()
            .map(|o| o.display.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Flip one option. Returns false if `key` is not a current option.
    pub fn toggle(&mut self, key: &str) -> bool {
        if !self.options.iter().any(|o| o.key() == key) {
            return false;
        }
        if !self.wanted.shift_remove(key) {
            self.wanted.insert(key.to_string());
        }
        true
    }

    pub fn clear(&mut self) {
        self.wanted.clear();
    }
}

/// Single selection over an option list (combo).
///
/// Until a matching option is loaded the raw value is reported unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SingleSelect {
    options: Vec<OptionEntry>,
    value: Primitive,
    loaded: bool,
}

impl SingleSelect {
    pub fn new(value: Primitive) -> Self {
        SingleSelect {
            value,
            ..Self::default()
        }
    }

    pub fn set_external_value(&mut self, value: Primitive) {
        self.value = value;
    }

    pub fn set_options(&mut self, options: Vec<OptionEntry>) {
        self.options = options;
        self.loaded = true;
    }

    pub fn options(&self) -> &[OptionEntry] {
        &self.options
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// The option matching the current value, if loaded
    pub fn selected(&self) -> Option<&OptionEntry> {
        let key = self.value.to_text();
        self.options.iter().find(|o| o.key() == key)
    }

    /// Select by key. Returns false if `key` is not a current option.
    pub fn select(&mut self, key: &str) -> bool {
        match self.options.iter().find(|o| o.key() == key) {
            Some(option) => {
                self.value = option.value.clone();
                true
            }
            None => false,
        }
    }

    /// Value reported to the aggregator
    pub fn value(&self) -> Primitive {
        self.selected()
            .map(|o| o.value.clone())
            .unwrap_or_else(|| self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Vec<OptionEntry> {
        vec![
            OptionEntry::new("a", "Alpha"),
            OptionEntry::new("b", "Beta"),
            OptionEntry::new("c", "Gamma"),
        ]
    }

    #[test]
    fn test_external_value_selects_subset() {
        let mut select = MultiSelect::new();
        select.set_options(abc());
        select.set_external_value(" a , b,");

        let keys: Vec<String> = select.selected_entries().iter().map(|o| o.key()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(select.joined_value(), "a,b");
        assert_eq!(select.joined_display(), "Alpha,Beta");
    }

    #[test]
    fn test_value_before_options_reconciles_later() {
        let mut select = MultiSelect::new();
        select.set_external_value("b,c");
        assert!(select.selected_entries().is_empty());
        assert_eq!(select.joined_value(), "");

        select.set_options(abc());
        assert_eq!(select.joined_value(), "b,c");
    }

    #[test]
    fn test_unknown_keys_are_never_selected() {
        let mut select = MultiSelect::new();
        select.set_options(abc());
        select.set_external_value("z,a");
        assert_eq!(select.joined_value(), "a");
        assert!(!select.toggle("z"));
    }

    #[test]
    fn test_toggle_keeps_option_order() {
        let mut select = MultiSelect::new();
        select.set_options(abc());
        assert!(select.toggle("c"));
        assert!(select.toggle("a"));
        assert_eq!(select.joined_value(), "a,c");
        assert!(select.toggle("c"));
        assert_eq!(select.joined_value(), "a");
    }

    #[test]
    fn test_single_select_falls_back_to_raw_value() {
        let mut select = SingleSelect::new(Primitive::string("b"));
        assert_eq!(select.value(), Primitive::string("b"));
        assert!(select.selected().is_none());

        select.set_options(abc());
        assert_eq!(select.selected().map(|o| o.display.as_str()), Some("Beta"));
        assert!(select.select("c"));
        assert_eq!(select.value(), Primitive::string("c"));
        assert!(!select.select("z"));
    }

    #[test]
    fn test_single_select_keeps_typed_value() {
        let mut select = SingleSelect::new(Primitive::string("7"));
        select.set_options(vec![OptionEntry::new(7_i64, "Seven")]);
        assert_eq!(select.value(), Primitive::from(7_i64));
    }
}
