//! Field Dispatcher
//!
//! Turns a [`FieldDescriptor`] into a mounted [`FieldWidget`]. The declared
//! kind selects a [`WidgetState`] variant; every interaction afterwards is an
//! exhaustive match on that variant. Kinds the engine does not know mount as
//! a read-only fallback.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use super::checkbox::CheckBoxMachine;
use super::datetime::{DateMode, format_date, validate_date};
use super::error::{FormError, Result};
use super::format::{format_value, resolve_raw};
use super::handle::{FieldHandle, FileEntry, HandleValue};
use super::options::{OptionEntry, OptionLoad, OptionLoader};
use super::registry::WidgetKind;
use super::schema::{CaptionPosition, FieldDescriptor};
use super::select::{MultiSelect, SingleSelect};
use super::style::StyleDirectives;
use super::tooltip::normalize_tooltip;
use super::value::{DataRecord, Primitive};

/// An option list that arrives after mount. Completes without effect if the
/// widget was unmounted in the meantime.
pub type PendingLoad = LocalBoxFuture<'static, ()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFlavor {
    Plain,
    Multiline,
    Masked,
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
    pub text: String,
    pub flavor: TextFlavor,
}

/// Date box state. `text` is the committed value; rejected input only sets
/// `error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateEntry {
    pub mode: DateMode,
    pub text: String,
    pub error: Option<String>,
}

/// Live state of a mounted field, one variant per widget family.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetState {
    Label { text: String },
    GroupTitle,
    Text(TextEntry),
    Combo(SingleSelect),
    MultiSelect(MultiSelect),
    CheckBox(CheckBoxMachine),
    Date(DateEntry),
    File { files: Vec<FileEntry> },
    Button,
    /// Unknown kind, shown read-only
    Fallback { text: String },
}

impl WidgetState {
    /// Initial state of `field` against `record`
    fn mount(kind: &WidgetKind, field: &FieldDescriptor, record: &DataRecord) -> Self {
        let text = || format_value(record, field);
        let text_entry = |flavor| {
            WidgetState::Text(TextEntry {
                text: text(),
                flavor,
            })
        };

        match kind {
            WidgetKind::Label => WidgetState::Label { text: text() },
            WidgetKind::GroupTitle => WidgetState::GroupTitle,
            WidgetKind::Text => text_entry(TextFlavor::Plain),
            WidgetKind::TextArea => text_entry(TextFlavor::Multiline),
            WidgetKind::Password => text_entry(TextFlavor::Masked),
            WidgetKind::Number => text_entry(TextFlavor::Numeric),
            WidgetKind::Combo => {
                let raw = resolve_raw(record, field)
                    .map(Primitive::from_json)
                    .unwrap_or_default();
                WidgetState::Combo(SingleSelect::new(raw))
            }
            WidgetKind::AdvancedCombo | WidgetKind::ListBox => {
                let mut select = MultiSelect::new();
                select.set_external_value(&text());
                WidgetState::MultiSelect(select)
            }
            WidgetKind::CheckBox => WidgetState::CheckBox(CheckBoxMachine::from_value(
                &text(),
                field.widget_parameter.is_tri_state(),
            )),
            WidgetKind::Date => WidgetState::Date(DateEntry {
                mode: DateMode::from_flag(field.widget_parameter.format.as_ref()),
                text: text(),
                error: None,
            }),
            WidgetKind::File => WidgetState::File { files: Vec::new() },
            WidgetKind::Button => WidgetState::Button,
            WidgetKind::Unknown(name) => {
                ::log::debug!(
                    "[form] unknown widget kind '{}' on '{}', showing it read-only",
                    name,
                    field.name
                );
                WidgetState::Fallback { text: text() }
            }
        }
    }
}

/// A field mounted against a record.
#[derive(Debug)]
pub struct FieldWidget {
    descriptor: Rc<FieldDescriptor>,
    kind: WidgetKind,
    style: StyleDirectives,
    tooltip: Option<String>,
    caption_position: CaptionPosition,
    state: RefCell<WidgetState>,
}

impl FieldWidget {
    /// Mount `descriptor` with the values found in `record`.
    ///
    /// Choice widgets resolve their options through `loader`. Options known
    /// immediately are applied before this returns; a remote list comes back
    /// as a [`PendingLoad`] for the caller to drive.
    pub fn mount(
        descriptor: Rc<FieldDescriptor>,
        record: &DataRecord,
        loader: &OptionLoader,
    ) -> (Rc<Self>, Option<PendingLoad>) {
        let kind = WidgetKind::parse(&descriptor.widget_kind);
        let state = WidgetState::mount(&kind, &descriptor, record);

        let widget = Rc::new(FieldWidget {
            style: StyleDirectives::parse(descriptor.style.as_ref()),
            tooltip: normalize_tooltip(descriptor.tooltip.as_deref()),
            caption_position: descriptor
                .widget_parameter
                .caption_position
                .unwrap_or_default(),
            state: RefCell::new(state),
            kind,
            descriptor,
        });

        if !widget.kind.uses_options() {
            return (widget, None);
        }

        let pending = match loader.resolve(&widget.descriptor) {
            OptionLoad::Ready(entries) => {
                widget.apply_options(entries);
                None
            }
            OptionLoad::Pending(load) => {
                let target = Rc::downgrade(&widget);
                let name = widget.descriptor.name.clone();
                Some(
                    async move {
                        let entries = load.await;
                        match target.upgrade() {
                            Some(widget) => widget.apply_options(entries),
                            None => ::log::debug!(
                                "[form] '{}' was unmounted before its options arrived",
                                name
                            ),
                        }
                    }
                    .boxed_local(),
                )
            }
        };

        (widget, pending)
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn caption(&self) -> &str {
        &self.descriptor.caption
    }

    pub fn kind(&self) -> &WidgetKind {
        &self.kind
    }

    pub fn style(&self) -> &StyleDirectives {
        &self.style
    }

    /// Tooltip with escaped newlines turned into line breaks
    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    pub fn caption_position(&self) -> CaptionPosition {
        self.caption_position
    }

    /// Borrow the live state
    pub fn state(&self) -> Ref<'_, WidgetState> {
        self.state.borrow()
    }

    /// Whether the user may change the value
    pub fn is_editable(&self) -> bool {
        self.descriptor.editable
            && !matches!(
                *self.state.borrow(),
                WidgetState::Label { .. } | WidgetState::GroupTitle | WidgetState::Fallback { .. }
            )
    }

    /// Whether the field is required but has no value
    pub fn is_missing(&self) -> bool {
        self.descriptor.required && self.current_value().is_empty()
    }

    /// Inline validation message of a date box
    pub fn date_error(&self) -> Option<String> {
        match &*self.state.borrow() {
            WidgetState::Date(entry) => entry.error.clone(),
            _ => None,
        }
    }

    /// Currently loaded options of a choice widget
    pub fn options(&self) -> Vec<OptionEntry> {
        match &*self.state.borrow() {
            WidgetState::Combo(select) => select.options().to_vec(),
            WidgetState::MultiSelect(select) => select.options().to_vec(),
            _ => Vec::new(),
        }
    }

    fn ensure_editable(&self) -> Result<()> {
        if self.descriptor.editable {
            Ok(())
        } else {
            Err(FormError::ReadOnly(self.descriptor.name.clone()))
        }
    }

    fn unsupported(&self, operation: &'static str) -> FormError {
        FormError::Unsupported {
            field: self.descriptor.name.clone(),
            operation,
        }
    }

    /// User typed into a text entry or date box
    pub fn set_text(&self, text: &str) -> Result<()> {
        if matches!(*self.state.borrow(), WidgetState::Date(_)) {
            return self.input_date(text);
        }
        self.ensure_editable()?;
        match &mut *self.state.borrow_mut() {
            WidgetState::Text(entry) => {
                entry.text = text.to_string();
                Ok(())
            }
            _ => Err(self.unsupported("text input")),
        }
    }

    /// User entered a date. Malformed input is kept out of the committed
    /// value and reported inline.
    pub fn input_date(&self, text: &str) -> Result<()> {
        self.ensure_editable()?;
        let mut state = self.state.borrow_mut();
        let WidgetState::Date(entry) = &mut *state else {
            return Err(self.unsupported("date input"));
        };
        match validate_date(text, entry.mode) {
            Ok(()) => {
                entry.text = text.trim().to_string();
                entry.error = None;
                Ok(())
            }
            Err(err) => {
                entry.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// User clicked a checkbox
    pub fn toggle(&self) -> Result<()> {
        self.ensure_editable()?;
        match &mut *self.state.borrow_mut() {
            WidgetState::CheckBox(check) => {
                check.toggle();
                Ok(())
            }
            _ => Err(self.unsupported("toggle")),
        }
    }

    /// User picked an option in a combo. Returns false for unknown keys.
    pub fn select(&self, key: &str) -> Result<bool> {
        self.ensure_editable()?;
        match &mut *self.state.borrow_mut() {
            WidgetState::Combo(select) => Ok(select.select(key)),
            _ => Err(self.unsupported("single selection")),
        }
    }

    /// User flipped an option in a multi-select. Returns false for unknown keys.
    pub fn toggle_option(&self, key: &str) -> Result<bool> {
        self.ensure_editable()?;
        match &mut *self.state.borrow_mut() {
            WidgetState::MultiSelect(select) => Ok(select.toggle(key)),
            _ => Err(self.unsupported("multiple selection")),
        }
    }

    /// User picked files
    pub fn set_files(&self, files: Vec<FileEntry>) -> Result<()> {
        self.ensure_editable()?;
        match &mut *self.state.borrow_mut() {
            WidgetState::File { files: current } => {
                *current = files;
                Ok(())
            }
            _ => Err(self.unsupported("file selection")),
        }
    }

    /// The embedding application pushed a value. Bypasses `editable`.
    pub fn set_external_value(&self, value: &Primitive) -> Result<()> {
        let text = value.to_text();
        match &mut *self.state.borrow_mut() {
            WidgetState::Label { text: current }
            | WidgetState::Fallback { text: current }
            | WidgetState::Text(TextEntry { text: current, .. }) => *current = text,
            WidgetState::Combo(select) => select.set_external_value(value.clone()),
            WidgetState::MultiSelect(select) => select.set_external_value(&text),
            WidgetState::CheckBox(check) => check.set_value(&text),
            WidgetState::Date(entry) => {
                entry.text = if self.descriptor.widget_parameter.has_format() {
                    format_date(&text, entry.mode)
                } else {
                    text
                };
                entry.error = None;
            }
            WidgetState::File { .. } => return Err(self.unsupported("external values")),
            WidgetState::GroupTitle | WidgetState::Button => {}
        }
        Ok(())
    }

    /// Re-read the value from a newly loaded record
    pub fn load_record(&self, record: &DataRecord) {
        let fresh = WidgetState::mount(&self.kind, &self.descriptor, record);
        let mut state = self.state.borrow_mut();
        match (&mut *state, fresh) {
            (WidgetState::Combo(current), WidgetState::Combo(fresh)) => {
                current.set_external_value(fresh.value());
            }
            (WidgetState::MultiSelect(current), WidgetState::MultiSelect(_)) => {
                current.set_external_value(&format_value(record, &self.descriptor));
            }
            (WidgetState::File { files }, _) => files.clear(),
            (current, fresh) => *current = fresh,
        }
    }

    /// Install a resolved option list. A value committed earlier is
    /// reconciled against it.
    pub fn apply_options(&self, entries: Vec<OptionEntry>) {
        match &mut *self.state.borrow_mut() {
            WidgetState::Combo(select) => select.set_options(entries),
            WidgetState::MultiSelect(select) => select.set_options(entries),
            _ => ::log::debug!(
                "[form] ignoring options for '{}', which has no option list",
                self.descriptor.name
            ),
        }
    }
}

impl FieldHandle for FieldWidget {
    fn current_value(&self) -> HandleValue {
        match &*self.state.borrow() {
            WidgetState::Label { text }
            | WidgetState::Fallback { text }
            | WidgetState::Text(TextEntry { text, .. })
            | WidgetState::Date(DateEntry { text, .. }) => {
                HandleValue::Scalar(Primitive::string(text.as_str()))
            }
            WidgetState::Combo(select) => HandleValue::Scalar(select.value()),
            WidgetState::MultiSelect(select) => HandleValue::List(select.values()),
            WidgetState::CheckBox(check) => HandleValue::Scalar(check.value()),
            WidgetState::File { files } => HandleValue::Files(files.clone()),
            WidgetState::GroupTitle | WidgetState::Button => HandleValue::Scalar(Primitive::Null),
        }
    }

    fn selection(&self) -> Option<String> {
        match &*self.state.borrow() {
            WidgetState::MultiSelect(select) => Some(select.joined_value()),
            _ => None,
        }
    }

    fn clear_files(&self) {
        if let WidgetState::File { files } = &mut *self.state.borrow_mut() {
            files.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::options::tests::FakeHttpClient;
    use futures::executor::block_on;
    use serde_json::json;

    fn loader() -> OptionLoader {
        OptionLoader::new(FakeHttpClient::failing())
    }

    fn mount(field: FieldDescriptor, record: serde_json::Value) -> Rc<FieldWidget> {
        let (widget, pending) =
            FieldWidget::mount(Rc::new(field), &DataRecord::from_value(record), &loader());
        assert!(pending.is_none());
        widget
    }

    #[test]
    fn test_dispatch_is_case_insensitive() {
        let widget = mount(FieldDescriptor::new("agree", " CheckBox "), json!({"agree": "Y"}));
        assert!(matches!(*widget.state(), WidgetState::CheckBox(_)));
        assert_eq!(widget.current_value(), HandleValue::Scalar(Primitive::string("Y")));
    }

    #[test]
    fn test_unknown_kind_is_read_only_fallback() {
        let widget = mount(FieldDescriptor::new("spark", "sparkline"), json!({"spark": 3}));
        assert!(matches!(*widget.state(), WidgetState::Fallback { .. }));
        assert!(!widget.is_editable());
        assert!(matches!(widget.set_text("x"), Err(FormError::Unsupported { .. })));
        assert_eq!(widget.current_value().to_text(), "3");
    }

    #[test]
    fn test_mount_derives_presentation() {
        let mut field = FieldDescriptor::new("note", "text");
        field.tooltip = Some("line one\\nline two".to_string());
        field.style = Some(
            serde_json::from_value(json!({"width": "80px", "CLASS": "wide, bold"})).unwrap(),
        );
        field.widget_parameter.caption_position = Some(CaptionPosition::Top);

        let widget = mount(field, json!({}));
        assert_eq!(widget.tooltip(), Some("line one\r\nline two"));
        assert_eq!(widget.style().get("width"), Some("80px"));
        assert!(widget.style().classes.contains("bold"));
        assert_eq!(widget.caption_position(), CaptionPosition::Top);
    }

    #[test]
    fn test_read_only_field_rejects_input() {
        let mut field = FieldDescriptor::new("code", "text");
        field.editable = false;
        let widget = mount(field, json!({"code": "A1"}));
        assert!(matches!(widget.set_text("B2"), Err(FormError::ReadOnly(_))));
        assert_eq!(widget.current_value().to_text(), "A1");

        widget.set_external_value(&Primitive::string("C3")).unwrap();
        assert_eq!(widget.current_value().to_text(), "C3");
    }

    #[test]
    fn test_bad_date_keeps_committed_value() {
        let mut field = FieldDescriptor::new("due", "date");
        field.widget_parameter.format = Some(json!(1));
        let widget = mount(field, json!({"due": "2024-01-05T10:00:00"}));
        assert_eq!(widget.current_value().to_text(), "2024-01-05");

        assert!(widget.input_date("2024-02-31").is_err());
        assert!(widget.date_error().is_some());
        assert_eq!(widget.current_value().to_text(), "2024-01-05");

        widget.set_text("2024-03-01").unwrap();
        assert_eq!(widget.date_error(), None);
        assert_eq!(widget.current_value().to_text(), "2024-03-01");
    }

    #[test]
    fn test_embedded_options_apply_at_mount() {
        let mut field = FieldDescriptor::new("tags", "listbox");
        field.widget_parameter.data = Some(json!(["a", "b", "c"]));
        let widget = mount(field, json!({"tags": "c,a"}));

        assert_eq!(
            widget.current_value(),
            HandleValue::List(vec![Primitive::string("a"), Primitive::string("c")])
        );
        assert_eq!(widget.selection().as_deref(), Some("a,c"));
        assert!(widget.toggle_option("b").unwrap());
        assert_eq!(widget.selection().as_deref(), Some("a,b,c"));
    }

    #[test]
    fn test_remote_options_arrive_after_mount() {
        let client = FakeHttpClient::answering(json!({"data": ["x", "y"]}));
        let loader = OptionLoader::new(client);
        let mut field = FieldDescriptor::new("pick", "advancedCombo");
        field.widget_parameter.data_url = Some("/codes".to_string());

        let (widget, pending) = FieldWidget::mount(
            Rc::new(field),
            &DataRecord::from_value(json!({"pick": "y"})),
            &loader,
        );
        assert_eq!(widget.selection().as_deref(), Some(""));

        block_on(pending.unwrap());
        assert_eq!(widget.selection().as_deref(), Some("y"));
        assert_eq!(widget.options().len(), 2);
    }

    #[test]
    fn test_pending_load_after_unmount_is_harmless() {
        let loader = OptionLoader::new(FakeHttpClient::answering(json!({"data": ["x"]})));
        let mut field = FieldDescriptor::new("pick", "combo");
        field.widget_parameter.data_url = Some("/codes".to_string());

        let (widget, pending) = FieldWidget::mount(Rc::new(field), &DataRecord::new(), &loader);
        drop(widget);
        block_on(pending.unwrap());
    }

    #[test]
    fn test_file_selection_and_clear() {
        let widget = mount(FieldDescriptor::new("scan", "file"), json!({}));
        widget
            .set_files(vec![FileEntry::new("a.pdf", "/tmp/a.pdf")])
            .unwrap();
        assert_eq!(widget.current_value().to_text(), "a.pdf");
        widget.clear_files();
        assert!(widget.current_value().is_empty());
    }

    #[test]
    fn test_load_record_refreshes_values() {
        let widget = mount(FieldDescriptor::new("title", "text"), json!({"title": "old"}));
        widget.load_record(&DataRecord::from_value(json!({"title": "new"})));
        assert_eq!(widget.current_value().to_text(), "new");
    }
}
