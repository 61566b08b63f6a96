//! Form Aggregator
//!
//! Collects the live values of mounted fields into a payload. The aggregator
//! holds no field data of its own: each mounted widget registers a weak
//! [`FieldHandle`] and is asked for its value only when a payload is built.
//!
//! Two payloads are available:
//!
//! - [`FormAggregator::serialize`]: a flat JSON object of strings, always
//!   starting with the record's `id`.
//! - [`FormAggregator::serialize_multipart`]: the same keys as parts, with
//!   file fields expanded into `<key>_FILES_<i>` binary parts.

use std::rc::Weak;

use futures::future::join_all;
use indexmap::IndexMap;

use super::error::{FormError, Result};
use super::format::value_text;
use super::handle::{FieldHandle, FileSource, HandleValue};
use super::registry::{ValueShape, WidgetKind, WidgetRegistry};
use super::schema::FieldDescriptor;
use super::value::DataRecord;

/// Key of the synthetic record id entry
pub const ID_KEY: &str = "id";

struct Entry {
    key: String,
    kind: WidgetKind,
    handle: Weak<dyn FieldHandle>,
}

/// Read-only collector of field handles.
pub struct FormAggregator {
    entries: IndexMap<String, Entry>,
    record_id: Option<String>,
    registry: WidgetRegistry,
}

impl Default for FormAggregator {
    fn default() -> Self {
        Self::new(WidgetRegistry::default())
    }
}

impl std::fmt::Debug for FormAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormAggregator")
            .field("fields", &self.entries.keys().collect::<Vec<_>>())
            .field("record_id", &self.record_id)
            .finish()
    }
}

impl FormAggregator {
    pub fn new(registry: WidgetRegistry) -> Self {
        FormAggregator {
            entries: IndexMap::new(),
            record_id: None,
            registry,
        }
    }

    /// Register the handle of a freshly mounted field
    pub fn register(&mut self, field: &FieldDescriptor, handle: Weak<dyn FieldHandle>) {
        let entry = Entry {
            key: field.report_key().to_string(),
            kind: WidgetKind::parse(&field.widget_kind),
            handle,
        };
        if self.entries.insert(field.name.clone(), entry).is_some() {
            ::log::warn!("[form] field '{}' registered twice", field.name);
        }
    }

    /// Forget a field. Returns false if it was not registered.
    pub fn deregister(&mut self, name: &str) -> bool {
        self.entries.shift_remove(name).is_some()
    }

    /// Forget every field
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remember the id of the record the form was loaded with
    pub fn set_record(&mut self, record: &DataRecord) {
        self.record_id = record.get_present(ID_KEY).map(value_text);
    }

    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    /// Names of registered fields, in mount order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Walk live handles, skipping dropped ones and kinds that report nothing
    fn live(&self) -> impl Iterator<Item = (&Entry, ValueShape, std::rc::Rc<dyn FieldHandle>)> {
        self.entries.iter().filter_map(|(name, entry)| {
            let shape = self.registry.value_shape(&entry.kind);
            if shape == ValueShape::None {
                return None;
            }
            match entry.handle.upgrade() {
                Some(handle) => Some((entry, shape, handle)),
                None => {
                    ::log::debug!("[form] skipping '{}', its widget is gone", name);
                    None
                }
            }
        })
    }

    /// Current values keyed by report key, after the synthetic `id`.
    ///
    /// A field reporting under `id` replaces the synthetic entry.
    pub fn to_map(&self) -> IndexMap<String, String> {
        let mut map = IndexMap::with_capacity(self.entries.len() + 1);
        map.insert(ID_KEY.to_string(), self.record_id.clone().unwrap_or_default());

        for (entry, shape, handle) in self.live() {
            let text = match shape {
                ValueShape::Selection => handle
                    .selection()
                    .unwrap_or_else(|| handle.current_value().to_text()),
                _ => handle.current_value().to_text(),
            };
            map.insert(entry.key.clone(), text);
        }
        map
    }

    /// Flat JSON payload
    pub fn serialize(&self) -> Result<String> {
        serde_json::to_string(&self.to_map()).map_err(|source| FormError::Encode {
            what: "form payload",
            source,
        })
    }

    /// Multipart payload. File contents are read through `files`; a file
    /// that cannot be read is reported in `failures` and its field is
    /// cleared, while every other part is still produced.
    pub async fn serialize_multipart(&self, files: &dyn FileSource) -> MultipartPayload {
        let mut payload = MultipartPayload::default();
        payload.push_text(ID_KEY, self.record_id.clone().unwrap_or_default());

        for (entry, shape, handle) in self.live() {
            let value = handle.current_value();
            let selected = match (shape, value) {
                (ValueShape::Files, HandleValue::Files(selected)) => selected,
                (ValueShape::Selection, value) => {
                    let text = handle.selection().unwrap_or_else(|| value.to_text());
                    payload.push_text(&entry.key, text);
                    continue;
                }
                (_, value) => {
                    payload.push_text(&entry.key, value.to_text());
                    continue;
                }
            };

            if selected.is_empty() {
                payload.push_text(&entry.key, String::new());
                continue;
            }

            let reads = join_all(selected.iter().map(|file| files.read(file))).await;
            let mut failed = false;
            for (index, (file, read)) in selected.iter().zip(reads).enumerate() {
                match read {
                    Ok(bytes) => payload.parts.push(Part {
                        name: format!("{}_FILES_{}", entry.key, index),
                        body: PartBody::File {
                            file_name: file.name.clone(),
                            bytes,
                        },
                    }),
                    Err(source) => {
                        let err = FormError::FileRead {
                            name: file.name.clone(),
                            source,
                        };
                        ::log::error!("[form] {}", err);
                        payload.failures.push(err.to_string());
                        failed = true;
                    }
                }
            }
            if failed {
                handle.clear_files();
            }
        }

        payload
    }
}

/// Content of one multipart part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartBody {
    Text(String),
    File { file_name: String, bytes: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub body: PartBody,
}

/// Parts in field order plus user-facing messages for unreadable files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartPayload {
    pub parts: Vec<Part>,
    pub failures: Vec<String>,
}

impl MultipartPayload {
    fn push_text(&mut self, name: &str, text: String) {
        self.parts.push(Part {
            name: name.to_string(),
            body: PartBody::Text(text),
        });
    }

    /// Find a part by name
    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }

    pub fn part_names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.name.as_str()).collect()
    }

    /// Whether every file was read
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Build a `reqwest` multipart form for sending
    pub fn into_form(self) -> reqwest::multipart::Form {
        self.parts
            .into_iter()
            .fold(reqwest::multipart::Form::new(), |form, part| match part.body {
                PartBody::Text(text) => form.text(part.name, text),
                PartBody::File { file_name, bytes } => form.part(
                    part.name,
                    reqwest::multipart::Part::bytes(bytes).file_name(file_name),
                ),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::handle::FileEntry;
    use crate::form::value::Primitive;
    use futures::FutureExt;
    use futures::executor::block_on;
    use futures::future::LocalBoxFuture;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    struct StubHandle {
        value: RefCell<HandleValue>,
        selection: Option<String>,
    }

    impl StubHandle {
        fn scalar(text: &str) -> Rc<Self> {
            Rc::new(StubHandle {
                value: RefCell::new(HandleValue::Scalar(Primitive::string(text))),
                selection: None,
            })
        }

        fn files(names: &[&str]) -> Rc<Self> {
            let files = names
                .iter()
                .map(|n| FileEntry::new(*n, format!("/uploads/{n}")))
                .collect();
            Rc::new(StubHandle {
                value: RefCell::new(HandleValue::Files(files)),
                selection: None,
            })
        }
    }

    impl FieldHandle for StubHandle {
        fn current_value(&self) -> HandleValue {
            self.value.borrow().clone()
        }

        fn selection(&self) -> Option<String> {
            self.selection.clone()
        }

        fn clear_files(&self) {
            *self.value.borrow_mut() = HandleValue::Files(Vec::new());
        }
    }

    /// Serves file content from memory; names starting with `bad` fail.
    struct MemoryFiles;

    impl FileSource for MemoryFiles {
        fn read(&self, file: &FileEntry) -> LocalBoxFuture<'static, io::Result<Vec<u8>>> {
            let result = if file.name.starts_with("bad") {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            } else {
                Ok(file.name.as_bytes().to_vec())
            };
            futures::future::ready(result).boxed_local()
        }
    }

    fn register(aggregator: &mut FormAggregator, field: FieldDescriptor, handle: &Rc<StubHandle>) {
        let handle: Rc<dyn FieldHandle> = handle.clone();
        aggregator.register(&field, Rc::downgrade(&handle));
    }

    fn with_data_field(name: &str, kind: &str, data_field: &str) -> FieldDescriptor {
        let mut field = FieldDescriptor::new(name, kind);
        field.data_field = Some(data_field.to_string());
        field
    }

    #[test]
    fn test_flat_map_keys_and_id() {
        let mut aggregator = FormAggregator::default();
        aggregator.set_record(&DataRecord::from_value(json!({"id": 42})));

        let title = StubHandle::scalar("Hello");
        let status = StubHandle::scalar("open");
        let save = StubHandle::scalar("ignored");
        register(&mut aggregator, FieldDescriptor::new("title", "text"), &title);
        register(&mut aggregator, with_data_field("status", "combo", "STATUS_CD"), &status);
        register(&mut aggregator, FieldDescriptor::new("save", "button"), &save);

        let map = aggregator.to_map();
        let pairs: Vec<(&str, &str)> = map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            pairs,
            vec![("id", "42"), ("title", "Hello"), ("STATUS_CD", "open")]
        );
    }

    #[test]
    fn test_missing_id_is_empty_and_field_can_override() {
        let mut aggregator = FormAggregator::default();
        assert_eq!(aggregator.to_map().get("id").map(String::as_str), Some(""));

        let id = StubHandle::scalar("7");
        register(&mut aggregator, FieldDescriptor::new("id", "text"), &id);
        assert_eq!(aggregator.serialize().unwrap(), r#"{"id":"7"}"#);
    }

    #[test]
    fn test_selection_accessor_is_used() {
        let mut aggregator = FormAggregator::default();
        let handle = Rc::new(StubHandle {
            value: RefCell::new(HandleValue::List(vec![Primitive::string("ignored")])),
            selection: Some("a,b".to_string()),
        });
        register(&mut aggregator, FieldDescriptor::new("tags", "advancedCombo"), &handle);
        assert_eq!(aggregator.to_map().get("tags").map(String::as_str), Some("a,b"));
    }

    #[test]
    fn test_dropped_handles_are_skipped() {
        let mut aggregator = FormAggregator::default();
        let handle = StubHandle::scalar("x");
        register(&mut aggregator, FieldDescriptor::new("gone", "text"), &handle);
        drop(handle);
        assert_eq!(aggregator.to_map().len(), 1);

        assert!(aggregator.deregister("gone"));
        assert!(!aggregator.deregister("gone"));
    }

    #[test]
    fn test_multipart_file_expansion() {
        let mut aggregator = FormAggregator::default();
        let none = StubHandle::files(&[]);
        let two = StubHandle::files(&["a.pdf", "b.pdf"]);
        let title = StubHandle::scalar("Report");
        register(&mut aggregator, FieldDescriptor::new("empty", "file"), &none);
        register(&mut aggregator, FieldDescriptor::new("docs", "file"), &two);
        register(&mut aggregator, FieldDescriptor::new("title", "text"), &title);

        let payload = block_on(aggregator.serialize_multipart(&MemoryFiles));
        assert_eq!(
            payload.part_names(),
            vec!["id", "empty", "docs_FILES_0", "docs_FILES_1", "title"]
        );
        assert_eq!(payload.part("empty").unwrap().body, PartBody::Text(String::new()));
        assert_eq!(
            payload.part("docs_FILES_1").unwrap().body,
            PartBody::File {
                file_name: "b.pdf".to_string(),
                bytes: b"b.pdf".to_vec(),
            }
        );
        assert!(payload.is_complete());
    }

    #[test]
    fn test_multipart_read_failure_is_isolated() {
        let mut aggregator = FormAggregator::default();
        let docs = StubHandle::files(&["a.pdf", "bad.pdf", "c.pdf"]);
        let other = StubHandle::files(&["d.pdf"]);
        register(&mut aggregator, FieldDescriptor::new("docs", "file"), &docs);
        register(&mut aggregator, FieldDescriptor::new("other", "file"), &other);

        let payload = block_on(aggregator.serialize_multipart(&MemoryFiles));
        assert_eq!(
            payload.part_names(),
            vec!["id", "docs_FILES_0", "docs_FILES_2", "other_FILES_0"]
        );
        assert_eq!(payload.failures.len(), 1);
        assert!(payload.failures[0].contains("bad.pdf"));

        assert_eq!(docs.current_value(), HandleValue::Files(Vec::new()));
        assert!(!other.current_value().is_empty());
    }

    #[test]
    fn test_into_form_builds() {
        let payload = MultipartPayload {
            parts: vec![Part {
                name: "id".to_string(),
                body: PartBody::Text("1".to_string()),
            }],
            failures: Vec::new(),
        };
        assert!(!payload.into_form().boundary().is_empty());
    }
}
