//! Form Container
//!
//! Mounts a schema against a record, owns the resulting widgets and wires
//! their handles into a [`FormAggregator`].

use std::rc::Rc;

use indexmap::IndexMap;

use super::aggregator::{FormAggregator, MultipartPayload};
use super::config::FormConfig;
use super::error::Result;
use super::handle::{FieldHandle, FileSource};
use super::layout::partition_rows;
use super::options::OptionLoader;
use super::registry::WidgetRegistry;
use super::schema::FormSchema;
use super::value::DataRecord;
use super::widget::{FieldWidget, PendingLoad};

/// A mounted form.
///
/// # Example
///
/// ```rust,ignore
/// let schema = FormSchema::from_json_str(schema_json)?;
/// let record = DataRecord::from_value(serde_json::from_str(record_json)?);
/// let loader = OptionLoader::from_config(Rc::new(ReqwestHttpClient::new()), &config);
///
/// let (form, pending) = Form::mount(&schema, &record, &loader, &config);
/// futures::future::join_all(pending).await;
///
/// form.widget("title").unwrap().set_text("Hello")?;
/// let payload = form.serialize()?;
/// ```
#[derive(Debug)]
pub struct Form {
    widgets: IndexMap<String, Rc<FieldWidget>>,
    aggregator: FormAggregator,
    columns: usize,
}

impl Form {
    /// Mount every field of `schema` against `record`.
    ///
    /// Returns the form and the option loads still in flight. The loads are
    /// independent; drive them on the UI executor in any order.
    pub fn mount(
        schema: &FormSchema,
        record: &DataRecord,
        loader: &OptionLoader,
        config: &FormConfig,
    ) -> (Self, Vec<PendingLoad>) {
        Self::mount_with_registry(schema, record, loader, config, WidgetRegistry::default())
    }

    /// Like [`Form::mount`], reading value shapes from `registry`
    pub fn mount_with_registry(
        schema: &FormSchema,
        record: &DataRecord,
        loader: &OptionLoader,
        config: &FormConfig,
        registry: WidgetRegistry,
    ) -> (Self, Vec<PendingLoad>) {
        let mut form = Form {
            widgets: IndexMap::with_capacity(schema.fields.len()),
            aggregator: FormAggregator::new(registry),
            columns: schema.columns.unwrap_or(config.columns),
        };
        form.aggregator.set_record(record);

        let mut pending = Vec::new();
        for field in &schema.fields {
            let (widget, load) = FieldWidget::mount(Rc::new(field.clone()), record, loader);
            let handle: Rc<dyn FieldHandle> = widget.clone();
            form.aggregator.register(field, Rc::downgrade(&handle));
            form.widgets.insert(field.name.clone(), widget);
            pending.extend(load);
        }

        ::log::debug!(
            "[form] mounted {} fields, {} option lists pending",
            form.widgets.len(),
            pending.len()
        );
        (form, pending)
    }

    /// Get a mounted widget by field name
    pub fn widget(&self, name: &str) -> Option<&Rc<FieldWidget>> {
        self.widgets.get(name)
    }

    /// Mounted widgets in schema order
    pub fn widgets(&self) -> impl Iterator<Item = &Rc<FieldWidget>> {
        self.widgets.values()
    }

    pub fn aggregator(&self) -> &FormAggregator {
        &self.aggregator
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Widgets packed into rows
    pub fn rows(&self) -> Vec<Vec<&Rc<FieldWidget>>> {
        partition_rows(self.widgets.values(), self.columns, |w| {
            w.kind().is_group_title()
        })
    }

    /// Load another record into the mounted widgets
    pub fn set_record(&mut self, record: &DataRecord) {
        self.aggregator.set_record(record);
        for widget in self.widgets.values() {
            widget.load_record(record);
        }
    }

    /// Names of required fields that have no value
    pub fn missing_required(&self) -> Vec<&str> {
        self.widgets
            .values()
            .filter(|w| w.is_missing())
            .map(|w| w.name())
            .collect()
    }

    /// Unmount one field. Returns false if no such field is mounted.
    pub fn unmount_field(&mut self, name: &str) -> bool {
        self.aggregator.deregister(name);
        self.widgets.shift_remove(name).is_some()
    }

    /// Unmount every field. Option loads still in flight complete without
    /// effect.
    pub fn unmount(&mut self) {
        self.aggregator.clear();
        self.widgets.clear();
    }

    /// Flat JSON payload of the current values
    pub fn serialize(&self) -> Result<String> {
        self.aggregator.serialize()
    }

    /// Multipart payload of the current values
    pub async fn serialize_multipart(&self, files: &dyn FileSource) -> MultipartPayload {
        self.aggregator.serialize_multipart(files).await
    }
}
