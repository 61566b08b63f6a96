//! Option Source Resolver
//!
//! Choice widgets (combo, advanced combo, list box) show a list of
//! [`OptionEntry`]s. The list comes from one of:
//!
//! - `widgetParameter.data`: embedded scalars, objects, or a JSON string
//!   encoding either,
//! - `widgetParameter.dataUrl`: a remote source answering `{ "data": [...] }`
//!   to a POST carrying the request flag,
//! - nothing, which yields an empty list and a warning.
//!
//! Remote lists can be kept in an [`OptionCache`] shared across mounts. The
//! cache holds one in-flight load per `(field, url)` so concurrent mounts
//! never fetch twice, and writes the result exactly once when it lands.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use serde_json::{Map, Value};

use super::config::FormConfig;
use super::format::value_text;
use super::http::HttpClient;
use super::schema::{FieldDescriptor, WidgetParameter};
use super::value::Primitive;

/// A normalized choice.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionEntry {
    /// Value reported when selected
    pub value: Primitive,

    /// Text shown to the user
    pub display: String,
}

impl OptionEntry {
    /// Create a new option entry
    pub fn new(value: impl Into<Primitive>, display: impl Into<String>) -> Self {
        OptionEntry {
            value: value.into(),
            display: display.into(),
        }
    }

    /// The value as text, used to match comma-joined selections
    pub fn key(&self) -> String {
        self.value.to_text()
    }
}

/// Names of the sub-keys that carry an option's value and display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueMapping {
    pub value: String,
    pub display: String,
}

impl Default for ValueMapping {
    fn default() -> Self {
        ValueMapping {
            value: "value".to_string(),
            display: "display".to_string(),
        }
    }
}

impl ValueMapping {
    /// Read the `values` parameter: an object, or a JSON string encoding one.
    ///
    /// Missing keys keep their default name. Anything unreadable falls back
    /// to the default mapping with a warning.
    pub fn from_param(values: Option<&Value>) -> Self {
        match values {
            None | Some(Value::Null) => ValueMapping::default(),
            Some(Value::Object(map)) => Self::from_object(map),
            Some(Value::String(s)) if s.trim().is_empty() => ValueMapping::default(),
            Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(map)) => Self::from_object(&map),
                _ => {
                    ::log::warn!("[options] ignoring unreadable values mapping: {}", s);
                    ValueMapping::default()
                }
            },
            Some(other) => {
                ::log::warn!("[options] ignoring values mapping of unexpected shape: {}", other);
                ValueMapping::default()
            }
        }
    }

    fn from_object(map: &Map<String, Value>) -> Self {
        let pick = |key: &str, fallback: String| {
            map.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .unwrap_or(fallback)
        };
        let default = ValueMapping::default();
        ValueMapping {
            value: pick("value", default.value),
            display: pick("display", default.display),
        }
    }
}

/// Normalize raw option data into entries.
///
/// - scalars become `value = display = text`,
/// - objects that already carry `value` and `display` pass through,
/// - other objects are read through `mapping`,
/// - a JSON string is decoded first.
pub fn normalize_options(data: &Value, mapping: &ValueMapping) -> Vec<OptionEntry> {
    match data {
        Value::Null => Vec::new(),
        Value::Array(items) => normalize_items(items, mapping),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => normalize_items(&items, mapping),
            _ => {
                ::log::warn!("[options] option data is not a JSON array: {}", s);
                Vec::new()
            }
        },
        other => {
            ::log::warn!("[options] option data must be an array, got: {}", other);
            Vec::new()
        }
    }
}

fn normalize_items(items: &[Value], mapping: &ValueMapping) -> Vec<OptionEntry> {
    let canonical = items.iter().all(|item| match item {
        Value::Object(obj) => obj.contains_key("value") && obj.contains_key("display"),
        _ => true,
    });
    let default_mapping = ValueMapping::default();
    let mapping = if canonical { &default_mapping } else { mapping };

    items
        .iter()
        .map(|item| match item {
            Value::Object(obj) => {
                let value = obj
                    .get(&mapping.value)
                    .map(Primitive::from_json)
                    .unwrap_or_default();
                let display = obj
                    .get(&mapping.display)
                    .map(value_text)
                    .unwrap_or_else(|| value.to_text());
                OptionEntry { value, display }
            }
            scalar => {
                let text = value_text(scalar);
                OptionEntry::new(text.clone(), text)
            }
        })
        .collect()
}

/// Where a field's options come from.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionSource {
    /// Options are embedded in the schema
    Embedded(Value),
    /// Options are fetched from this URL
    Remote(String),
    /// Neither `data` nor `dataUrl` is declared
    Missing,
}

impl OptionSource {
    /// Pick the source declared by a field's parameters; embedded data wins
    pub fn of(param: &WidgetParameter) -> Self {
        if let Some(data) = param.embedded_data() {
            OptionSource::Embedded(data.clone())
        } else if let Some(url) = param.remote_url() {
            OptionSource::Remote(url.to_string())
        } else {
            OptionSource::Missing
        }
    }
}

/// Identity of a remote option list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub field: String,
    pub url: String,
}

impl CacheKey {
    pub fn new(field: impl Into<String>, url: impl Into<String>) -> Self {
        CacheKey {
            field: field.into(),
            url: url.into(),
        }
    }
}

type SharedLoad = Shared<LocalBoxFuture<'static, Option<Rc<Vec<OptionEntry>>>>>;

enum Slot {
    InFlight(SharedLoad),
    Ready(Rc<Vec<OptionEntry>>),
}

enum Lookup {
    Ready(Rc<Vec<OptionEntry>>),
    Pending(SharedLoad),
}

/// Remote option lists shared across mounts.
///
/// A failed load leaves no trace, so the next mount fetches again.
#[derive(Default)]
pub struct OptionCache {
    slots: RefCell<HashMap<CacheKey, Slot>>,
}

impl std::fmt::Debug for OptionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.borrow();
        let ready = slots
            .values()
            .filter(|s| matches!(s, Slot::Ready(_)))
            .count();
        f.debug_struct("OptionCache")
            .field("ready", &ready)
            .field("in_flight", &(slots.len() - ready))
            .finish()
    }
}

impl OptionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a loaded list
    pub fn get(&self, key: &CacheKey) -> Option<Rc<Vec<OptionEntry>>> {
        match self.slots.borrow().get(key) {
            Some(Slot::Ready(entries)) => Some(entries.clone()),
            _ => None,
        }
    }

    /// Store a list. Writing the same list again is harmless.
    pub fn insert(&self, key: CacheKey, entries: Vec<OptionEntry>) {
        self.slots
            .borrow_mut()
            .insert(key, Slot::Ready(Rc::new(entries)));
    }

    /// Check whether a load for `key` is running
    pub fn is_in_flight(&self, key: &CacheKey) -> bool {
        matches!(self.slots.borrow().get(key), Some(Slot::InFlight(_)))
    }

    /// Forget one list so the next mount fetches it again
    pub fn invalidate(&self, key: &CacheKey) {
        self.slots.borrow_mut().remove(key);
    }

    /// Forget everything
    pub fn clear(&self) {
        self.slots.borrow_mut().clear();
    }

    /// Number of loaded or in-flight lists
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }

    /// Return the cached list, join the running load, or start `fetch`.
    fn lookup_or_start(
        self: &Rc<Self>,
        key: &CacheKey,
        fetch: LocalBoxFuture<'static, Option<Rc<Vec<OptionEntry>>>>,
    ) -> Lookup {
        let mut slots = self.slots.borrow_mut();
        match slots.get(key) {
            Some(Slot::Ready(entries)) => {
                ::log::debug!("[options] cache hit for '{}' ({})", key.field, key.url);
                return Lookup::Ready(entries.clone());
            }
            Some(Slot::InFlight(load)) => {
                ::log::debug!("[options] joining in-flight load for '{}'", key.field);
                return Lookup::Pending(load.clone());
            }
            None => {}
        }

        let cache = Rc::downgrade(self);
        let settle_key = key.clone();
        let load = async move {
            let result = fetch.await;
            settle(&cache, settle_key, result.clone());
            result
        }
        .boxed_local()
        .shared();

        slots.insert(key.clone(), Slot::InFlight(load.clone()));
        Lookup::Pending(load)
    }
}

fn settle(cache: &Weak<OptionCache>, key: CacheKey, result: Option<Rc<Vec<OptionEntry>>>) {
    let Some(cache) = cache.upgrade() else {
        return;
    };
    let mut slots = cache.slots.borrow_mut();
    match result {
        Some(entries) => {
            slots.insert(key, Slot::Ready(entries));
        }
        None => {
            slots.remove(&key);
        }
    }
}

/// Result of resolving a field's options.
pub enum OptionLoad {
    /// Known at mount time
    Ready(Vec<OptionEntry>),
    /// Arrives later; resolves to an empty list on failure
    Pending(LocalBoxFuture<'static, Vec<OptionEntry>>),
}

impl OptionLoad {
    /// Wait for the entries, whichever way they come
    pub async fn entries(self) -> Vec<OptionEntry> {
        match self {
            OptionLoad::Ready(entries) => entries,
            OptionLoad::Pending(load) => load.await,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, OptionLoad::Pending(_))
    }
}

/// Resolves option lists for choice fields.
#[derive(Clone)]
pub struct OptionLoader {
    client: Rc<dyn HttpClient>,
    cache: Option<Rc<OptionCache>>,
    request_flag: String,
}

impl OptionLoader {
    /// Create a loader without a shared cache; every mount fetches
    pub fn new(client: Rc<dyn HttpClient>) -> Self {
        OptionLoader {
            client,
            cache: None,
            request_flag: FormConfig::default().option_request_flag,
        }
    }

    /// Create a loader following the engine configuration
    pub fn from_config(client: Rc<dyn HttpClient>, config: &FormConfig) -> Self {
        let loader = OptionLoader {
            client,
            cache: None,
            request_flag: config.option_request_flag.clone(),
        };
        if config.share_option_cache {
            loader.with_cache(Rc::new(OptionCache::new()))
        } else {
            loader
        }
    }

    /// Share fetched lists through `cache`
    pub fn with_cache(mut self, cache: Rc<OptionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&Rc<OptionCache>> {
        self.cache.as_ref()
    }

    /// Body posted to remote option sources
    pub fn request_body(&self) -> Value {
        let mut body = Map::new();
        body.insert(self.request_flag.clone(), Value::Bool(true));
        Value::Object(body)
    }

    /// Resolve the options of `field`.
    pub fn resolve(&self, field: &FieldDescriptor) -> OptionLoad {
        let param = &field.widget_parameter;
        let mapping = ValueMapping::from_param(param.values.as_ref());

        match OptionSource::of(param) {
            OptionSource::Embedded(data) => OptionLoad::Ready(normalize_options(&data, &mapping)),
            OptionSource::Missing => {
                ::log::warn!(
                    "[options] field '{}' declares neither data nor dataUrl",
                    field.name
                );
                OptionLoad::Ready(Vec::new())
            }
            OptionSource::Remote(url) => self.resolve_remote(&field.name, url, mapping),
        }
    }

    fn resolve_remote(&self, field: &str, url: String, mapping: ValueMapping) -> OptionLoad {
        let fetch = fetch_options(
            self.client.clone(),
            field.to_string(),
            url.clone(),
            self.request_body(),
            mapping,
        )
        .boxed_local();

        let Some(cache) = &self.cache else {
            return OptionLoad::Pending(
                async move { fetch.await.map(|e| Vec::clone(&e)).unwrap_or_default() }
                    .boxed_local(),
            );
        };

        match cache.lookup_or_start(&CacheKey::new(field, url), fetch) {
            Lookup::Ready(entries) => OptionLoad::Ready(Vec::clone(&entries)),
            Lookup::Pending(load) => OptionLoad::Pending(
                async move { load.await.map(|e| Vec::clone(&e)).unwrap_or_default() }
                    .boxed_local(),
            ),
        }
    }
}

/// POST to a remote option source and normalize `data` from the answer.
///
/// Failures are logged and yield `None`; there is no retry.
async fn fetch_options(
    client: Rc<dyn HttpClient>,
    field: String,
    url: String,
    body: Value,
    mapping: ValueMapping,
) -> Option<Rc<Vec<OptionEntry>>> {
    match client.post(&url, body).await {
        Ok(response) => {
            let entries = match response.get("data") {
                Some(data) => normalize_options(data, &mapping),
                None => Vec::new(),
            };
            ::log::debug!(
                "[options] loaded {} options for '{}' from {}",
                entries.len(),
                field,
                url
            );
            Some(Rc::new(entries))
        }
        Err(err) => {
            ::log::error!("[options] failed to load options for '{}': {}", field, err);
            None
        }
    }
}
