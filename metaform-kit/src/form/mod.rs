//! Metadata-driven form engine
//!
//! A backend describes a form as a list of field descriptors: widget kind,
//! caption, value source, style, flags and widget parameters. This module
//! mounts such a description against a data record, keeps the live state of
//! every field, and turns that state back into a payload on demand.
//!
//! # Architecture
//!
//! ```text
//!   FormSchema + DataRecord
//!            ↓
//!          Form ──────────────→ OptionLoader ──→ HttpClient
//!            ↓                       │
//!       FieldWidget (per field)  OptionCache
//!   ┌────────┼─────────┐
//!   │        │         │
//! format   style    tooltip
//!            ↓
//!     WidgetState (checkbox, select, date, ...)
//!            ↓  weak FieldHandle
//!      FormAggregator
//!            ↓
//!   flat JSON / MultipartPayload
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use metaform_kit::form::*;
//!
//! let config = FormConfig::from_path("form.json")?;
//! let client = Rc::new(ReqwestHttpClient::from_config(&config)?);
//! let loader = OptionLoader::from_config(client, &config);
//!
//! let schema = FormSchema::from_json_str(schema_json)?;
//! let (form, pending) = Form::mount(&schema, &record, &loader, &config);
//! futures::future::join_all(pending).await;
//!
//! println!("{}", form.serialize()?);
//! ```

mod aggregator;
mod checkbox;
mod config;
mod container;
mod datetime;
mod error;
mod format;
mod handle;
mod http;
mod layout;
mod options;
mod registry;
mod schema;
mod select;
mod style;
mod tooltip;
mod value;
mod widget;

pub use aggregator::*;
pub use checkbox::*;
pub use config::*;
pub use container::*;
pub use datetime::*;
pub use error::*;
pub use format::*;
pub use handle::*;
pub use http::*;
pub use layout::*;
pub use options::*;
pub use registry::*;
pub use schema::*;
pub use select::*;
pub use style::*;
pub use tooltip::*;
pub use value::*;
pub use widget::*;
