//! # Description
//!
//! Metaform Kit renders data-entry forms from a declarative field schema
//! produced by a backend. It resolves each field to a widget behavior,
//! normalizes values and option lists into a uniform display model, keeps
//! small per-widget state machines, and collects live widget state back into
//! a JSON or multipart payload when asked.
//!
//! # Features
//!
//! - Lenient schema decoding for the spellings backends actually emit.
//! - Option lists from embedded data or a remote source, with a shared cache.
//! - Checkbox, multi-select and date box state machines.
//! - Row layout with group titles.
//! - Flat JSON and multipart (`reqwest`) payloads.
//!
//! Presentation is left to the embedding UI; see [`form`] for the engine.

pub mod form;
