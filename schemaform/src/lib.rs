//! # schemaform
//!
//! A schema-driven form engine: JSON Schema in, form state, validation and a
//! render plan out.
//!
//! A form is described by a data schema (types, constraints, defaults) and a
//! sparser presentation schema keyed by the same dotted field paths
//! (`ui:widget`, `ui:options`, layout sections, button options). The engine
//! keeps a flat, dotted-path keyed edit state, builds the nested output tree
//! on demand and validates every leaf into a per-field error map.
//!
//! ## Features
//!
//! - Default extraction and normalization of prefilled data (date formatting)
//! - Flat edit state with schema-driven unflattening, extra fields preserved
//! - Validation: required, email, pattern, length, date ranges, numeric
//!   bounds, empty array slots, file type and size
//! - Field resolution into built-in controls, custom fields, custom widgets
//!   or an inline "unsupported" notice, drawn by a host [`render::Backend`]
//! - Injected widget, field and template registries
//! - JSON and TOML input files
//!
//! ## Quick Start
//!
//! ```rust
//! use schemaform::{FormBuilder, FormController, render::text::TextBackend};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "required": ["email"],
//!     "properties": {"email": {"type": "string", "format": "email"}}
//! });
//! let mut form: FormController = FormBuilder::from_json(&schema, &json!(null))
//!     .unwrap()
//!     .build();
//!
//! form.on_field_change("email", "someone@example.com");
//! assert!(form.submit().is_submitted());
//!
//! let outline = form.render(&TextBackend);
//! assert!(outline.iter().any(|l| l.contains("someone@example.com")));
//! ```
//!
//! ## Modules
//!
//! - [`data`] - schema model, defaults, flatten/unflatten, normalization
//! - [`validate`] - the validation engine
//! - [`render`] - field resolution, registries and backends
//! - [`form`] - the form controller
//! - [`file`] - file selections and data URIs
//! - [`sources`] - loading schemas and data from disk

#[macro_use]
extern crate log;

/// Schema model and the data transformation pipeline.
pub mod data;

pub mod error;

/// File selections and their asynchronous encoding.
pub mod file;

/// Form controller and builder.
pub mod form;

/// Field resolution and rendering.
pub mod render;

/// JSON/TOML loading.
pub mod sources;

/// Validation engine.
pub mod validate;

pub mod value;

pub use data::{FlatState, SchemaNode, UiSchema};
pub use error::{FormError, Result};
pub use file::RawFile;
pub use form::{Callbacks, FormBuilder, FormController, FormData, SubmitOutcome};
pub use validate::{ErrorMap, Validation};
pub use value::FormValue;
