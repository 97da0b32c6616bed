//! Schema model and the data transformation pipeline.
//!
//! ## Architecture
//!
//! - [`schema`] - typed data schema nodes
//! - [`ui`] - presentation schema and its option bags
//! - [`walker`] - recursive schema traversal helpers
//! - [`defaults`] - default value extraction
//! - [`codec`] - flat edit state <-> nested tree conversion
//! - [`normalize`] - pre-processing of prefilled data
//! - [`date`] - date parsing and display formatting

/// Flatten/unflatten between edit state and nested trees.
pub mod codec;

/// Date parsing and date-fns style formatting.
pub mod date;

/// Default value extraction.
pub mod defaults;

/// Normalization of prefilled data.
pub mod normalize;

/// Typed data schema.
pub mod schema;

/// Presentation schema.
pub mod ui;

/// Schema traversal helpers.
pub mod walker;

pub use codec::{FlatState, flatten, unflatten};
pub use defaults::build_defaults;
pub use normalize::normalize;
pub use schema::{NodeKind, SchemaNode};
pub use ui::{UiNode, UiSchema};
