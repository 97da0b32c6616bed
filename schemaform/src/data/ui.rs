//! Presentation schema.
//!
//! The presentation ("ui") schema is a sparse tree parallel to the data
//! schema. Field entries are addressed by dotted path and may be written
//! either nested (`{"address": {"city": {...}}}`) or flat at the root
//! (`{"address.city": {...}}`). Every option is optional.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FormError, Result};

/// Default display format for date fields.
pub const DEFAULT_DATE_FORMAT: &str = "yyyy-MM-dd";

/// Parsed presentation schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiSchema {
    raw: Map<String, Value>,
    /// Name of the page template to use.
    pub template: Option<String>,
    /// Explicit section layout; empty means schema order.
    pub layout: Vec<LayoutSection>,
    pub submit_button: SubmitButtonOptions,
    pub reset_button: ResetButtonOptions,
}

/// Presentation entry for one field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UiNode {
    #[serde(rename = "ui:widget")]
    pub widget: Option<String>,
    #[serde(rename = "ui:field")]
    pub field: Option<String>,
    #[serde(rename = "ui:options", alias = "ui-options", default)]
    pub options: UiOptions,
    #[serde(rename = "ui:placeholder")]
    pub placeholder: Option<String>,
    #[serde(rename = "ui:layout")]
    pub layout: Option<Value>,
    pub pattern_message: Option<PatternMessage>,
    #[serde(rename = "classNames")]
    pub class_names: Option<String>,
    #[serde(rename = "className")]
    pub class_name: Option<String>,
    #[serde(rename = "titleClass")]
    pub title_class: Option<String>,
}

/// The `ui:options` bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiOptions {
    /// Display format for dates (date-fns tokens).
    pub format: Option<String>,
    pub rows: Option<u32>,
    pub cols: Option<u32>,
    /// Accepted MIME types for file fields.
    pub accept: Option<Accept>,
    /// Maximum file size in MiB.
    pub size: Option<f64>,
    #[serde(rename = "className")]
    pub class_name: Option<String>,
    /// `false` hides the label.
    pub label: Option<bool>,
    /// `"base64"` turns file selections into data URIs.
    pub output: Option<String>,
}

/// Accepted file types, as a list or a comma separated string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Accept {
    List(Vec<String>),
    Joined(String),
}

/// Custom pattern failure message(s).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PatternMessage {
    One(String),
    Many(Vec<String>),
}

/// A layout section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LayoutSection {
    /// `"section"` for nested sections.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "classNames")]
    pub class_names: Option<String>,
    #[serde(default)]
    pub fields: Vec<LayoutEntry>,
}

/// An entry inside a layout section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LayoutEntry {
    Field(String),
    Section(LayoutSection),
    Invalid(Value),
}

/// `ui:submitButtonOptions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitButtonOptions {
    #[serde(default)]
    pub hide: bool,
    #[serde(rename = "submitText")]
    pub submit_text: Option<String>,
    #[serde(default)]
    pub props: Map<String, Value>,
}

/// `ui:resetButtonOptions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResetButtonOptions {
    #[serde(default)]
    pub show: bool,
    #[serde(rename = "clearText")]
    pub clear_text: Option<String>,
    #[serde(default)]
    pub props: Map<String, Value>,
}

impl UiSchema {
    /// Parse a presentation schema. `null` yields the empty schema.
    pub fn parse(value: &Value) -> Result<Self> {
        let raw = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map.clone(),
            other => return Err(FormError::schema("<ui root>", "object", other)),
        };

        let template = raw
            .get("template")
            .and_then(Value::as_str)
            .map(str::to_string);

        let layout = match raw.get("layout") {
            None | Some(Value::Null) => Vec::new(),
            Some(v) => serde_json::from_value(v.clone()).map_err(FormError::UiSchema)?,
        };
        let submit_button = decode_or_default(&raw, "ui:submitButtonOptions")?;
        let reset_button = decode_or_default(&raw, "ui:resetButtonOptions")?;

        Ok(UiSchema {
            raw,
            template,
            layout,
            submit_button,
            reset_button,
        })
    }

    /// The schema as written.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// Raw entry for a dotted path: a flat root key wins over nested descent.
    pub fn raw_node(&self, path: &str) -> Option<&Value> {
        if let Some(v) = self.raw.get(path) {
            return Some(v);
        }
        let mut parts = path.split('.');
        let mut current = self.raw.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Typed entry for a dotted path; absent or malformed entries are empty.
    pub fn node(&self, path: &str) -> UiNode {
        let Some(raw) = self.raw_node(path) else {
            return UiNode::default();
        };
        match UiNode::deserialize(raw) {
            Ok(node) => node,
            Err(e) => {
                warn!("ignoring malformed ui entry for `{path}`: {e}");
                UiNode::default()
            }
        }
    }
}

impl TryFrom<&Value> for UiSchema {
    type Error = FormError;

    fn try_from(value: &Value) -> Result<Self> {
        UiSchema::parse(value)
    }
}

impl UiNode {
    /// Date display format, falling back to [`DEFAULT_DATE_FORMAT`].
    pub fn date_format(&self) -> &str {
        self.options
            .format
            .as_deref()
            .unwrap_or(DEFAULT_DATE_FORMAT)
    }

    /// Messages to report when `pattern` does not match.
    pub fn pattern_messages(&self) -> Option<Vec<String>> {
        match self.pattern_message.as_ref()? {
            PatternMessage::One(msg) => Some(vec![msg.clone()]),
            PatternMessage::Many(msgs) => Some(msgs.clone()),
        }
    }
}

impl UiOptions {
    /// Whether file selections should be stored as base64 data URIs.
    pub fn wants_base64(&self) -> bool {
        self.output.as_deref() == Some("base64")
    }
}

impl Accept {
    pub fn types(&self) -> Vec<&str> {
        match self {
            Accept::List(items) => items.iter().map(String::as_str).collect(),
            Accept::Joined(s) => s.split(',').map(str::trim).filter(|t| !t.is_empty()).collect(),
        }
    }

    pub fn accepts(&self, mime: &str) -> bool {
        self.types().contains(&mime)
    }
}

impl SubmitButtonOptions {
    pub fn text(&self) -> &str {
        self.submit_text.as_deref().unwrap_or("Submit")
    }

    pub fn class(&self) -> &str {
        button_class(&self.props)
    }
}

impl ResetButtonOptions {
    pub fn text(&self) -> &str {
        self.clear_text.as_deref().unwrap_or("Clear")
    }

    pub fn class(&self) -> &str {
        button_class(&self.props)
    }
}

fn button_class(props: &Map<String, Value>) -> &str {
    props
        .get("className")
        .or_else(|| props.get("classNames"))
        .and_then(Value::as_str)
        .unwrap_or("defaultButton")
}

fn decode_or_default<T>(raw: &Map<String, Value>, key: &str) -> Result<T>
where
    T: Default + for<'de> Deserialize<'de>,
{
    match raw.get(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(v) => serde_json::from_value(v.clone()).map_err(FormError::UiSchema),
    }
}
