//! Typed schema nodes.
//!
//! The data schema arrives as JSON and is parsed once into a tree of
//! [`SchemaNode`]s. Each node carries shared metadata plus a [`NodeKind`]
//! tagged by the declared `type`, so the rest of the crate can match
//! exhaustively instead of probing JSON keys.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{FormError, Result};

/// A node of the data schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// Declared `type` as written, if any.
    pub type_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub format: Option<String>,
    pub default: Option<Value>,
    /// Leaf-local `required: true`.
    pub required: bool,
    pub enum_values: Option<Vec<Value>>,
    pub enum_names: Option<Vec<String>>,
    pub one_of: Option<Vec<Value>>,
    /// Footer text shown by the default page chrome (root only).
    pub footer_content: Option<String>,
    pub kind: NodeKind,
}

/// Per-type payload of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Object(ObjectSchema),
    String(StringSchema),
    Number(NumberSchema),
    Integer(NumberSchema),
    Boolean,
    Array(ArraySchema),
    /// Missing or unrecognised `type`.
    Other,
}

/// Object node with ordered properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    pub properties: IndexMap<String, SchemaNode>,
    /// Names listed in this object's `required` array.
    pub required: Vec<String>,
}

/// String constraints.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringSchema {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    /// Lower date bound for `format: date`.
    pub minimum: Option<String>,
    /// Upper date bound for `format: date`.
    pub maximum: Option<String>,
}

/// Numeric bounds, both inclusive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumberSchema {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

/// Array node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArraySchema {
    pub items: Option<Box<SchemaNode>>,
}

/// One selectable option of an enumerated field.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub value: Value,
    pub label: String,
}

impl SchemaNode {
    /// Parse a schema document.
    pub fn parse(value: &Value) -> Result<Self> {
        Self::parse_at(value, "")
    }

    fn parse_at(value: &Value, path: &str) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| FormError::schema(display_path(path), "object", value))?;

        let type_name = match obj.get("type") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            // `["string", "null"]` style unions: first non-null member wins.
            Some(Value::Array(types)) => types
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null")
                .map(str::to_string),
            Some(other) => {
                return Err(FormError::schema(display_path(path), "string", other));
            }
        };

        let kind = match type_name.as_deref() {
            Some("object") => NodeKind::Object(parse_object(obj, path)?),
            // untyped nodes with `properties` are objects
            None if obj.get("properties").is_some_and(Value::is_object) => {
                NodeKind::Object(parse_object(obj, path)?)
            }
            Some("string") => NodeKind::String(StringSchema {
                min_length: opt_u64(obj, "minLength", path)?,
                max_length: opt_u64(obj, "maxLength", path)?,
                pattern: opt_string(obj, "pattern", path)?,
                minimum: opt_bound_str(obj, "minimum"),
                maximum: opt_bound_str(obj, "maximum"),
            }),
            Some("number") => NodeKind::Number(parse_number(obj, path)?),
            Some("integer") => NodeKind::Integer(parse_number(obj, path)?),
            Some("boolean") => NodeKind::Boolean,
            Some("array") => {
                let items = match obj.get("items") {
                    Some(items @ Value::Object(_)) => {
                        Some(Box::new(Self::parse_at(items, &join(path, "items"))?))
                    }
                    _ => None,
                };
                NodeKind::Array(ArraySchema { items })
            }
            _ => NodeKind::Other,
        };

        let enum_names = match obj.get("enumNames") {
            Some(Value::Array(names)) => Some(
                names
                    .iter()
                    .map(|n| n.as_str().map_or_else(|| n.to_string(), str::to_string))
                    .collect(),
            ),
            _ => None,
        };

        Ok(SchemaNode {
            type_name,
            title: opt_string(obj, "title", path)?,
            description: opt_string(obj, "description", path)?,
            format: opt_string(obj, "format", path)?,
            default: obj.get("default").filter(|v| !v.is_null()).cloned(),
            required: matches!(obj.get("required"), Some(Value::Bool(true))),
            enum_values: opt_array(obj, "enum"),
            enum_names,
            one_of: opt_array(obj, "oneOf"),
            footer_content: opt_string(obj, "footerContent", path)?,
            kind,
        })
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, NodeKind::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, NodeKind::Array(_))
    }

    /// Ordered properties when this is an object node.
    pub fn properties(&self) -> Option<&IndexMap<String, SchemaNode>> {
        match &self.kind {
            NodeKind::Object(obj) => Some(&obj.properties),
            _ => None,
        }
    }

    /// Property lookup on an object node.
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties().and_then(|p| p.get(name))
    }

    /// Title, falling back to the given field name.
    pub fn title_or<'a>(&'a self, name: &'a str) -> &'a str {
        self.title.as_deref().unwrap_or(name)
    }

    /// Options of an enumerated field.
    ///
    /// Sources are tried in order: `enum` with `enumNames`, plain `enum`,
    /// `items.enum`, then `oneOf`.
    pub fn choices(&self) -> Vec<Choice> {
        if let Some(values) = &self.enum_values {
            let names = self.enum_names.as_deref().unwrap_or_default();
            return values
                .iter()
                .enumerate()
                .map(|(i, v)| Choice {
                    value: v.clone(),
                    label: names
                        .get(i)
                        .filter(|n| !n.is_empty())
                        .cloned()
                        .unwrap_or_else(|| label_of(v)),
                })
                .collect();
        }

        if let NodeKind::Array(ArraySchema { items: Some(items) }) = &self.kind
            && let Some(values) = &items.enum_values
        {
            return values
                .iter()
                .map(|v| Choice {
                    value: v.clone(),
                    label: label_of(v),
                })
                .collect();
        }

        self.one_of
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|option| match option {
                Value::Object(obj) => {
                    let value = obj.get("const").cloned().unwrap_or(Value::Null);
                    let label = obj
                        .get("title")
                        .and_then(Value::as_str)
                        .map_or_else(|| label_of(&value), str::to_string);
                    Choice { value, label }
                }
                other => Choice {
                    value: other.clone(),
                    label: label_of(other),
                },
            })
            .collect()
    }
}

impl TryFrom<&Value> for SchemaNode {
    type Error = FormError;

    fn try_from(value: &Value) -> Result<Self> {
        SchemaNode::parse(value)
    }
}

fn parse_object(obj: &Map<String, Value>, path: &str) -> Result<ObjectSchema> {
    let mut properties = IndexMap::new();
    match obj.get("properties") {
        None | Some(Value::Null) => {}
        Some(Value::Object(props)) => {
            for (name, child) in props {
                let child_path = join(path, name);
                properties.insert(name.clone(), SchemaNode::parse_at(child, &child_path)?);
            }
        }
        Some(other) => {
            return Err(FormError::schema(
                join(path, "properties"),
                "object",
                other,
            ));
        }
    }

    let required = match obj.get("required") {
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    Ok(ObjectSchema {
        properties,
        required,
    })
}

fn parse_number(obj: &Map<String, Value>, path: &str) -> Result<NumberSchema> {
    Ok(NumberSchema {
        minimum: opt_f64(obj, "minimum", path)?,
        maximum: opt_f64(obj, "maximum", path)?,
    })
}

fn opt_string(obj: &Map<String, Value>, key: &str, path: &str) -> Result<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(FormError::schema(join(path, key), "string", other)),
    }
}

fn opt_u64(obj: &Map<String, Value>, key: &str, path: &str) -> Result<Option<u64>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| FormError::schema(join(path, key), "non-negative integer", v)),
    }
}

fn opt_f64(obj: &Map<String, Value>, key: &str, path: &str) -> Result<Option<f64>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| FormError::schema(join(path, key), "number", v)),
    }
}

/// Date bounds may be written as strings or bare numbers (years).
fn opt_bound_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn opt_array(obj: &Map<String, Value>, key: &str) -> Option<Vec<Value>> {
    obj.get(key).and_then(Value::as_array).cloned()
}

fn label_of(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "<root>" } else { path }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_nested_object() {
        let schema = SchemaNode::parse(&json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": {"type": "string", "minLength": 2},
                "age": {"type": "integer", "minimum": 0},
                "address": {
                    "type": "object",
                    "properties": {"city": {"type": "string", "required": true}}
                }
            }
        }))
        .unwrap();

        let NodeKind::Object(root) = &schema.kind else {
            panic!("root should be an object");
        };
        assert_eq!(root.required, ["name"]);
        let keys: Vec<_> = root.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "age", "address"]);

        let city = schema.property("address").unwrap().property("city").unwrap();
        assert!(city.required);
        assert!(matches!(
            schema.property("age").unwrap().kind,
            NodeKind::Integer(NumberSchema {
                minimum: Some(0.0),
                maximum: None
            })
        ));
    }

    #[test]
    fn test_wrong_keyword_shape_is_rejected() {
        let err = SchemaNode::parse(&json!({
            "type": "object",
            "properties": {"a": {"type": "string", "title": 5}}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("a.title"));
    }

    #[test]
    fn test_unknown_type_is_other() {
        let node = SchemaNode::parse(&json!({"type": "color"})).unwrap();
        assert_eq!(node.kind, NodeKind::Other);
        assert_eq!(node.type_name.as_deref(), Some("color"));
    }

    #[test]
    fn test_choice_precedence() {
        let node = SchemaNode::parse(&json!({
            "type": "string",
            "enum": ["a", "b"],
            "enumNames": ["Alpha"],
            "oneOf": [{"const": "z", "title": "Zed"}]
        }))
        .unwrap();
        let labels: Vec<_> = node.choices().into_iter().map(|c| c.label).collect();
        assert_eq!(labels, ["Alpha", "b"]);

        let node = SchemaNode::parse(&json!({
            "type": "array",
            "items": {"type": "string", "enum": ["x", "y"]}
        }))
        .unwrap();
        assert_eq!(node.choices().len(), 2);

        let node = SchemaNode::parse(&json!({
            "type": "string",
            "oneOf": [{"const": "z", "title": "Zed"}, "w"]
        }))
        .unwrap();
        let choices = node.choices();
        assert_eq!(choices[0].label, "Zed");
        assert_eq!(choices[1].value, json!("w"));
    }
}
