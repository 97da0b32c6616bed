//! Initial values taken from schema `default` keywords.

use crate::{
    data::schema::SchemaNode,
    value::{FormValue, ObjectMap},
};

/// Build the nested default tree for a schema.
///
/// Objects with properties always produce a nested entry. Other properties
/// appear only when they declare a `default`; nothing is null-filled.
pub fn build_defaults(schema: &SchemaNode) -> FormValue {
    FormValue::Object(defaults_of(schema))
}

fn defaults_of(node: &SchemaNode) -> ObjectMap {
    let mut out = ObjectMap::new();
    for (key, child) in node.properties().into_iter().flatten() {
        if child.is_object() && child.properties().is_some_and(|p| !p.is_empty()) {
            out.insert(key.clone(), FormValue::Object(defaults_of(child)));
        } else if let Some(default) = &child.default {
            out.insert(key.clone(), default.into());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::codec::flatten;
    use serde_json::json;

    #[test]
    fn test_nested_defaults_and_flatten() {
        let schema = SchemaNode::parse(&json!({
            "type": "object",
            "properties": {
                "a": {"type": "string", "default": "x"},
                "b": {"type": "object", "properties": {"c": {"type": "number", "default": 5}}}
            }
        }))
        .unwrap();

        let defaults = build_defaults(&schema);
        assert_eq!(defaults.to_json(), json!({"a": "x", "b": {"c": 5}}));

        let flat = flatten(&defaults);
        let expected: Vec<(String, serde_json::Value)> =
            vec![("a".into(), json!("x")), ("b.c".into(), json!(5))];
        let actual: Vec<_> = flat.iter().map(|(k, v)| (k.clone(), v.to_json())).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_properties_without_default_are_omitted() {
        let schema = SchemaNode::parse(&json!({
            "type": "object",
            "properties": {
                "plain": {"type": "string"},
                "tags": {"type": "array", "default": ["a", "b"]},
                "flag": {"type": "boolean", "default": false},
                "nested": {"type": "object", "properties": {"x": {"type": "string"}}}
            }
        }))
        .unwrap();

        assert_eq!(
            build_defaults(&schema).to_json(),
            json!({"tags": ["a", "b"], "flag": false, "nested": {}})
        );
    }
}
