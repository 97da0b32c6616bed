//! Normalization of merged default and prefilled data.
//!
//! Runs before data enters the flat edit state. Date strings are rewritten
//! into the display format of their field, null values are dropped, and
//! keys unknown to the schema are carried through untouched.

use crate::{
    data::{
        date,
        schema::{NodeKind, SchemaNode},
        ui::UiSchema,
        walker::join_path,
    },
    value::{FormValue, ObjectMap},
};

/// Normalize a nested data tree against the schema and presentation schema.
///
/// Non-object input yields an empty object.
pub fn normalize(schema: &SchemaNode, data: &FormValue, ui: &UiSchema) -> FormValue {
    match data {
        FormValue::Object(map) => FormValue::Object(normalize_object(schema, map, ui, "")),
        _ => FormValue::object(),
    }
}

fn normalize_object(node: &SchemaNode, data: &ObjectMap, ui: &UiSchema, parent: &str) -> ObjectMap {
    let mut out = ObjectMap::new();

    if let Some(props) = node.properties() {
        for (key, child) in props {
            let Some(value) = data.get(key) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let path = join_path(parent, key);
            let normalized = match (&child.kind, value) {
                (NodeKind::Object(_), FormValue::Object(inner)) => {
                    FormValue::Object(normalize_object(child, inner, ui, &path))
                }
                (NodeKind::String(_), FormValue::String(raw))
                    if child.format.as_deref() == Some("date") =>
                {
                    let node = ui.node(&path);
                    match date::reformat_iso(raw, node.date_format()) {
                        Some(formatted) => FormValue::String(formatted),
                        None => {
                            debug!("keeping unparsed date for `{path}`: {raw:?}");
                            value.clone()
                        }
                    }
                }
                _ => value.clone(),
            };
            out.insert(key.clone(), normalized);
        }
    }

    // Keys outside the schema follow the schema keys.
    for (key, value) in data {
        if value.is_null() || node.property(key).is_some() {
            continue;
        }
        out.insert(key.clone(), value.clone());
    }

    out
}
