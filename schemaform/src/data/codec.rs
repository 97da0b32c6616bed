//! Conversion between nested value trees and the flat edit state.
//!
//! The flat state is keyed by dotted path and is what controls are bound
//! to. The nested tree mirrors the schema and is what callers receive.

use indexmap::IndexMap;

use crate::{
    data::{
        schema::SchemaNode,
        walker::{join_path, leaf_paths},
    },
    value::{FormValue, ObjectMap},
};

/// Flat edit state: dotted path to leaf value.
pub type FlatState = IndexMap<String, FormValue>;

/// Flatten a nested tree.
///
/// Only objects are descended. Arrays, files and scalars become leaves at
/// their dotted path. Empty objects produce no keys.
pub fn flatten(tree: &FormValue) -> FlatState {
    let mut flat = FlatState::new();
    if let FormValue::Object(map) = tree {
        flatten_into(map, "", &mut flat);
    }
    flat
}

fn flatten_into(map: &ObjectMap, parent: &str, out: &mut FlatState) {
    for (key, value) in map {
        let path = join_path(parent, key);
        match value {
            FormValue::Object(child) => flatten_into(child, &path, out),
            leaf => {
                out.insert(path, leaf.clone());
            }
        }
    }
}

/// Rebuild the nested tree from flat state, driven by the schema.
///
/// Object nodes always produce a (possibly empty) nested object. A leaf
/// takes the value at its full path, falling back to its bare name; absent
/// leaves are left out. Flat keys that are not schema leaf paths are kept
/// at the root, where schema-built keys take precedence.
pub fn unflatten(flat: &FlatState, schema: &SchemaNode) -> FormValue {
    let mut root = build_object(flat, schema, "");

    let known = leaf_paths(schema);
    for (key, value) in flat {
        if known.contains(key) || root.contains_key(key) {
            continue;
        }
        root.insert(key.clone(), value.clone());
    }
    FormValue::Object(root)
}

fn build_object(flat: &FlatState, node: &SchemaNode, parent: &str) -> ObjectMap {
    let mut out = ObjectMap::new();
    let Some(props) = node.properties() else {
        return out;
    };
    for (key, child) in props {
        let path = join_path(parent, key);
        if child.is_object() {
            out.insert(
                key.clone(),
                FormValue::Object(build_object(flat, child, &path)),
            );
        } else if let Some(value) = flat.get(&path).or_else(|| flat.get(key)) {
            out.insert(key.clone(), value.clone());
        }
    }
    out
}
