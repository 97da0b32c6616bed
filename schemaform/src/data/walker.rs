//! Recursive traversal helpers over a schema tree.
//!
//! All functions here are pure. Paths are dotted (`parent.child`).

use indexmap::IndexSet;

use crate::data::schema::{NodeKind, SchemaNode};

/// Join a parent path and a key.
pub fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// Last segment of a dotted path.
pub fn short_name(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Required field names, without ancestor qualification.
///
/// Starts with the root `required` list and appends the lists of nested
/// objects depth-first. Names from different branches cannot be told apart;
/// use [`collect_required_paths`] where that matters.
pub fn collect_required_fields(schema: &SchemaNode) -> Vec<String> {
    let NodeKind::Object(obj) = &schema.kind else {
        return Vec::new();
    };
    let mut names = obj.required.clone();
    for child in obj.properties.values() {
        if child.is_object() {
            names.extend(collect_required_fields(child));
        }
    }
    names
}

/// Required fields as full dotted paths.
///
/// Includes both names listed in an object's `required` array and leaves
/// flagged with `required: true`.
pub fn collect_required_paths(schema: &SchemaNode) -> IndexSet<String> {
    let mut paths = IndexSet::new();
    required_paths_into(schema, "", &mut paths);
    paths
}

fn required_paths_into(node: &SchemaNode, parent: &str, out: &mut IndexSet<String>) {
    let NodeKind::Object(obj) = &node.kind else {
        return;
    };
    for name in &obj.required {
        out.insert(join_path(parent, name));
    }
    for (name, child) in &obj.properties {
        let path = join_path(parent, name);
        if child.is_object() {
            required_paths_into(child, &path, out);
        } else if child.required {
            out.insert(path);
        }
    }
}

/// Depth-first search for a property called `name` anywhere in the tree.
///
/// The first match in property order wins, so duplicate names in different
/// branches resolve to the earliest one.
pub fn find_field_schema_by_name<'a>(schema: &'a SchemaNode, name: &str) -> Option<&'a SchemaNode> {
    let props = schema.properties()?;
    for (key, child) in props {
        if key == name {
            return Some(child);
        }
        if child.is_object()
            && let Some(found) = find_field_schema_by_name(child, name)
        {
            return Some(found);
        }
    }
    None
}

/// Direct lookup by dotted path.
pub fn resolve_schema_at_path<'a>(schema: &'a SchemaNode, path: &str) -> Option<&'a SchemaNode> {
    path.split('.')
        .try_fold(schema, |node, part| node.property(part))
}

/// Call `visit(path, name, node)` for every non-object node, in schema order.
pub fn visit_leaves<'a, F>(schema: &'a SchemaNode, visit: &mut F)
where
    F: FnMut(&str, &'a str, &'a SchemaNode),
{
    visit_leaves_from(schema, "", visit);
}

fn visit_leaves_from<'a, F>(node: &'a SchemaNode, parent: &str, visit: &mut F)
where
    F: FnMut(&str, &'a str, &'a SchemaNode),
{
    let Some(props) = node.properties() else {
        return;
    };
    for (name, child) in props {
        let path = join_path(parent, name);
        if child.is_object() {
            visit_leaves_from(child, &path, visit);
        } else {
            visit(&path, name, child);
        }
    }
}

/// Full paths of every leaf, in schema order.
pub fn leaf_paths(schema: &SchemaNode) -> IndexSet<String> {
    let mut paths = IndexSet::new();
    visit_leaves(schema, &mut |path, _, _| {
        paths.insert(path.to_string());
    });
    paths
}
