//! Validation of the flat edit state against the schema.
//!
//! A single recursive pass visits every schema leaf, looks up its value in
//! the flat state by full path and collects human readable messages. Fields
//! without messages are absent from the resulting [`ErrorMap`].

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use indexmap::{IndexMap, IndexSet};
use regex::Regex;

use crate::{
    data::{
        FlatState, UiSchema, date,
        schema::{NodeKind, SchemaNode},
        walker::{collect_required_paths, visit_leaves},
    },
    value::FormValue,
};

/// Field path to ordered list of messages.
pub type ErrorMap = IndexMap<String, Vec<String>>;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

static DATA_URI_MIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"data:(.*?);").expect("valid data uri regex"));

const MIB: f64 = 1024.0 * 1024.0;

/// Outcome of a validation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    pub errors: ErrorMap,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Path of the first failing field in schema order.
    pub fn first_error_path(&self) -> Option<&str> {
        self.errors.keys().next().map(String::as_str)
    }
}

/// Validator bound to one schema and presentation schema.
pub struct Validator<'a> {
    schema: &'a SchemaNode,
    ui: &'a UiSchema,
    required: IndexSet<String>,
}

impl<'a> Validator<'a> {
    pub fn new(schema: &'a SchemaNode, ui: &'a UiSchema) -> Self {
        Self {
            schema,
            ui,
            required: collect_required_paths(schema),
        }
    }

    /// Validate every leaf of the schema.
    pub fn validate(&self, flat: &FlatState) -> Validation {
        let mut errors = ErrorMap::new();
        let missing = FormValue::Null;
        visit_leaves(self.schema, &mut |path, name, node| {
            let value = flat.get(path).unwrap_or(&missing);
            let messages = self.validate_field(path, name, node, value);
            if !messages.is_empty() {
                errors.insert(path.to_string(), messages);
            }
        });
        debug!("validation finished with {} failing field(s)", errors.len());
        Validation { errors }
    }

    /// Messages for a single field, in check order.
    pub fn validate_field(
        &self,
        path: &str,
        name: &str,
        node: &SchemaNode,
        value: &FormValue,
    ) -> Vec<String> {
        let title = node.title_or(name);
        let mut errors = Vec::new();

        if (node.required || self.required.contains(path)) && value.is_missing() {
            errors.push(format!("\"{title}\" is required"));
        }

        if !value.is_falsy() {
            match (&node.kind, value) {
                (NodeKind::String(_), FormValue::String(s)) => {
                    self.check_string(path, title, node, s, &mut errors);
                }
                (NodeKind::Number(bounds) | NodeKind::Integer(bounds), _) => {
                    if let Some(n) = value.as_f64() {
                        if let Some(min) = bounds.minimum
                            && n < min
                        {
                            errors.push(format!(
                                "\"{title}\" must be greater than or equal to {}",
                                fmt_num(min)
                            ));
                        }
                        if let Some(max) = bounds.maximum
                            && n > max
                        {
                            errors.push(format!(
                                "\"{title}\" must be less than or equal to {}",
                                fmt_num(max)
                            ));
                        }
                    }
                }
                (NodeKind::Array(_), FormValue::Array(items)) => {
                    if items.iter().any(FormValue::is_falsy) {
                        errors.push(format!("One or more fields in the {title} are empty."));
                    }
                }
                _ => {}
            }

            self.check_file(path, value, &mut errors);
        }

        errors
    }

    fn check_string(
        &self,
        path: &str,
        title: &str,
        node: &SchemaNode,
        value: &str,
        errors: &mut Vec<String>,
    ) {
        let NodeKind::String(rules) = &node.kind else {
            return;
        };
        let format = node.format.as_deref();

        if format == Some("email") && !EMAIL.is_match(value) {
            errors.push(format!("\"{title}\" must be a valid email address"));
        }

        // Schema patterns are ECMA-style and may use lookaround or backreferences.
        if let Some(pattern) = rules.pattern.as_deref() {
            match fancy_regex::Regex::new(pattern).map(|re| re.is_match(value)) {
                Ok(Ok(false)) => match self.ui.node(path).pattern_messages() {
                    Some(messages) => errors.extend(messages),
                    None => errors.push(format!("\"{title}\" is not in the correct format")),
                },
                Ok(Ok(true)) => {}
                Ok(Err(e)) => warn!("skipping pattern for `{path}`, match failed: {e}"),
                Err(e) => warn!("skipping invalid pattern for `{path}`: {e}"),
            }
        }

        let len = value.chars().count() as u64;
        if let Some(min) = rules.min_length.filter(|m| *m > 0)
            && len < min
        {
            errors.push(format!("\"{title}\" should have at least {min} characters"));
        }
        if let Some(max) = rules.max_length.filter(|m| *m > 0)
            && len > max
        {
            errors.push(format!(
                "\"{title}\" should have no more than {max} characters"
            ));
        }

        if format == Some("date") {
            let display = self.ui.node(path).options.format;
            let parsed = date::parse_loose(value, display.as_deref());
            if parsed.is_none() {
                errors.push(format!("\"{title}\" must be a valid date"));
            }
            if let Some(dt) = parsed {
                if let Some((min, min_dt)) = date_bound(rules.minimum.as_deref())
                    && dt < min_dt
                {
                    errors.push(format!("\"{title}\" must be after {min}"));
                }
                if let Some((max, max_dt)) = date_bound(rules.maximum.as_deref())
                    && dt > max_dt
                {
                    errors.push(format!("\"{title}\" must be before {max}"));
                }
            }
        }
    }

    fn check_file(&self, path: &str, value: &FormValue, errors: &mut Vec<String>) {
        let options = self.ui.node(path).options;
        let Some(accept) = options.accept.as_ref() else {
            return;
        };

        let (mime, size) = match value {
            FormValue::String(s) if s.starts_with("data:") => (
                DATA_URI_MIME
                    .captures(s)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string()),
                None,
            ),
            FormValue::File(file) => (Some(file.mime.clone()), Some(file.size())),
            _ => (None, None),
        };

        if let Some(mime) = mime.filter(|m| !m.is_empty())
            && !accept.accepts(&mime)
        {
            errors.push(format!("The selected file type ({mime}) is not supported."));
        }

        if let (Some(limit), Some(size)) = (options.size.filter(|s| *s > 0.0), size.filter(|s| *s > 0)) {
            let size = size as f64;
            if size > limit * MIB {
                errors.push(format!(
                    "The selected file size ({:.2} MB) exceeds the maximum allowed size of {} MB.",
                    size / MIB,
                    fmt_num(limit)
                ));
            }
        }
    }
}

/// Validate flat state in one call.
pub fn validate(schema: &SchemaNode, ui: &UiSchema, flat: &FlatState) -> Validation {
    Validator::new(schema, ui).validate(flat)
}

fn date_bound(bound: Option<&str>) -> Option<(&str, NaiveDateTime)> {
    let s = bound.filter(|s| !s.is_empty())?;
    Some((s, date::parse_loose(s, None)?))
}

/// Print whole numbers without a trailing `.0`.
fn fmt_num(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::RawFile;
    use serde_json::{Value, json};

    fn run(schema: Value, ui: Value, flat: Value) -> ErrorMap {
        let schema = SchemaNode::parse(&schema).unwrap();
        let ui = UiSchema::parse(&ui).unwrap();
        let flat: FlatState = FormValue::from(flat).as_object().cloned().unwrap_or_default();
        validate(&schema, &ui, &flat).errors
    }

    fn string_field(extra: Value) -> Value {
        let mut field = json!({"type": "string"});
        field
            .as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        json!({"type": "object", "properties": {"f": field}})
    }

    #[test]
    fn test_required_empty_string() {
        let errors = run(
            json!({"type": "object", "required": ["a"], "properties": {"a": {"type": "string"}}}),
            Value::Null,
            json!({"a": ""}),
        );
        assert!(errors["a"][0].contains("required"));
    }

    #[test]
    fn test_required_local_flag_and_zero() {
        let schema = json!({"type": "object", "properties": {
            "n": {"type": "number", "required": true},
            "tags": {"type": "array", "required": true}
        }});
        let errors = run(schema.clone(), Value::Null, json!({"n": 0, "tags": []}));
        assert!(!errors.contains_key("n"));
        assert_eq!(errors["tags"], ["\"tags\" is required"]);

        let errors = run(schema, Value::Null, json!({}));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_nested_required_is_path_qualified() {
        let schema = json!({"type": "object", "properties": {
            "home": {"type": "object", "required": ["city"], "properties": {"city": {"type": "string"}}},
            "work": {"type": "object", "properties": {"city": {"type": "string"}}}
        }});
        let errors = run(schema, Value::Null, json!({}));
        let keys: Vec<_> = errors.keys().map(String::as_str).collect();
        assert_eq!(keys, ["home.city"]);
    }

    #[test]
    fn test_pattern_message() {
        let errors = run(
            string_field(json!({"pattern": "^[0-9]+$"})),
            json!({"f": {"pattern_message": "Digits only"}}),
            json!({"f": "12a"}),
        );
        assert_eq!(errors["f"], ["Digits only"]);

        let errors = run(
            string_field(json!({"pattern": "^[0-9]+$", "title": "Code"})),
            Value::Null,
            json!({"f": "12a"}),
        );
        assert_eq!(errors["f"], ["\"Code\" is not in the correct format"]);
    }

    #[test]
    fn test_email() {
        let schema = string_field(json!({"format": "email"}));
        let errors = run(schema.clone(), Value::Null, json!({"f": "not-an-email"}));
        assert_eq!(errors["f"], ["\"f\" must be a valid email address"]);
        assert!(run(schema, Value::Null, json!({"f": "a@b.co"})).is_empty());
    }

    #[test]
    fn test_length_bounds() {
        let schema = string_field(json!({"minLength": 3, "maxLength": 4}));
        let errors = run(schema.clone(), Value::Null, json!({"f": "ab"}));
        assert_eq!(errors["f"], ["\"f\" should have at least 3 characters"]);
        let errors = run(schema.clone(), Value::Null, json!({"f": "abcde"}));
        assert_eq!(errors["f"], ["\"f\" should have no more than 4 characters"]);
        assert!(run(schema, Value::Null, json!({"f": "äöü"})).is_empty());
    }

    #[test]
    fn test_dates() {
        let schema = string_field(json!({
            "format": "date", "minimum": "2020-01-01", "maximum": "2020-12-31"
        }));
        let errors = run(schema.clone(), Value::Null, json!({"f": "someday"}));
        assert_eq!(errors["f"], ["\"f\" must be a valid date"]);

        let errors = run(schema.clone(), Value::Null, json!({"f": "2019-12-31"}));
        assert_eq!(errors["f"], ["\"f\" must be after 2020-01-01"]);

        let errors = run(schema.clone(), Value::Null, json!({"f": "2021-01-01"}));
        assert_eq!(errors["f"], ["\"f\" must be before 2020-12-31"]);

        // 边界值本身是合法的
        assert!(run(schema.clone(), Value::Null, json!({"f": "2020-01-01"})).is_empty());

        let ui = json!({"f": {"ui:options": {"format": "dd.MM.yyyy"}}});
        assert!(run(schema, ui, json!({"f": "15.06.2020"})).is_empty());
    }

    #[test]
    fn test_number_bounds_inclusive() {
        let schema = json!({"type": "object", "properties": {
            "n": {"type": "number", "minimum": 1, "maximum": 10, "title": "Count"}
        }});
        assert!(run(schema.clone(), Value::Null, json!({"n": 10})).is_empty());
        assert!(run(schema.clone(), Value::Null, json!({"n": "1"})).is_empty());
        let errors = run(schema.clone(), Value::Null, json!({"n": 11}));
        assert_eq!(errors["n"], ["\"Count\" must be less than or equal to 10"]);
        let errors = run(schema, Value::Null, json!({"n": 0.5}));
        assert_eq!(errors["n"], ["\"Count\" must be greater than or equal to 1"]);
    }

    #[test]
    fn test_array_empty_slots() {
        let schema = json!({"type": "object", "properties": {
            "tags": {"type": "array", "title": "Tags", "items": {"type": "string"}}
        }});
        let errors = run(schema.clone(), Value::Null, json!({"tags": ["a", ""]}));
        assert_eq!(errors["tags"], ["One or more fields in the Tags are empty."]);
        assert!(run(schema, Value::Null, json!({"tags": ["a", "b"]})).is_empty());
    }

    #[test]
    fn test_file_type_and_size() {
        let schema = SchemaNode::parse(&json!({"type": "object", "properties": {
            "doc": {"type": "string", "format": "file"}
        }}))
        .unwrap();
        let ui = UiSchema::parse(&json!({
            "doc": {"ui:options": {"accept": ["image/png"], "size": 1}}
        }))
        .unwrap();

        let mut flat = FlatState::new();
        flat.insert("doc".into(), "data:text/plain;base64,aGk=".into());
        let errors = validate(&schema, &ui, &flat).errors;
        assert_eq!(
            errors["doc"],
            ["The selected file type (text/plain) is not supported."]
        );

        let big = RawFile::new("big.png", "image/png", vec![0; 2 * 1024 * 1024]);
        flat.insert("doc".into(), big.into());
        let errors = validate(&schema, &ui, &flat).errors;
        assert_eq!(
            errors["doc"],
            ["The selected file size (2.00 MB) exceeds the maximum allowed size of 1 MB."]
        );

        flat.insert("doc".into(), RawFile::new("ok.png", "image/png", vec![1; 16]).into());
        assert!(validate(&schema, &ui, &flat).is_valid());
    }

    #[test]
    fn test_invalid_regex_is_skipped() {
        let errors = run(
            string_field(json!({"pattern": "([a-z"})),
            Value::Null,
            json!({"f": "zzz"}),
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_pattern_with_lookaround() {
        let schema = string_field(json!({"pattern": "^(?=.*[0-9]).{8,}$"}));
        let errors = run(schema.clone(), Value::Null, json!({"f": "abcdefgh"}));
        assert_eq!(errors["f"], vec!["\"f\" is not in the correct format".to_string()]);

        let errors = run(schema, Value::Null, json!({"f": "abcdefg1"}));
        assert!(errors.is_empty());

        // 反向引用
        let schema = string_field(json!({"pattern": "^(\\w)\\1$"}));
        assert!(run(schema.clone(), Value::Null, json!({"f": "aa"})).is_empty());
        assert!(run(schema, Value::Null, json!({"f": "ab"})).contains_key("f"));
    }
}
