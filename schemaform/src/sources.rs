//! Loading form definitions and data from files.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;

use crate::{
    data::{SchemaNode, UiSchema},
    error::{FormError, Result},
    form::FormBuilder,
    value::FormValue,
};

/// A schema, an optional presentation schema and optional prefilled data,
/// as read from disk.
#[derive(Debug, Clone)]
pub struct FormSources {
    pub schema_path: PathBuf,
    pub schema: SchemaNode,
    pub ui: UiSchema,
    pub data: Option<FormValue>,
}

/// Read a JSON or TOML document, chosen by file extension.
pub fn read_document(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| FormError::io(path, e))?;
    parse_document(&content, path)
}

/// Parse `content` as the format implied by `path`'s extension.
///
/// Blank content yields `null`.
pub fn parse_document(content: &str, path: &Path) -> Result<Value> {
    if content.trim().is_empty() {
        return Ok(Value::Null);
    }
    let value = match path.extension().and_then(|s| s.to_str()).unwrap_or("") {
        "json" => serde_json::from_str(content)?,
        "toml" => {
            let v: toml::Value = toml::from_str(content)?;
            serde_json::to_value(v)?
        }
        ext => {
            return Err(FormError::UnsupportedExtension {
                path: path.to_path_buf(),
                ext: ext.to_string(),
            });
        }
    };
    Ok(value)
}

impl FormSources {
    /// Load the schema and, when given, the presentation schema and data.
    pub fn load(
        schema: impl AsRef<Path>,
        ui: Option<impl AsRef<Path>>,
        data: Option<impl AsRef<Path>>,
    ) -> Result<Self> {
        let schema_path = schema.as_ref().to_path_buf();
        let schema = SchemaNode::parse(&read_document(&schema_path)?)?;

        let ui = match ui {
            Some(path) => UiSchema::parse(&read_document(path)?)?,
            None => UiSchema::default(),
        };

        let data = match data {
            Some(path) => match read_document(path)? {
                Value::Null => None,
                v => Some(FormValue::from(v)),
            },
            None => None,
        };

        debug!(
            "loaded form sources from {} (data: {})",
            schema_path.display(),
            data.is_some()
        );
        Ok(Self {
            schema_path,
            schema,
            ui,
            data,
        })
    }

    /// A builder preloaded with these sources.
    pub fn builder<O>(self) -> FormBuilder<O> {
        let builder = FormBuilder::new(self.schema).ui_schema(self.ui);
        match self.data {
            Some(data) => builder.form_data(data),
            None => builder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_tmp(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("schemaform-sources");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_by_extension() {
        let v = parse_document("a = 1\n[b]\nc = \"x\"\n", Path::new("d.toml")).unwrap();
        assert_eq!(v, json!({"a": 1, "b": {"c": "x"}}));

        let v = parse_document("{\"a\": 1}", Path::new("d.json")).unwrap();
        assert_eq!(v, json!({"a": 1}));

        assert_eq!(parse_document("  ", Path::new("d.json")).unwrap(), Value::Null);

        let err = parse_document("a: 1", Path::new("d.yaml")).unwrap_err();
        assert!(matches!(err, FormError::UnsupportedExtension { ref ext, .. } if ext == "yaml"));

        let err = parse_document("{", Path::new("d.json")).unwrap_err();
        assert!(matches!(err, FormError::Json(_)));
    }

    #[test]
    fn test_load_sources() {
        let schema = write_tmp(
            "schema.json",
            r#"{"type":"object","properties":{"name":{"type":"string","default":"x"},"age":{"type":"number"}}}"#,
        );
        let data = write_tmp("data.toml", "age = 3\n");

        let sources = FormSources::load(&schema, None::<&Path>, Some(&data)).unwrap();
        assert!(sources.ui.layout.is_empty());

        let form: crate::form::FormController = sources.builder().build();
        assert_eq!(
            form.output().to_json(),
            json!({"name": "x", "age": 3})
        );

        let missing = FormSources::load("/no/such/schema.json", None::<&Path>, None::<&Path>);
        assert!(matches!(missing, Err(FormError::Io { .. })));
    }
}
