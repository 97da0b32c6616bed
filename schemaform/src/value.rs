//! The value type carried by form state.
//!
//! [`FormValue`] is JSON plus one extra variant: a raw file picked by the
//! user that has not been encoded yet. Files serialize as `data:` URIs, so
//! any tree can be turned back into plain JSON with [`FormValue::to_json`].

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer, ser::SerializeMap};
use serde_json::{Number, Value};

use crate::file::RawFile;

/// Ordered object map used for nested trees.
pub type ObjectMap = IndexMap<String, FormValue>;

/// A value held by the form.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<FormValue>),
    Object(ObjectMap),
    /// A live file selection.
    File(RawFile),
}

impl FormValue {
    /// An empty object.
    pub fn object() -> Self {
        FormValue::Object(ObjectMap::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FormValue::Null)
    }

    /// Loose truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy.
    ///
    /// Arrays, objects and files are always truthy, even when empty.
    pub fn is_falsy(&self) -> bool {
        match self {
            FormValue::Null => true,
            FormValue::Bool(b) => !b,
            FormValue::Number(n) => n.as_f64().is_none_or(|f| f == 0.0 || f.is_nan()),
            FormValue::String(s) => s.is_empty(),
            FormValue::Array(_) | FormValue::Object(_) | FormValue::File(_) => false,
        }
    }

    /// Whether the value counts as missing for a required field.
    ///
    /// `null`, the empty string and the empty array are missing. Numeric
    /// zero and `false` are present.
    pub fn is_missing(&self) -> bool {
        match self {
            FormValue::Null => true,
            FormValue::String(s) => s.is_empty(),
            FormValue::Array(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view, accepting numeric strings typed into text controls.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FormValue::Number(n) => n.as_f64(),
            FormValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FormValue]> {
        match self {
            FormValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectMap> {
        match self {
            FormValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ObjectMap> {
        match self {
            FormValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&RawFile> {
        match self {
            FormValue::File(file) => Some(file),
            _ => None,
        }
    }

    /// Look up a key when this value is an object.
    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Convert into plain JSON, encoding files as `data:` URIs.
    pub fn to_json(&self) -> Value {
        match self {
            FormValue::Null => Value::Null,
            FormValue::Bool(b) => Value::Bool(*b),
            FormValue::Number(n) => Value::Number(n.clone()),
            FormValue::String(s) => Value::String(s.clone()),
            FormValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            FormValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            FormValue::File(file) => Value::String(file.to_data_url()),
        }
    }
}

impl From<Value> for FormValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FormValue::Null,
            Value::Bool(b) => FormValue::Bool(b),
            Value::Number(n) => FormValue::Number(n),
            Value::String(s) => FormValue::String(s),
            Value::Array(items) => FormValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                FormValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&Value> for FormValue {
    fn from(value: &Value) -> Self {
        value.clone().into()
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::String(s.to_string())
    }
}

impl From<String> for FormValue {
    fn from(s: String) -> Self {
        FormValue::String(s)
    }
}

impl From<bool> for FormValue {
    fn from(b: bool) -> Self {
        FormValue::Bool(b)
    }
}

impl From<i64> for FormValue {
    fn from(n: i64) -> Self {
        FormValue::Number(n.into())
    }
}

impl From<f64> for FormValue {
    fn from(f: f64) -> Self {
        Number::from_f64(f)
            .map(FormValue::Number)
            .unwrap_or(FormValue::Null)
    }
}

impl From<RawFile> for FormValue {
    fn from(file: RawFile) -> Self {
        FormValue::File(file)
    }
}

impl<T: Into<FormValue>> From<Vec<T>> for FormValue {
    fn from(items: Vec<T>) -> Self {
        FormValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl Serialize for FormValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FormValue::Null => serializer.serialize_unit(),
            FormValue::Bool(b) => serializer.serialize_bool(*b),
            FormValue::Number(n) => n.serialize(serializer),
            FormValue::String(s) => serializer.serialize_str(s),
            FormValue::Array(items) => items.serialize(serializer),
            FormValue::Object(map) => {
                let mut state = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    state.serialize_entry(k, v)?;
                }
                state.end()
            }
            FormValue::File(file) => serializer.serialize_str(&file.to_data_url()),
        }
    }
}

impl<'de> Deserialize<'de> for FormValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(FormValue::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(FormValue::Null.is_falsy());
        assert!(FormValue::from("").is_falsy());
        assert!(FormValue::from(0i64).is_falsy());
        assert!(FormValue::from(false).is_falsy());
        assert!(!FormValue::from("x").is_falsy());
        assert!(!FormValue::Array(vec![]).is_falsy());
    }

    #[test]
    fn test_missing_keeps_zero() {
        assert!(FormValue::from("").is_missing());
        assert!(FormValue::Array(vec![]).is_missing());
        assert!(!FormValue::from(0i64).is_missing());
        assert!(!FormValue::from(false).is_missing());
    }

    #[test]
    fn test_json_conversion_keeps_order() {
        let v = json!({"z": 1, "a": [true, null], "m": {"k": "v"}});
        let form: FormValue = v.clone().into();
        let keys: Vec<_> = form.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["z", "a", "m"]);
        assert_eq!(form.to_json(), v);
        assert_eq!(serde_json::to_value(&form).unwrap(), v);
    }

    #[test]
    fn test_file_serializes_as_data_url() {
        let file = RawFile::new("a.txt", "text/plain", b"hi".to_vec());
        let v = FormValue::from(file);
        assert_eq!(v.to_json(), json!("data:text/plain;base64,aGk="));
    }
}
