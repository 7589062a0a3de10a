use hashbrown::HashMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// A scalar attribute value as it arrives from the log pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl AttrValue {
    /// Numeric view used by ordering and range comparisons. Text counts when
    /// it spells a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(text) => parse_number(text),
            AttrValue::Boolean(_) | AttrValue::Null => None,
        }
    }

    /// Booleans and nulls have no ordering.
    pub fn is_comparable(&self) -> bool {
        matches!(self, AttrValue::Text(_) | AttrValue::Number(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Text(_) => "text",
            AttrValue::Number(_) => "number",
            AttrValue::Boolean(_) => "boolean",
            AttrValue::Null => "null",
        }
    }

    fn from_json(value: &Value) -> Self {
        match value {
            Value::String(text) => AttrValue::Text(text.clone()),
            Value::Number(n) => n
                .as_f64()
                .map_or_else(|| AttrValue::Text(n.to_string()), AttrValue::Number),
            Value::Bool(b) => AttrValue::Boolean(*b),
            Value::Null => AttrValue::Null,
            // Arrays keep their JSON text; objects are flattened by the caller.
            Value::Array(_) | Value::Object(_) => AttrValue::Text(value.to_string()),
        }
    }
}

pub(crate) fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(text) => f.write_str(text),
            AttrValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            AttrValue::Number(n) => write!(f, "{n}"),
            AttrValue::Boolean(b) => write!(f, "{b}"),
            AttrValue::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Number(value as f64)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Boolean(value)
    }
}

/// Insertion-ordered attribute map with case-insensitive key lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    entries: Vec<(String, AttrValue)>,
    index: HashMap<String, usize>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens a JSON object: nested objects become dotted keys
    /// (`http.request.method`), arrays keep their JSON text.
    ///
    /// ```
    /// use attr_match::{AttrValue, Attributes};
    ///
    /// let json = serde_json::json!({"http": {"status": 502}, "tags": ["a", "b"]});
    /// let attrs = Attributes::from_json_object(json.as_object().unwrap());
    /// assert_eq!(attrs.get("http.status"), Some(&AttrValue::Number(502.0)));
    /// assert_eq!(attrs.get("tags").unwrap().to_string(), r#"["a","b"]"#);
    /// ```
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let mut attrs = Self::new();
        attrs.flatten_into("", object);
        attrs
    }

    fn flatten_into(&mut self, prefix: &str, object: &Map<String, Value>) {
        for (key, value) in object {
            let key = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            match value {
                Value::Object(nested) => self.flatten_into(&key, nested),
                other => self.insert(key, AttrValue::from_json(other)),
            }
        }
    }

    /// Inserts or replaces. A key that differs only in case replaces the
    /// existing entry in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key.to_lowercase()) {
            Some(&idx) => self.entries[idx] = (key, value),
            None => {
                self.index.insert(key.to_lowercase(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.get_entry(key).map(|(_, value)| value)
    }

    /// The stored key spelling together with its value.
    pub fn get_entry(&self, key: &str) -> Option<(&str, &AttrValue)> {
        let idx = *self.index.get(&key.to_lowercase())?;
        let (key, value) = &self.entries[idx];
        Some((key.as_str(), value))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(&key.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Self::new();
        for (key, value) in iter {
            attrs.insert(key, value);
        }
        attrs
    }
}
