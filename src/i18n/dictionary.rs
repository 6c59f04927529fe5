//! Dictionary tree and lookup utilities.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::i18n::error::TranslationError;

/// Flattened view of a dictionary: dot-notation key -> translated string.
pub type TranslationMap = BTreeMap<String, String>;

/// Localized text for one language: a JSON object whose values are strings or nested objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dictionary(Map<String, Value>);

impl Dictionary {
    /// Empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// What: Parse a dictionary from JSON text.
    ///
    /// Inputs:
    /// - `json`: JSON document, must be an object at the top level
    /// - `origin`: Where the text came from, used in error messages
    ///
    /// Output:
    /// - `Ok(Dictionary)` or a `Decode` error
    ///
    /// # Errors
    /// - Returns `Err` when `json` is not valid JSON
    /// - Returns `Err` when the top-level value is not an object
    pub fn from_json_str(json: &str, origin: &str) -> Result<Self, TranslationError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| TranslationError::decode(origin, e))?;
        Self::from_value(value, origin)
    }

    /// What: Convert an already-parsed JSON value into a dictionary.
    ///
    /// # Errors
    /// - Returns `Err` when `value` is not a JSON object
    pub fn from_value(value: Value, origin: &str) -> Result<Self, TranslationError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(TranslationError::shape(
                origin,
                format!("expected a JSON object, found {}", json_type_name(&other)),
            )),
        }
    }

    /// Serialize back to compact JSON text.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    /// Number of top-level keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when there are no top-level keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Top-level entries.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying JSON object.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Insert or replace a top-level entry.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// What: Resolve a dot-notation path to the raw JSON node.
    ///
    /// Inputs:
    /// - `path`: Key such as `"footer.address"`
    ///
    /// Output:
    /// - The node at that path, or `None` when any segment is missing
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut node = self.0.get(segments.next()?)?;
        for segment in segments {
            node = node.as_object()?.get(segment)?;
        }
        Some(node)
    }

    /// What: Look up a leaf translation by dot-notation path.
    ///
    /// Output:
    /// - `Some(String)` for string, number and boolean leaves; `None` for missing keys and subtrees
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<String> {
        self.get_path(path).and_then(leaf_to_string)
    }

    /// What: Flatten the tree into dot-notation keys.
    ///
    /// Details:
    /// - Nested objects become `parent.child` keys
    /// - Arrays are kept as their JSON text; nulls are skipped
    #[must_use]
    pub fn flatten(&self) -> TranslationMap {
        let mut out = TranslationMap::new();
        for (key, value) in &self.0 {
            flatten_value(value, key, &mut out);
        }
        out
    }
}

impl From<Map<String, Value>> for Dictionary {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Render a scalar JSON leaf as display text.
fn leaf_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Name of a JSON value's type, for error messages.
const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Recursive helper for [`Dictionary::flatten`].
fn flatten_value(value: &Value, prefix: &str, out: &mut TranslationMap) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                flatten_value(val, &format!("{prefix}.{key}"), out);
            }
        }
        Value::Array(_) => {
            out.insert(prefix.to_string(), value.to_string());
        }
        Value::Null => {}
        _ => {
            if let Some(s) = leaf_to_string(value) {
                out.insert(prefix.to_string(), s);
            }
        }
    }
}

/// What: Translate a key, returning the key itself when it is missing.
///
/// Inputs:
/// - `dictionary`: Active dictionary
/// - `key`: Dot-notation key
///
/// Output:
/// - Translated string, or `key` unchanged on a miss
///
/// Details:
/// - Misses are logged at debug level so they stay discoverable without flooding logs
#[must_use]
pub fn translate(dictionary: &Dictionary, key: &str) -> String {
    if let Some(text) = dictionary.lookup(key) {
        return text;
    }
    tracing::debug!(key, "missing translation key, returning key as-is");
    key.to_string()
}

/// What: Translate a key and substitute `{{name}}` placeholders.
///
/// Inputs:
/// - `dictionary`: Active dictionary
/// - `key`: Dot-notation key
/// - `args`: `(name, value)` pairs
///
/// Output:
/// - Translated string with every `{{name}}` (whitespace inside the braces allowed) replaced
///
/// Details:
/// - Unknown placeholders are left untouched
#[must_use]
pub fn translate_with(
    dictionary: &Dictionary,
    key: &str,
    args: &[(&str, &str)],
) -> String {
    interpolate(&translate(dictionary, key), args)
}

/// Substitute `{{name}}` placeholders in `template`.
fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = after[..end].trim();
        match args.iter().find(|(n, _)| *n == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}
