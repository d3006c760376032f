//! Canonical document model
//!
//! An MCF document is an ordered tree of named sections. Sections are kept
//! as `serde_json` maps so that every dialect reads and writes the same
//! structure; the helpers here give typed access to the parts that carry
//! invariants (dotted paths, multilingual strings).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{CrosswalkError, Result};

/// Separator used when several values land on the same scalar field
pub const VALUE_SEPARATOR: &str = " | ";

/// Key marking inheritance from a base document
pub const BASE_MCF_KEY: &str = "base_mcf";

/// A fully resolved canonical document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Look up a value by dotted path (`identification.dates.creation`)
    pub fn get(&self, path: &str) -> Option<&Value> {
        get_path(&self.0, path)
    }

    /// Look up a string value by dotted path
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }

    /// Look up a section (top-level mapping) by name
    pub fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        self.0.get(name).and_then(|v| v.as_object())
    }

    /// Set a value at a dotted path, replacing what was there
    pub fn insert(&mut self, path: &str, value: Value) {
        insert_path(&mut self.0, path, value);
    }

    /// The `mcf.version` field as a string, if present
    pub fn version(&self) -> Option<String> {
        match self.get("mcf.version")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Check whether any mapping in the tree carries `key`
    pub fn contains_key_deep(&self, key: &str) -> bool {
        map_contains_key_deep(&self.0, key)
    }
}

impl TryFrom<Value> for Document {
    type Error = CrosswalkError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(CrosswalkError::DocumentParse(format!(
                "document root must be a mapping, found {}",
                value_kind(&other)
            ))),
        }
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.0)
    }
}

fn map_contains_key_deep(map: &Map<String, Value>, key: &str) -> bool {
    map.iter().any(|(k, v)| k == key || value_contains_key_deep(v, key))
}

fn value_contains_key_deep(value: &Value, key: &str) -> bool {
    match value {
        Value::Object(obj) => map_contains_key_deep(obj, key),
        Value::Array(arr) => arr.iter().any(|v| value_contains_key_deep(v, key)),
        _ => false,
    }
}

/// Short name of a JSON value's kind, for error messages
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Look up a value by dotted path
pub fn get_path<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut current = map.get(first)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Set a value at a dotted path, creating intermediate mappings
///
/// A non-mapping value sitting on an intermediate segment is replaced by a
/// mapping.
pub fn insert_path(map: &mut Map<String, Value>, path: &str, value: Value) {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };
    let target = match parents {
        Some(parents) => parents.split('.').fold(map, |current, part| {
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            match entry {
                Value::Object(obj) => obj,
                _ => unreachable!("entry was just replaced by a mapping"),
            }
        }),
        None => map,
    };
    target.insert(leaf.to_string(), value);
}

/// Write a scalar at a dotted path, concatenating with any existing value
pub fn merge_scalar_at(map: &mut Map<String, Value>, path: &str, value: String) {
    let merged = match get_path(map, path) {
        Some(Value::String(existing)) if !existing.is_empty() => {
            format!("{}{}{}", existing, VALUE_SEPARATOR, value)
        }
        _ => value,
    };
    insert_path(map, path, Value::String(merged));
}

/// Write a multilingual value at a dotted path, merging per language
///
/// An existing bare scalar is treated as being in `language`.
pub fn merge_localized_at(
    map: &mut Map<String, Value>,
    path: &str,
    value: CharString,
    language: &str,
) {
    let merged = match get_path(map, path).and_then(CharString::from_value) {
        Some(existing) => existing.merge(value, language),
        None => value,
    };
    insert_path(map, path, merged.to_value());
}

/// A field that is either unilingual or keyed by ISO language code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CharString {
    Scalar(String),
    Localized(BTreeMap<String, String>),
}

impl CharString {
    /// Interpret a document value as a multilingual string
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Scalar(s.clone())),
            Value::Number(n) => Some(Self::Scalar(n.to_string())),
            Value::Bool(b) => Some(Self::Scalar(b.to_string())),
            Value::Object(obj) => {
                let mut localized = BTreeMap::new();
                for (lang, v) in obj {
                    let text = match v {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        _ => return None,
                    };
                    localized.insert(lang.clone(), text);
                }
                Some(Self::Localized(localized))
            }
            _ => None,
        }
    }

    /// Build from per-language values, collapsing a single language to a scalar
    pub fn from_languages(values: BTreeMap<String, String>) -> Option<Self> {
        match values.len() {
            0 => None,
            _ => Some(Self::Localized(values).collapse()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Scalar(s) => Value::String(s.clone()),
            Self::Localized(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        }
    }

    /// Reduce a single-language mapping to a bare scalar
    pub fn collapse(self) -> Self {
        match self {
            Self::Localized(map) if map.len() == 1 => match map.into_iter().next() {
                Some((_, value)) => Self::Scalar(value),
                None => Self::Localized(BTreeMap::new()),
            },
            other => other,
        }
    }

    /// Per-language view; a scalar is attributed to `language`
    pub fn into_languages(self, language: &str) -> BTreeMap<String, String> {
        match self {
            Self::Scalar(s) => BTreeMap::from([(language.to_string(), s)]),
            Self::Localized(map) => map,
        }
    }

    /// Merge two values, joining same-language entries with `" | "`
    pub fn merge(self, other: CharString, language: &str) -> CharString {
        let mut merged = self.into_languages(language);
        for (lang, value) in other.into_languages(language) {
            match merged.get_mut(&lang) {
                Some(existing) if existing != &value => {
                    existing.push_str(VALUE_SEPARATOR);
                    existing.push_str(&value);
                }
                Some(_) => {}
                None => {
                    merged.insert(lang, value);
                }
            }
        }
        CharString::Localized(merged).collapse()
    }

    /// Value for a language, falling back to the unilingual scalar
    pub fn get(&self, language: &str) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::Localized(map) => map.get(language).map(String::as_str),
        }
    }
}

/// Pick primary- and alternate-language values of a possibly multilingual field
///
/// A unilingual value is returned as the primary value. For a language
/// mapping the primary value is the entry for `language` (or the first entry
/// when that language is missing) and the alternate value is the entry for
/// `language_alternate`.
pub fn get_localized_value<'a>(
    value: Option<&'a Value>,
    language: Option<&str>,
    language_alternate: Option<&str>,
) -> (Option<&'a Value>, Option<&'a Value>) {
    match value {
        None | Some(Value::Null) => (None, None),
        Some(Value::Object(obj)) => {
            let primary = language
                .and_then(|lang| obj.get(lang))
                .or_else(|| obj.values().next());
            let alternate = language_alternate.and_then(|lang| obj.get(lang));
            (primary, alternate)
        }
        Some(other) => (Some(other), None),
    }
}

/// String form of [`get_localized_value`]
pub fn get_charstring(
    value: Option<&Value>,
    language: Option<&str>,
    language_alternate: Option<&str>,
) -> (Option<String>, Option<String>) {
    let (primary, alternate) = get_localized_value(value, language, language_alternate);
    (primary.and_then(scalar_text), alternate.and_then(scalar_text))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
